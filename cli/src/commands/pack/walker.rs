//! # Distpack Tree Walker (`commands::pack::walker`)
//!
//! File: cli/src/commands/pack/walker.rs
//!
//! ## Overview
//!
//! This module owns the packaging walk: a single-threaded, depth-first,
//! pre-order traversal of the tree that classifies every entry against the
//! exclusion rules and streams the included ones into the archive backend.
//!
//! ## Architecture
//!
//! All walk state lives in an explicit [`TreePackager`] value threaded
//! through the recursion: the tree root, the compiled exclusion matcher, the
//! archive handle, and the running entry counter. There is no global state,
//! and errors travel up the recursion as `Result`s: the first fatal condition
//! unwinds the whole walk, and the final close only happens on the success
//! path.
//!
//! Per entry, in order:
//!
//! 1. exclusion test (first matching pattern wins, for diagnostics);
//! 2. protected-suffix exception: a short name ending in a protected suffix
//!    (`.htaccess` by default) is kept even when excluded;
//! 3. excluded directories are skipped whole, children unseen;
//! 4. included entries bump the counter, and every `reopen_interval` adds the
//!    archive handle is cycled to keep descriptor usage bounded;
//! 5. the `.dist` override suffix is stripped to produce the target name;
//!    override directories are unsupported and fatal;
//! 6. directories are added as empty entries, then recursed into;
//! 7. files are checked against the archive's collision state: a duplicate
//!    target is fatal unless the newcomer is an override, in which case the
//!    later entry wins and the event is logged.
//!
//! Directory entries are processed in lexicographic name order, making runs
//! deterministic regardless of filesystem enumeration order.
//!
use crate::commands::pack::excludes::{ExcludeMatcher, ExcludeRules};
use crate::common::archive::tar::TarBackend;
use crate::core::config::Config;
use crate::core::error::{DistpackError, Result};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Files carrying this suffix are packaged under the suffix-stripped name,
/// shadowing or replacing a same-named non-override entry.
pub const OVERRIDE_SUFFIX: &str = ".dist";

/// Outcome of a successful packaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackSummary {
    /// Entries (files and directories) added to the archive.
    pub entries: usize,
    /// Close+reopen cycles performed on the archive handle.
    pub reopen_cycles: usize,
}

/// Walk state threaded through the recursive traversal.
pub struct TreePackager<'a> {
    root: &'a Path,
    matcher: ExcludeMatcher,
    archive: &'a mut TarBackend,
    cfg: &'a Config,
    /// Entries added so far; drives the reopen cadence.
    count: usize,
}

/// Packages the tree rooted at `root` into a fresh archive at `archive_path`.
///
/// Opens the archive (failing if the destination exists), runs the walk, and
/// closes the archive exactly once on success. On failure the error
/// propagates immediately; no further entries are written and the partial
/// destination file is left as the backend produced it.
pub fn pack_tree(
    root: &Path,
    archive_path: &Path,
    rules: &ExcludeRules,
    cfg: &Config,
) -> Result<PackSummary> {
    let matcher = rules.matcher(root);
    let mut archive = TarBackend::create(archive_path)?;
    let entries = {
        let mut packager = TreePackager::new(root, matcher, &mut archive, cfg);
        packager.run()?;
        packager.entries_added()
    };
    archive.close()?;
    Ok(PackSummary {
        entries,
        reopen_cycles: archive.cycles(),
    })
}

impl<'a> TreePackager<'a> {
    /// Builds walk state over an already-open archive.
    pub fn new(
        root: &'a Path,
        matcher: ExcludeMatcher,
        archive: &'a mut TarBackend,
        cfg: &'a Config,
    ) -> Self {
        TreePackager {
            root,
            matcher,
            archive,
            cfg,
            count: 0,
        }
    }

    /// Runs the full walk from the root.
    pub fn run(&mut self) -> Result<()> {
        self.pack_dir(self.root)
    }

    /// Entries added so far.
    pub fn entries_added(&self) -> usize {
        self.count
    }

    /// Processes one directory level: enumerate, sort, classify each child.
    fn pack_dir(&mut self, dir: &Path) -> Result<()> {
        let mut children: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()
            .with_context(|| format!("Failed to enumerate directory: {}", dir.display()))?;
        // `read_dir` never yields `.` or `..`, but does yield dotfiles;
        // hidden entries are packaged like any other.
        children.sort();
        for child in children {
            self.pack_entry(&child)?;
        }
        Ok(())
    }

    /// Classifies a single entry and streams it into the archive if included.
    fn pack_entry(&mut self, path: &Path) -> Result<()> {
        let short = self.short_name(path)?;
        let is_dir = path.is_dir();
        let kind = if is_dir { "dir " } else { "file" };

        // Exclusion test runs against the absolute path, with the pattern
        // anchored at the tree root.
        if let Some(pattern) = self.matcher.first_match(path) {
            if self.is_protected(&short) {
                info!("Keeping {} {} despite exclude [{}]", kind, short, pattern);
            } else {
                info!("Ignoring {} {} [{}]", kind, short, pattern);
                return Ok(());
            }
        }

        self.count += 1;
        if self.count % self.cfg.reopen_interval == self.cfg.reopen_interval - 1 {
            debug!("Cycling archive handle at entry {}", self.count);
            self.archive.cycle()?;
        }

        let is_override = short.ends_with(OVERRIDE_SUFFIX);
        let target = if is_override {
            short[..short.len() - OVERRIDE_SUFFIX.len()].to_string()
        } else {
            short.clone()
        };

        if is_dir {
            if is_override {
                return Err(DistpackError::OverrideDirectory {
                    name: short,
                    suffix: OVERRIDE_SUFFIX,
                })?;
            }
            info!("Adding dir  {}", target); // double space lines up with file log
            self.archive.add_empty_dir(path, &target)?;
            self.pack_dir(path)
        } else {
            if is_override {
                info!("Adding file {} from {}", target, short);
            } else {
                info!("Adding file {}", target);
            }
            if self.archive.contains(&target) {
                if is_override {
                    // Override wins: the later add shadows the earlier entry.
                    warn!("{} already in archive -- replaced with {}", target, short);
                } else {
                    return Err(DistpackError::NameCollision { name: target })?;
                }
            }
            self.archive.add_file(path, &target)
        }
    }

    /// Root-relative name of an entry, with `/` separators: its name inside
    /// the archive.
    fn short_name(&self, path: &Path) -> Result<String> {
        let rel = path.strip_prefix(self.root).with_context(|| {
            format!(
                "Entry {} is outside the packaging root {}",
                path.display(),
                self.root.display()
            )
        })?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }

    /// Whether a short name ends in one of the always-keep suffixes.
    fn is_protected(&self, short: &str) -> bool {
        self.cfg
            .keep_suffixes
            .iter()
            .any(|suffix| short.ends_with(suffix.as_str()))
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::{self, File};
    use std::io::Read;
    use tempfile::{tempdir, TempDir};

    /// Reads an archive back into name -> content, later entries winning
    /// (the resolution archive readers apply to duplicate names).
    fn read_archive(path: &Path) -> HashMap<String, String> {
        let mut out = HashMap::new();
        let mut archive = tar::Archive::new(File::open(path).unwrap());
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string();
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            out.insert(name, contents);
        }
        out
    }

    /// Counts raw entries, duplicates included.
    fn count_entries(path: &Path) -> usize {
        let mut archive = tar::Archive::new(File::open(path).unwrap());
        archive.entries().unwrap().count()
    }

    fn rules_from(lines: &str) -> ExcludeRules {
        let mut rules = ExcludeRules::new();
        rules.append_from_str(lines);
        rules
    }

    /// A scratch root plus a destination path outside it.
    fn scratch() -> (TempDir, PathBuf, TempDir) {
        let root = tempdir().unwrap();
        let out = tempdir().unwrap();
        let dest = out.path().join("release.tar");
        (root, dest, out)
    }

    #[test]
    fn test_packs_nested_tree_under_relative_names() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::write(root.path().join("README"), "docs")?;
        fs::create_dir(root.path().join("src"))?;
        fs::write(root.path().join("src/main.rs"), "fn main() {}")?;
        fs::write(root.path().join(".env"), "SECRET=1")?;

        let summary = pack_tree(
            root.path(),
            &dest,
            &ExcludeRules::new(),
            &Config::default(),
        )?;
        assert_eq!(summary.entries, 4);
        assert_eq!(summary.reopen_cycles, 0);

        let entries = read_archive(&dest);
        assert_eq!(entries.get("README").unwrap(), "docs");
        assert_eq!(entries.get("src/main.rs").unwrap(), "fn main() {}");
        // Hidden entries are packaged too.
        assert_eq!(entries.get(".env").unwrap(), "SECRET=1");
        assert!(entries.contains_key("src"));
        Ok(())
    }

    #[test]
    fn test_excluded_directory_is_not_recursed_into() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::create_dir(root.path().join("build"))?;
        fs::write(root.path().join("build/out.bin"), "artifact")?;
        fs::write(root.path().join("app.log"), "log line")?;
        fs::write(root.path().join("main.c"), "int main;")?;

        let summary = pack_tree(
            root.path(),
            &dest,
            &rules_from("build\n*.log\n"),
            &Config::default(),
        )?;
        assert_eq!(summary.entries, 1);

        let entries = read_archive(&dest);
        assert!(entries.contains_key("main.c"));
        assert!(!entries.contains_key("build"));
        assert!(!entries.contains_key("build/out.bin"));
        assert!(!entries.contains_key("app.log"));
        Ok(())
    }

    #[test]
    fn test_protected_suffix_survives_exclusion() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::write(root.path().join(".htaccess"), "Deny from all")?;
        fs::write(root.path().join(".hidden"), "not kept")?;

        // `.*` excludes every dotfile; the protected suffix pulls the
        // .htaccess back in.
        let summary = pack_tree(
            root.path(),
            &dest,
            &rules_from(".*\n"),
            &Config::default(),
        )?;
        assert_eq!(summary.entries, 1);

        let entries = read_archive(&dest);
        assert_eq!(entries.get(".htaccess").unwrap(), "Deny from all");
        assert!(!entries.contains_key(".hidden"));
        Ok(())
    }

    #[test]
    fn test_override_file_is_packaged_under_stripped_name() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::write(root.path().join("settings.yml.dist"), "defaults: true")?;

        pack_tree(
            root.path(),
            &dest,
            &ExcludeRules::new(),
            &Config::default(),
        )?;

        let entries = read_archive(&dest);
        assert_eq!(entries.get("settings.yml").unwrap(), "defaults: true");
        assert!(!entries.contains_key("settings.yml.dist"));
        Ok(())
    }

    #[test]
    fn test_override_wins_over_plain_entry() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::write(root.path().join("config.yml"), "local tweaks")?;
        fs::write(root.path().join("config.yml.dist"), "shipped defaults")?;

        // "config.yml" sorts before "config.yml.dist", so the plain file is
        // added first and the override replaces it. No collision error.
        pack_tree(
            root.path(),
            &dest,
            &ExcludeRules::new(),
            &Config::default(),
        )?;

        let entries = read_archive(&dest);
        assert_eq!(entries.get("config.yml").unwrap(), "shipped defaults");
        Ok(())
    }

    #[test]
    fn test_non_override_collision_is_fatal() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::write(root.path().join("config.yml"), "newcomer")?;
        let seed = root.path().join("config.yml");

        // Pre-seed the archive with the same target name, then walk a tree
        // containing a plain (non-override) file for it.
        let mut archive = TarBackend::create(&dest)?;
        archive.add_file(&seed, "config.yml")?;
        let cfg = Config::default();
        let rules = ExcludeRules::new();
        let matcher = rules.matcher(root.path());
        let mut packager = TreePackager::new(root.path(), matcher, &mut archive, &cfg);
        let err = packager.run().unwrap_err();
        let packaging_err = err.downcast_ref::<DistpackError>().unwrap();
        assert!(matches!(
            packaging_err,
            DistpackError::NameCollision { name } if name == "config.yml"
        ));
        Ok(())
    }

    #[test]
    fn test_override_directory_fails_before_children() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::create_dir(root.path().join("conf.dist"))?;
        fs::write(root.path().join("conf.dist/app.yml"), "nested")?;

        let err = pack_tree(
            root.path(),
            &dest,
            &ExcludeRules::new(),
            &Config::default(),
        )
        .unwrap_err();
        let packaging_err = err.downcast_ref::<DistpackError>().unwrap();
        assert!(matches!(
            packaging_err,
            DistpackError::OverrideDirectory { name, .. } if name == "conf.dist"
        ));

        // The walk aborted before the directory's children were processed.
        let entries = read_archive(&dest);
        assert!(!entries.contains_key("conf.dist/app.yml"));
        assert!(!entries.contains_key("conf/app.yml"));
        Ok(())
    }

    #[test]
    fn test_reopen_cycles_fire_on_schedule() -> Result<()> {
        let (root, dest, _out) = scratch();
        for i in 0..450 {
            fs::write(root.path().join(format!("file{:04}", i)), "x")?;
        }

        let summary = pack_tree(
            root.path(),
            &dest,
            &ExcludeRules::new(),
            &Config::default(),
        )?;
        // Cycles at entry counts 199 and 399, and nowhere else.
        assert_eq!(summary.entries, 450);
        assert_eq!(summary.reopen_cycles, 2);
        assert_eq!(count_entries(&dest), 450);
        Ok(())
    }

    #[test]
    fn test_reopen_interval_is_configurable() -> Result<()> {
        let (root, dest, _out) = scratch();
        for i in 0..10 {
            fs::write(root.path().join(format!("f{}", i)), "x")?;
        }

        let cfg = Config {
            reopen_interval: 4,
            ..Config::default()
        };
        let summary = pack_tree(root.path(), &dest, &ExcludeRules::new(), &cfg)?;
        // Cycles at counts 3 and 7.
        assert_eq!(summary.reopen_cycles, 2);
        assert_eq!(count_entries(&dest), 10);
        Ok(())
    }

    #[test]
    fn test_existing_destination_fails_without_modification() -> Result<()> {
        let (root, dest, _out) = scratch();
        fs::write(root.path().join("a.txt"), "a")?;
        pack_tree(
            root.path(),
            &dest,
            &ExcludeRules::new(),
            &Config::default(),
        )?;
        let before = fs::read(&dest)?;

        let err = pack_tree(
            root.path(),
            &dest,
            &ExcludeRules::new(),
            &Config::default(),
        )
        .unwrap_err();
        let packaging_err = err.downcast_ref::<DistpackError>().unwrap();
        assert!(matches!(
            packaging_err,
            DistpackError::DestinationExists { .. }
        ));
        assert_eq!(fs::read(&dest)?, before);
        Ok(())
    }
}
