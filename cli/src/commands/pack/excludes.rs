//! # Distpack Exclusion Rules (`commands::pack::excludes`)
//!
//! File: cli/src/commands/pack/excludes.rs
//!
//! ## Overview
//!
//! This module derives the list of path patterns to exclude from packaging.
//! Patterns come from the tree's `.gitignore`: the same file that keeps build
//! artifacts out of version control keeps them out of the release archive,
//! so the two never drift apart.
//!
//! ## Parsing rules
//!
//! Lines are read in order and appended verbatim as patterns: no trimming,
//! no comment stripping, no blank-line filtering. A line containing the
//! cutoff marker (`add2zip`) anywhere stops parsing: everything below the
//! marker is ignored by the packager and therefore always included, which is
//! how a tree opts ignored-but-shippable files back into the archive.
//!
//! A missing ignore file is a warning, never an error; packaging proceeds
//! with whatever patterns were already supplied.
//!
//! ## Matching rules
//!
//! Each pattern is a shell glob (`*`, `?`, `[...]`) relative to the tree
//! root. Matching prefixes the pattern with the root path and compares the
//! result against the entry's absolute path, so `build/*` written in the
//! ignore file matches `<root>/build/anything`. As in `fnmatch`, `*` is not
//! stopped by path separators. Matching is case-sensitive on every platform;
//! this is a deliberate, documented choice rather than an inherited
//! filesystem default.
//!
use crate::common::fs::io;
use glob::{MatchOptions, Pattern};
use std::path::Path;
use tracing::{debug, warn};

/// Name of the ignore file read from the tree root.
const IGNORE_FILENAME: &str = ".gitignore";

/// Lines at or below a line containing this substring are not exclusion
/// patterns; the entries they name ship in the archive.
pub const CUTOFF_MARKER: &str = "add2zip";

/// Glob semantics for exclusion matching: case-sensitive, with `*` free to
/// cross `/` boundaries, matching `fnmatch` with no flags.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Ordered list of raw exclusion patterns. Built once at packaging start and
/// read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct ExcludeRules {
    patterns: Vec<String>,
}

impl ExcludeRules {
    /// An empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A rule set seeded with caller-supplied patterns; the ignore file, when
    /// loaded, appends after these.
    pub fn with_defaults(patterns: Vec<String>) -> Self {
        ExcludeRules { patterns }
    }

    /// Appends patterns from the tree's ignore file.
    ///
    /// A missing or unreadable file is surfaced as a warning and leaves the
    /// rule set as it was; the run proceeds with the patterns already
    /// supplied.
    pub fn load_ignore_file(&mut self, root: &Path) {
        let path = root.join(IGNORE_FILENAME);
        match io::read_file_to_string(&path) {
            Ok(contents) => {
                self.append_from_str(&contents);
                debug!(
                    "Loaded {} exclude pattern(s) from {}",
                    self.patterns.len(),
                    path.display()
                );
            }
            Err(e) => {
                warn!(
                    "No usable {} at {} ({}); packaging without ignore-file excludes",
                    IGNORE_FILENAME,
                    root.display(),
                    e
                );
            }
        }
    }

    /// Appends patterns from ignore-file text, stopping at the cutoff marker.
    ///
    /// Line text is taken exactly as written, leading and trailing whitespace
    /// included.
    pub fn append_from_str(&mut self, contents: &str) {
        for line in contents.split('\n') {
            if line.contains(CUTOFF_MARKER) {
                debug!("Cutoff marker reached; remaining ignore lines are always included");
                break;
            }
            self.patterns.push(line.to_string());
        }
    }

    /// The raw patterns, in file order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Compiles the rule set against a tree root.
    ///
    /// Each pattern is prefixed with the root path and compiled to a glob
    /// matcher once, up front. A line that is not a valid glob (e.g. an
    /// unclosed character class) is skipped with a warning; pattern trouble
    /// is never fatal to the run.
    pub fn matcher(&self, root: &Path) -> ExcludeMatcher {
        let mut compiled = Vec::with_capacity(self.patterns.len());
        for raw in &self.patterns {
            let full = format!("{}/{}", root.display(), raw);
            match Pattern::new(&full) {
                Ok(pattern) => compiled.push((raw.clone(), pattern)),
                Err(e) => warn!("Skipping malformed exclude pattern '{}': {}", raw, e),
            }
        }
        ExcludeMatcher { compiled }
    }
}

/// Compiled form of [`ExcludeRules`], bound to one tree root.
pub struct ExcludeMatcher {
    /// (raw pattern text, compiled root-prefixed glob), in rule order. The
    /// raw text is kept for diagnostics when a pattern matches.
    compiled: Vec<(String, Pattern)>,
}

impl ExcludeMatcher {
    /// Returns the first pattern matching the absolute path, if any.
    ///
    /// Only the identity of the matching pattern depends on rule order; the
    /// include/exclude outcome does not, since matching is pure.
    pub fn first_match(&self, path: &Path) -> Option<&str> {
        let candidate = path.to_string_lossy();
        self.compiled
            .iter()
            .find(|(_, pattern)| pattern.matches_with(&candidate, MATCH_OPTIONS))
            .map(|(raw, _)| raw.as_str())
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_cutoff_marker_truncates_pattern_list() {
        let mut rules = ExcludeRules::new();
        rules.append_from_str("build/*\n*.log\n# add2zip -- ship everything below\nkeepme.log\n");
        assert_eq!(rules.patterns(), ["build/*", "*.log"]);
    }

    #[test]
    fn test_lines_are_taken_verbatim() {
        let mut rules = ExcludeRules::new();
        rules.append_from_str("  spaced  \n\ncache");
        // No trimming, no blank-line filtering.
        assert_eq!(rules.patterns(), ["  spaced  ", "", "cache"]);
    }

    #[test]
    fn test_marker_matches_as_substring_anywhere_in_line() {
        let mut rules = ExcludeRules::new();
        rules.append_from_str("one\nxxadd2zipxx\ntwo\n");
        assert_eq!(rules.patterns(), ["one"]);
    }

    #[test]
    fn test_missing_ignore_file_leaves_rules_unchanged() {
        let dir = tempdir().unwrap();
        let mut rules = ExcludeRules::with_defaults(vec!["target".into()]);
        rules.load_ignore_file(dir.path());
        assert_eq!(rules.patterns(), ["target"]);
    }

    #[test]
    fn test_ignore_file_appends_after_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.tmp").unwrap();
        let mut rules = ExcludeRules::with_defaults(vec!["target".into()]);
        rules.load_ignore_file(dir.path());
        assert_eq!(rules.patterns(), ["target", "*.tmp"]);
    }

    #[test]
    fn test_matcher_matches_root_relative_globs() {
        let root = PathBuf::from("/work/project");
        let mut rules = ExcludeRules::new();
        rules.append_from_str("build/*\n*.log\n");
        let matcher = rules.matcher(&root);

        assert_eq!(
            matcher.first_match(&root.join("build/cache.bin")),
            Some("build/*")
        );
        assert_eq!(matcher.first_match(&root.join("app.log")), Some("*.log"));
        assert_eq!(matcher.first_match(&root.join("src/app.rs")), None);
    }

    #[test]
    fn test_star_crosses_directory_separators() {
        // fnmatch with no flags lets `*` run across `/`; nested paths under
        // build/ are matched by a single-star pattern.
        let root = PathBuf::from("/work/project");
        let mut rules = ExcludeRules::new();
        rules.append_from_str("build/*\n");
        let matcher = rules.matcher(&root);
        assert_eq!(
            matcher.first_match(&root.join("build/deep/nested.o")),
            Some("build/*")
        );
    }

    #[test]
    fn test_first_matching_pattern_is_reported() {
        let root = PathBuf::from("/work/project");
        let mut rules = ExcludeRules::new();
        rules.append_from_str("*.log\napp.*\n");
        let matcher = rules.matcher(&root);
        // Both patterns match; the first in file order is the one reported.
        assert_eq!(matcher.first_match(&root.join("app.log")), Some("*.log"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let root = PathBuf::from("/work/project");
        let mut rules = ExcludeRules::new();
        rules.append_from_str("*.LOG\n");
        let matcher = rules.matcher(&root);
        assert_eq!(matcher.first_match(&root.join("app.log")), None);
        assert_eq!(matcher.first_match(&root.join("app.LOG")), Some("*.LOG"));
    }

    #[test]
    fn test_malformed_pattern_is_skipped_not_fatal() {
        let root = PathBuf::from("/work/project");
        let mut rules = ExcludeRules::new();
        rules.append_from_str("[\n*.log\n");
        let matcher = rules.matcher(&root);
        // The unclosed character class is dropped; the valid pattern works.
        assert_eq!(matcher.first_match(&root.join("app.log")), Some("*.log"));
    }

    #[test]
    fn test_character_classes_and_question_mark() {
        let root = PathBuf::from("/work/project");
        let mut rules = ExcludeRules::new();
        rules.append_from_str("v?.[0-9].txt\n");
        let matcher = rules.matcher(&root);
        assert_eq!(
            matcher.first_match(&root.join("v1.3.txt")),
            Some("v?.[0-9].txt")
        );
        assert_eq!(matcher.first_match(&root.join("v12.3.txt")), None);
    }
}
