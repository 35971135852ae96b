//! # Distpack TAR Archive Backend (`common::archive::tar`)
//!
//! File: cli/src/common/archive/tar.rs
//!
//! ## Overview
//!
//! This module provides the archive backend the packaging walk writes into.
//! It wraps the `tar` crate behind the small contract the walk needs: create
//! a new archive (never overwriting an existing file), append regular files
//! and empty directories under caller-chosen target names, answer whether a
//! target name was already added, and close the archive, either for good or
//! as part of a transparent close+reopen cycle.
//!
//! ## Architecture
//!
//! The backend owns three pieces of state:
//!
//! - the destination path, needed again on every reopen cycle;
//! - the live `tar::Builder` handle (absent only between close and reopen);
//! - the set of target names added so far, which is the archive's collision
//!   state: callers query it before adding a file so a non-override entry
//!   never silently shadows an earlier one. Directory names are tracked with
//!   a trailing slash, so a directory never collides with a file of the same
//!   name.
//!
//! Appending the same file name twice is allowed at this layer: tar readers
//! resolve duplicate names to the later entry, which is exactly the
//! "override wins" behavior the `.dist` convention relies on.
//!
//! ## Reopen semantics
//!
//! Closing a tar archive writes a 1024-byte end-of-archive marker (two
//! zero-filled 512-byte blocks). `cycle` therefore finishes the archive,
//! drops the file handle, reopens the file read/write, and seeks to exactly
//! 1024 bytes before the end so the next entry overwrites the marker. The
//! file is never truncated, so an interrupted reopen can at worst leave a
//! correctly terminated archive with fewer entries.
//!
use crate::core::error::{DistpackError, Result};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Size of the end-of-archive marker `tar::Builder` emits on finish: two
/// consecutive zero-filled 512-byte blocks.
const TAR_TRAILER_LEN: u64 = 1024;

/// Streaming tar archive writer with collision tracking and append-reopen
/// support.
pub struct TarBackend {
    /// Destination path, kept for reopen cycles and error messages.
    path: PathBuf,
    /// Live writer handle. `None` only transiently inside `cycle`, and
    /// permanently after `close`.
    builder: Option<tar::Builder<File>>,
    /// Target names added so far. Directories are stored with a trailing
    /// slash.
    names: HashSet<String>,
    /// Number of close+reopen cycles performed.
    cycles: usize,
}

impl std::fmt::Debug for TarBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarBackend")
            .field("path", &self.path)
            .field("open", &self.builder.is_some())
            .field("names", &self.names.len())
            .field("cycles", &self.cycles)
            .finish()
    }
}

impl TarBackend {
    /// Creates the archive at `path`.
    ///
    /// The destination must not already exist; an existing file is a fatal
    /// `DistpackError::DestinationExists`, never an overwrite. The file is
    /// opened read/write because reopen cycles need to reposition over the
    /// end-of-archive marker later.
    ///
    /// # Errors
    ///
    /// * `DistpackError::DestinationExists` if `path` is already present.
    /// * `DistpackError::ArchiveOpen` if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(DistpackError::DestinationExists {
                path: path.to_path_buf(),
            })?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| {
                // `create_new` also catches a file that appeared between the
                // existence check and the open.
                if source.kind() == std::io::ErrorKind::AlreadyExists {
                    DistpackError::DestinationExists {
                        path: path.to_path_buf(),
                    }
                } else {
                    DistpackError::ArchiveOpen {
                        path: path.to_path_buf(),
                        source,
                    }
                }
            })?;
        debug!("Created archive at {}", path.display());
        Ok(TarBackend {
            path: path.to_path_buf(),
            builder: Some(tar::Builder::new(file)),
            names: HashSet::new(),
            cycles: 0,
        })
    }

    /// Appends the regular file at `source` under `target` in the archive.
    ///
    /// The name is recorded in the collision state. Appending a name that was
    /// already added is permitted; readers resolve to the later entry.
    ///
    /// # Errors
    ///
    /// * `DistpackError::FileAdd` if the source cannot be read or the archive
    ///   cannot be written. The most common cause in very large runs is file
    ///   descriptor exhaustion, which the periodic reopen cycle exists to
    ///   prevent.
    pub fn add_file(&mut self, source: &Path, target: &str) -> Result<()> {
        let builder = self.builder_mut()?;
        builder
            .append_path_with_name(source, target)
            .map_err(|source| DistpackError::FileAdd {
                name: target.to_string(),
                source,
            })?;
        self.names.insert(target.to_string());
        Ok(())
    }

    /// Appends an empty directory entry under `target`, taking its metadata
    /// from the directory at `source`.
    ///
    /// Directory names enter the collision state with a trailing slash, so a
    /// later file named like the directory is not considered a collision
    /// (mirroring how archive formats keep `dir/` and `dir` distinct).
    ///
    /// # Errors
    ///
    /// * `DistpackError::FileAdd` if the entry cannot be written.
    pub fn add_empty_dir(&mut self, source: &Path, target: &str) -> Result<()> {
        let builder = self.builder_mut()?;
        builder
            .append_dir(target, source)
            .map_err(|source| DistpackError::FileAdd {
                name: target.to_string(),
                source,
            })?;
        self.names.insert(format!("{}/", target));
        Ok(())
    }

    /// Returns whether a file entry named `target` was already added.
    pub fn contains(&self, target: &str) -> bool {
        self.names.contains(target)
    }

    /// Closes the archive and reopens it for appending.
    ///
    /// Finishing the archive writes the end-of-archive marker; the reopen
    /// seeks back over exactly that marker so the next add extends the
    /// archive in place. The collision state survives the cycle unchanged.
    ///
    /// # Errors
    ///
    /// * `DistpackError::ArchiveClose` if finishing the archive fails.
    /// * `DistpackError::ArchiveReopen` if the file cannot be reopened or is
    ///   shorter than its own end marker.
    pub fn cycle(&mut self) -> Result<()> {
        debug!("Reopening {} to refresh the writer handle", self.path.display());
        let builder = self.take_builder()?;
        let file = builder
            .into_inner()
            .map_err(|source| DistpackError::ArchiveClose {
                path: self.path.clone(),
                source,
            })?;
        // Dropping the file is the close; reopen below gets a fresh handle.
        drop(file);

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|source| DistpackError::ArchiveReopen {
                path: self.path.clone(),
                source,
            })?;
        let len = file
            .metadata()
            .map_err(|source| DistpackError::ArchiveReopen {
                path: self.path.clone(),
                source,
            })?
            .len();
        if len < TAR_TRAILER_LEN {
            return Err(DistpackError::ArchiveReopen {
                path: self.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "archive is shorter than its end-of-archive marker",
                ),
            })?;
        }
        file.seek(SeekFrom::End(-(TAR_TRAILER_LEN as i64)))
            .map_err(|source| DistpackError::ArchiveReopen {
                path: self.path.clone(),
                source,
            })?;
        self.builder = Some(tar::Builder::new(file));
        self.cycles += 1;
        Ok(())
    }

    /// Finishes the archive and closes the handle for good.
    ///
    /// # Errors
    ///
    /// * `DistpackError::ArchiveClose` if the end-of-archive marker cannot be
    ///   written or the file cannot be flushed to disk.
    pub fn close(&mut self) -> Result<()> {
        let builder = self.take_builder()?;
        let file = builder
            .into_inner()
            .map_err(|source| DistpackError::ArchiveClose {
                path: self.path.clone(),
                source,
            })?;
        file.sync_all().map_err(|source| DistpackError::ArchiveClose {
            path: self.path.clone(),
            source,
        })?;
        debug!("Closed archive {}", self.path.display());
        Ok(())
    }

    /// Number of close+reopen cycles performed so far.
    pub fn cycles(&self) -> usize {
        self.cycles
    }

    fn builder_mut(&mut self) -> Result<&mut tar::Builder<File>> {
        self.builder
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("archive handle is closed"))
    }

    fn take_builder(&mut self) -> Result<tar::Builder<File>> {
        self.builder
            .take()
            .ok_or_else(|| anyhow::anyhow!("archive handle is closed"))
    }
}
