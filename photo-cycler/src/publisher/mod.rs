/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Atomic publication of the current photo.
//!
//! The published artifact is a single entry, `current.jpg`, inside the
//! publication directory.  It is replaced with one `rename(2)` so that a
//! reader polling the path sees either the old target or the new one, never
//! a missing or half-written file:
//!
//! ```text
//! .current.jpg.<pid>.<seq>.tmp ──symlink──► /photos/b.jpg
//!            │
//!            └──rename──► current.jpg        (old link replaced atomically)
//! ```
//!
//! On targets without symbolic links the photo is copied to the staging name
//! instead; the rename step is the same.

pub mod error;

pub use error::PublishError;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

/// File name of the published artifact, relative to the publication directory.
pub const CURRENT_FILE_NAME: &str = "current.jpg";

/// Owns the well-known publication path.
#[derive(Debug)]
pub struct ArtifactPublisher {
    publication_dir: PathBuf,
    current: PathBuf,
    /// Makes staging names unique within the process.
    sequence: AtomicU64,
}

impl ArtifactPublisher {
    pub fn new(publication_dir: impl Into<PathBuf>) -> Self {
        let publication_dir = publication_dir.into();
        let current = publication_dir.join(CURRENT_FILE_NAME);
        Self {
            publication_dir,
            current,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn publication_dir(&self) -> &Path {
        &self.publication_dir
    }

    /// `<publication dir>/current.jpg`, whether or not it exists yet.
    pub fn current_path(&self) -> &Path {
        &self.current
    }

    /// The photo `current.jpg` links to, or `None` if nothing is published
    /// (or the artifact is a copy rather than a link).
    pub fn current_target(&self) -> Option<PathBuf> {
        fs::read_link(&self.current).ok()
    }

    /// Make `current.jpg` refer to `source`.
    ///
    /// # Errors
    /// * [`PublishError::SourceMissing`] if `source` does not exist, or
    ///   vanished while being staged.
    /// * [`PublishError::Io`] if staging or renaming is denied.
    ///
    /// The previous artifact is untouched on error and no staging entry is
    /// left behind.
    pub fn publish(&self, source: &Path) -> Result<(), PublishError> {
        let target = source.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PublishError::SourceMissing {
                path: source.to_path_buf(),
            },
            _ => PublishError::Io {
                op: "resolve",
                path: source.to_path_buf(),
                source: e,
            },
        })?;

        let staging = self.staging_path();
        stage(&target, &staging).map_err(|e| PublishError::Io {
            op: "stage",
            path: staging.clone(),
            source: e,
        })?;

        // The candidate can be deleted between canonicalize() and now; refuse
        // to publish a dangling link.
        if fs::metadata(&staging).is_err() {
            discard(&staging);
            return Err(PublishError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        if let Err(e) = fs::rename(&staging, &self.current) {
            discard(&staging);
            return Err(PublishError::Io {
                op: "rename",
                path: self.current.clone(),
                source: e,
            });
        }

        info!(
            photo = %target.display(),
            published = %self.current.display(),
            "Published photo"
        );
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.publication_dir.join(format!(
            ".{CURRENT_FILE_NAME}.{}.{seq}.tmp",
            std::process::id()
        ))
    }
}

#[cfg(unix)]
fn stage(target: &Path, staging: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, staging)
}

#[cfg(not(unix))]
fn stage(target: &Path, staging: &Path) -> io::Result<()> {
    fs::copy(target, staging).map(|_| ())
}

fn discard(staging: &Path) {
    if let Err(e) = fs::remove_file(staging) {
        debug!("Could not remove staging entry {}: {}", staging.display(), e);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
