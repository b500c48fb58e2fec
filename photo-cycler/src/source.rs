/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Photo source listing and candidate filtering.
//!
//! The candidate set is recomputed from scratch on every tick; nothing here
//! caches directory contents.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// File extensions (compared case-insensitively) eligible for publication.
pub const PHOTO_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

/// One entry returned by a [`PhotoSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// File name only, no directory component.
    pub name: String,
    pub path: PathBuf,
    /// `true` for regular files.  Directories, sockets and symlinks are `false`.
    pub is_file: bool,
}

/// Anything that can enumerate candidate photo files.
pub trait PhotoSource: Send + Sync {
    fn list_files(&self) -> io::Result<Vec<SourceEntry>>;
}

/// A [`PhotoSource`] backed by a single filesystem directory (non-recursive).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PhotoSource for DirectorySource {
    fn list_files(&self) -> io::Result<Vec<SourceEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            // An entry can vanish between readdir and stat; skip it.
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    continue;
                }
            };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            entries.push(SourceEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_file,
            });
        }
        Ok(entries)
    }
}

/// Returns `true` if `entry` is a regular file with a JPEG extension.
pub fn is_candidate(entry: &SourceEntry) -> bool {
    entry.is_file
        && Path::new(&entry.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PHOTO_EXTENSIONS.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

/// Lists `source` and keeps only eligible photos, sorted by name.
///
/// Sorting makes selection with a seeded RNG reproducible regardless of the
/// order the filesystem returns entries in.
pub fn candidates(source: &dyn PhotoSource) -> io::Result<Vec<SourceEntry>> {
    let mut found: Vec<SourceEntry> = source
        .list_files()?
        .into_iter()
        .filter(is_candidate)
        .collect();
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
