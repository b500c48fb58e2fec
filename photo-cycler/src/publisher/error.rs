/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to republish the current artifact.
///
/// Never fatal: the previously published artifact stays in place.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The selected candidate disappeared before it could be published.
    #[error("candidate '{}' no longer exists", .path.display())]
    SourceMissing { path: PathBuf },

    /// The filesystem refused one of the publish steps.
    #[error("failed to {op} '{}': {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
