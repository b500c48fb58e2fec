/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for property reads and writes.
//!
//! The HTTP layer maps each variant onto a status code:
//!
//! | Variant | HTTP status |
//! |---|---|
//! | `UnknownProperty` | `404 Not Found` |
//! | `ReadOnly` | `403 Forbidden` |
//! | `Validation` / `InvalidType` | `400 Bad Request` |
//! | `Rejected` | `500 Internal Server Error` |

use thiserror::Error;

/// Why a property operation failed.
///
/// A failed write never changes the stored value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    /// No property with this name exists on the thing.
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    /// A remote write targeted a property advertised as `readOnly`.
    #[error("property '{name}' is read-only")]
    ReadOnly { name: String },

    /// The value violates a declared constraint (minimum, maximum, finiteness).
    #[error("invalid value for '{name}': {reason}")]
    Validation { name: String, reason: String },

    /// The JSON value does not decode to the property's value type.
    #[error("property '{name}' expects a value of type '{expected}'")]
    InvalidType {
        name: String,
        expected: &'static str,
    },

    /// The bound write handler refused to apply the value.
    #[error("write to '{name}' rejected: {reason}")]
    Rejected { name: String, reason: String },
}
