/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Typed, observable property cells.
//!
//! A [`PropertyCell`] holds the current value of one thing property together
//! with the metadata advertised in the thing description.  Remote writes go
//! through [`PropertyCell::write`]:
//!
//! ```text
//! write(v) ──► read-only? ──► constraints ──► handler.on_write(&v) ──► commit ──► observer
//!                  │               │                  │
//!                  ▼               ▼                  ▼
//!              ReadOnly        Validation          (error: value unchanged)
//! ```
//!
//! The handler runs synchronously on the writer's thread, so once `write`
//! returns `Ok` the side effect has already happened.  Writers are serialised
//! by a per-cell mutex; readers only take the value lock, which is never held
//! across a handler call.

pub mod error;

pub use error::PropertyError;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

// ── Value types ───────────────────────────────────────────────────────────────

/// A Rust type that can be stored in a [`PropertyCell`].
///
/// Each implementation fixes the Web Thing `type` keyword, the JSON encoding
/// and any value-level constraint checks.
pub trait PropertyValue: Clone + Send + Sync + 'static {
    /// Value of the `type` keyword in the thing description.
    const JSON_TYPE: &'static str;

    fn to_json(&self) -> Value;

    /// Decode a JSON value, or `None` if it has the wrong shape.
    fn from_json(value: &Value) -> Option<Self>;

    /// Check the value against the declared constraints.
    ///
    /// Returns a human-readable reason on failure.
    fn check(&self, _metadata: &PropertyMetadata) -> Result<(), String> {
        Ok(())
    }
}

impl PropertyValue for f64 {
    const JSON_TYPE: &'static str = "number";

    /// Whole numbers go out as JSON integers (`5`, not `5.0`).
    fn to_json(&self) -> Value {
        const EXACT_INT: f64 = 9_007_199_254_740_992.0; // 2^53
        if self.fract() == 0.0 && self.abs() < EXACT_INT {
            Value::from(*self as i64)
        } else {
            Value::from(*self)
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.as_f64()
    }

    fn check(&self, metadata: &PropertyMetadata) -> Result<(), String> {
        if !self.is_finite() {
            return Err(format!("{self} is not a finite number"));
        }
        if let Some(min) = metadata.minimum {
            if *self < min {
                return Err(format!("{self} is below the minimum of {min}"));
            }
        }
        if let Some(min) = metadata.exclusive_minimum {
            if *self <= min {
                return Err(format!("{self} must be greater than {min}"));
            }
        }
        if let Some(max) = metadata.maximum {
            if *self > max {
                return Err(format!("{self} exceeds the maximum of {max}"));
            }
        }
        Ok(())
    }
}

/// `null`-typed properties carry no value, only the fact that they changed.
impl PropertyValue for () {
    const JSON_TYPE: &'static str = "null";

    fn to_json(&self) -> Value {
        Value::Null
    }

    fn from_json(value: &Value) -> Option<Self> {
        value.is_null().then_some(())
    }
}

// ── Metadata ──────────────────────────────────────────────────────────────────

/// A typed link, as used in thing and property descriptions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "mediaType", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Everything the protocol layer needs to describe one property.
///
/// Serialises directly into the property entry of a thing description.
/// `value_type` is overwritten by [`PropertyCell::new`] with the cell's
/// [`PropertyValue::JSON_TYPE`], so callers leave it defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMetadata {
    /// Stable property name, used as the key in descriptions and URLs.
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<String>,
    #[serde(rename = "type")]
    pub value_type: &'static str,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// Side effect bound to a writable property.
///
/// Invoked with the validated value *before* it is committed.  Returning an
/// error aborts the write and leaves the stored value untouched.
pub trait PropertyWriteHandler<T>: Send + Sync {
    fn on_write(&self, value: &T) -> Result<(), PropertyError>;
}

/// Receives a notification after every committed value change.
pub trait PropertyObserver: Send + Sync {
    fn property_changed(&self, name: &str, value: Value);
}

// ── PropertyCell ──────────────────────────────────────────────────────────────

/// One property's current value plus its metadata and hooks.
pub struct PropertyCell<T: PropertyValue> {
    metadata: PropertyMetadata,
    value: RwLock<T>,
    /// Serialises write → handler → commit sequences.
    writer: Mutex<()>,
    handler: Option<Box<dyn PropertyWriteHandler<T>>>,
    observer: Option<Arc<dyn PropertyObserver>>,
}

impl<T: PropertyValue> PropertyCell<T> {
    pub fn new(mut metadata: PropertyMetadata, initial: T) -> Self {
        metadata.value_type = T::JSON_TYPE;
        Self {
            metadata,
            value: RwLock::new(initial),
            writer: Mutex::new(()),
            handler: None,
            observer: None,
        }
    }

    /// Bind the write handler.  Only meaningful for writable cells.
    pub fn with_handler(mut self, handler: impl PropertyWriteHandler<T> + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PropertyObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &PropertyMetadata {
        &self.metadata
    }

    pub fn is_read_only(&self) -> bool {
        self.metadata.read_only
    }

    /// Current value.  Never waits on a running write handler.
    pub fn read(&self) -> T {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn read_json(&self) -> Value {
        self.read().to_json()
    }

    /// Apply a remote write.
    ///
    /// # Errors
    /// * [`PropertyError::ReadOnly`] for cells advertised as read-only.
    /// * [`PropertyError::Validation`] if `value` breaks a constraint.
    /// * Whatever the bound handler returns.
    ///
    /// Returns the value this call committed, even if another writer has
    /// replaced it by the time the caller looks. On any error the stored
    /// value is unchanged and no notification fires.
    pub fn write(&self, value: T) -> Result<T, PropertyError> {
        if self.metadata.read_only {
            return Err(PropertyError::ReadOnly {
                name: self.metadata.name.clone(),
            });
        }

        value
            .check(&self.metadata)
            .map_err(|reason| PropertyError::Validation {
                name: self.metadata.name.clone(),
                reason,
            })?;

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = &self.handler {
            handler.on_write(&value)?;
        }
        self.commit(value.clone());
        Ok(value)
    }

    /// Decode `value` with the cell's value type, then [`write`](Self::write).
    /// Returns the committed value in its JSON form.
    pub fn write_json(&self, value: &Value) -> Result<Value, PropertyError> {
        let decoded = T::from_json(value).ok_or_else(|| PropertyError::InvalidType {
            name: self.metadata.name.clone(),
            expected: T::JSON_TYPE,
        })?;
        self.write(decoded).map(|committed| committed.to_json())
    }

    /// Device-side update: skips the read-only flag and the handler, still
    /// notifies the observer.
    pub fn update(&self, value: T) {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.commit(value);
    }

    fn commit(&self, value: T) {
        let json = value.to_json();
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;

        debug!(property = %self.metadata.name, value = %json, "Property value committed");

        if let Some(observer) = &self.observer {
            observer.property_changed(&self.metadata.name, json);
        }
    }
}

impl<T: PropertyValue + std::fmt::Debug> std::fmt::Debug for PropertyCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyCell")
            .field("name", &self.metadata.name)
            .field("value", &self.read())
            .field("read_only", &self.metadata.read_only)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
