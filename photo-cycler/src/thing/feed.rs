/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Property change notifications.
//!
//! [`ChangeFeed`] is the [`PropertyObserver`] bound to every property of the
//! thing.  It fans each committed change out to any number of subscribers
//! (the HTTP event stream) over a tokio broadcast channel.  A change with no
//! subscribers is simply dropped.

use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::trace;

use crate::property::PropertyObserver;

/// Messages buffered per subscriber before it starts lagging.
const FEED_CAPACITY: usize = 64;

/// One committed property value change.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub name: String,
    pub value: Value,
}

impl PropertyChange {
    /// Web Thing `propertyStatus` message for this change.
    pub fn to_message(&self) -> Value {
        json!({
            "messageType": "propertyStatus",
            "data": { self.name.as_str(): self.value },
        })
    }
}

#[derive(Debug)]
pub struct ChangeFeed {
    tx: broadcast::Sender<PropertyChange>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PropertyChange> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyObserver for ChangeFeed {
    fn property_changed(&self, name: &str, value: Value) {
        let change = PropertyChange {
            name: name.to_string(),
            value,
        };
        // Err only means nobody is listening right now.
        let receivers = self.tx.send(change).unwrap_or(0);
        trace!(property = name, receivers, "Property change broadcast");
    }
}
