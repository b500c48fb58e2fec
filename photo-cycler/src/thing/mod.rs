/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The photo cycler thing.
//!
//! [`PhotoCyclerThing`] composes two properties and the cycle scheduler:
//!
//! ```text
//!                 write                  on_write            reconfigure
//! HTTP PUT ──► updateRate cell ──► RateHandler ──► CycleScheduler ──► timer task
//!                                                                        │ tick
//!                                                                        ▼
//! HTTP GET ◄── image cell (null, read-only) ◄── update(()) ◄── PhotoRotation ──► current.jpg
//!                   │
//!                   └──► ChangeFeed ──► event stream subscribers
//! ```
//!
//! The thing must be constructed inside a tokio runtime; the scheduler spawns
//! its timer task on the runtime that was current at construction.

pub mod feed;

pub use feed::{ChangeFeed, PropertyChange};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

use crate::cycler::{CycleScheduler, PhotoRotation, SchedulerError, MAX_PERIOD, MIN_PERIOD};
use crate::property::{
    Link, PropertyCell, PropertyError, PropertyMetadata, PropertyValue, PropertyWriteHandler,
};
use crate::publisher::{ArtifactPublisher, CURRENT_FILE_NAME};
use crate::source::DirectorySource;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Name of the read-write cycle rate property (seconds).
pub const UPDATE_RATE: &str = "updateRate";

/// Name of the read-only image property.
pub const IMAGE: &str = "image";

/// URL prefix under which the publication directory is served.
pub const STATIC_BASE: &str = "/static";

/// URL of the property change event stream.
pub const EVENTS_HREF: &str = "/events/properties";

/// Identifier advertised in the thing description.
pub const THING_ID: &str = "urn:dev:ops:photo-cycler";

/// Browser UI for the thing, served from the static directory.
pub const UI_HREF: &str = "/static/index.html";

const CONTEXT: &str = "https://webthings.io/schemas";

// ── Errors ────────────────────────────────────────────────────────────────────

/// Failure to construct the thing.
#[derive(Debug, Error)]
pub enum ThingError {
    #[error("invalid initial update rate: {0}")]
    InvalidRate(#[source] PropertyError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

// ── Construction parameters ───────────────────────────────────────────────────

/// Everything needed to build a [`PhotoCyclerThing`].
#[derive(Debug, Clone)]
pub struct ThingConfig {
    pub title: String,
    /// Directory photos are picked from.
    pub photos_dir: PathBuf,
    /// Directory holding `current.jpg`.
    pub publication_dir: PathBuf,
    /// Initial cycle rate in seconds.
    pub rate_secs: f64,
    /// RNG seed for photo selection; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

// ── Thing description ─────────────────────────────────────────────────────────

/// Serialisable Web Thing description.
#[derive(Debug, Clone, Serialize)]
pub struct ThingDescription {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub id: &'static str,
    #[serde(rename = "@type")]
    pub semantic_type: Vec<String>,
    pub title: String,
    pub description: String,
    pub href: String,
    pub properties: Map<String, Value>,
    pub actions: Map<String, Value>,
    pub events: Map<String, Value>,
    pub links: Vec<Link>,
}

// ── Rate handler ──────────────────────────────────────────────────────────────

/// Converts a rate in seconds to a timer period of at least [`MIN_PERIOD`].
fn rate_period(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|period| *period >= MIN_PERIOD)
        .ok_or_else(|| format!("{secs} seconds is not a usable cycle period"))
}

/// Reconfigures the scheduler when `updateRate` is written.
struct RateHandler {
    scheduler: Arc<CycleScheduler>,
}

impl PropertyWriteHandler<f64> for RateHandler {
    fn on_write(&self, secs: &f64) -> Result<(), PropertyError> {
        let period = rate_period(*secs).map_err(|reason| PropertyError::Validation {
            name: UPDATE_RATE.to_string(),
            reason,
        })?;

        self.scheduler
            .reconfigure(period)
            .map_err(|e| match e {
                SchedulerError::InvalidPeriod { reason, .. } => PropertyError::Validation {
                    name: UPDATE_RATE.to_string(),
                    reason: reason.to_string(),
                },
                other => PropertyError::Rejected {
                    name: UPDATE_RATE.to_string(),
                    reason: other.to_string(),
                },
            })?;

        info!(rate_secs = *secs, "Update rate changed");
        Ok(())
    }
}

// ── PhotoCyclerThing ──────────────────────────────────────────────────────────

pub struct PhotoCyclerThing {
    title: String,
    rate: Arc<PropertyCell<f64>>,
    image: Arc<PropertyCell<()>>,
    scheduler: Arc<CycleScheduler>,
    feed: Arc<ChangeFeed>,
    current_path: PathBuf,
}

impl PhotoCyclerThing {
    /// Build the thing and arm the scheduler at `config.rate_secs`.
    ///
    /// # Errors
    /// * [`ThingError::InvalidRate`] if the initial rate would be rejected as
    ///   a property write.
    /// * [`ThingError::Scheduler`] if no tokio runtime is available.
    pub fn new(config: ThingConfig) -> Result<Self, ThingError> {
        let feed = Arc::new(ChangeFeed::new());

        let rate_meta = rate_metadata();
        let initial_period = config
            .rate_secs
            .check(&rate_meta)
            .and_then(|()| rate_period(config.rate_secs))
            .map_err(|reason| {
                ThingError::InvalidRate(PropertyError::Validation {
                    name: UPDATE_RATE.to_string(),
                    reason,
                })
            })?;

        let image = Arc::new(PropertyCell::new(image_metadata(), ()).with_observer(feed.clone()));

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let publisher = ArtifactPublisher::new(&config.publication_dir);
        let current_path = publisher.current_path().to_path_buf();
        let rotation = PhotoRotation::new(
            DirectorySource::new(&config.photos_dir),
            publisher,
            rng,
            Arc::clone(&image),
        );
        let scheduler = Arc::new(CycleScheduler::new(Arc::new(rotation))?);

        let rate = Arc::new(
            PropertyCell::new(rate_meta, config.rate_secs)
                .with_handler(RateHandler {
                    scheduler: Arc::clone(&scheduler),
                })
                .with_observer(feed.clone()),
        );

        scheduler.start(initial_period)?;

        info!(
            title = %config.title,
            photos = %config.photos_dir.display(),
            publication = %config.publication_dir.display(),
            rate_secs = config.rate_secs,
            seeded = config.seed.is_some(),
            "Photo cycler thing ready"
        );

        Ok(Self {
            title: config.title,
            rate,
            image,
            scheduler,
            feed,
            current_path,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current cycle rate in seconds.
    pub fn rate(&self) -> f64 {
        self.rate.read()
    }

    pub fn has_property(&self, name: &str) -> bool {
        name == UPDATE_RATE || name == IMAGE
    }

    /// Current value of `name` as JSON.
    pub fn get_property(&self, name: &str) -> Result<Value, PropertyError> {
        match name {
            UPDATE_RATE => Ok(self.rate.read_json()),
            IMAGE => Ok(self.image.read_json()),
            other => Err(PropertyError::UnknownProperty(other.to_string())),
        }
    }

    /// All property values keyed by name.
    pub fn get_properties(&self) -> Map<String, Value> {
        let mut values = Map::new();
        values.insert(UPDATE_RATE.to_string(), self.rate.read_json());
        values.insert(IMAGE.to_string(), self.image.read_json());
        values
    }

    /// Remote write.  Returns the committed value.
    ///
    /// For `updateRate` the scheduler has already been re-armed at the new
    /// period when this returns `Ok`.
    pub fn set_property(&self, name: &str, value: &Value) -> Result<Value, PropertyError> {
        match name {
            UPDATE_RATE => self.rate.write_json(value),
            IMAGE => self.image.write_json(value),
            other => Err(PropertyError::UnknownProperty(other.to_string())),
        }
    }

    pub fn describe(&self) -> ThingDescription {
        let mut properties = Map::new();
        for meta in [self.rate.metadata(), self.image.metadata()] {
            let mut meta = meta.clone();
            meta.links.insert(
                0,
                Link::new("property", format!("/properties/{}", meta.name)),
            );
            // PropertyMetadata only holds plain data; serialisation can't fail.
            let value = serde_json::to_value(&meta).unwrap_or(Value::Null);
            properties.insert(meta.name.clone(), value);
        }

        ThingDescription {
            context: CONTEXT,
            id: THING_ID,
            semantic_type: Vec::new(),
            title: self.title.clone(),
            description: self.title.clone(),
            href: "/".to_string(),
            properties,
            actions: Map::new(),
            events: Map::new(),
            links: vec![
                Link::new("properties", "/properties"),
                Link::new("alternate", UI_HREF).with_media_type("text/html"),
                Link::new("alternate", EVENTS_HREF).with_media_type("text/event-stream"),
            ],
        }
    }

    /// `propertyStatus` message carrying every property's current value.
    ///
    /// Sent to event stream subscribers that fell behind and missed changes.
    pub fn status_message(&self) -> Value {
        json!({
            "messageType": "propertyStatus",
            "data": self.get_properties(),
        })
    }

    /// Receive every subsequent property change.
    pub fn subscribe(&self) -> broadcast::Receiver<PropertyChange> {
        self.feed.subscribe()
    }

    pub fn scheduler(&self) -> &CycleScheduler {
        &self.scheduler
    }

    /// Filesystem path of the published artifact.
    pub fn current_path(&self) -> &std::path::Path {
        &self.current_path
    }

    /// Stop cycling.  The thing stays readable; writes to `updateRate` re-arm.
    pub fn shutdown(&self) {
        self.scheduler.stop();
    }
}

impl std::fmt::Debug for PhotoCyclerThing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoCyclerThing")
            .field("title", &self.title)
            .field("rate", &self.rate())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

fn rate_metadata() -> PropertyMetadata {
    PropertyMetadata {
        name: UPDATE_RATE.to_string(),
        title: "Update Rate".to_string(),
        description: "Photo cycle rate".to_string(),
        unit: Some("second".to_string()),
        minimum: Some(MIN_PERIOD.as_secs_f64()),
        maximum: Some(MAX_PERIOD.as_secs_f64()),
        ..Default::default()
    }
}

fn image_metadata() -> PropertyMetadata {
    PropertyMetadata {
        name: IMAGE.to_string(),
        semantic_type: Some("ImageProperty".to_string()),
        title: "Image".to_string(),
        description: "Current image".to_string(),
        read_only: true,
        links: vec![
            Link::new("alternate", format!("{STATIC_BASE}/{CURRENT_FILE_NAME}"))
                .with_media_type("image/jpeg"),
        ],
        ..Default::default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
