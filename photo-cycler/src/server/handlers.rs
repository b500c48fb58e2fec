/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::stream::Stream;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::property::PropertyError;
use crate::thing::ThingDescription;

use super::AppState;

// ── Error response ────────────────────────────────────────────────────────────

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }
}

impl From<PropertyError> for ErrorResponse {
    fn from(err: PropertyError) -> Self {
        let (status, error) = match &err {
            PropertyError::UnknownProperty(_) => (StatusCode::NOT_FOUND, "not_found"),
            PropertyError::ReadOnly { .. } => (StatusCode::FORBIDDEN, "read_only"),
            PropertyError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            PropertyError::InvalidType { .. } => (StatusCode::BAD_REQUEST, "invalid_type"),
            PropertyError::Rejected { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "write_rejected")
            }
        };
        Self::new(status, error, err.to_string())
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /`
pub async fn describe(State(thing): State<AppState>) -> Json<ThingDescription> {
    Json(thing.describe())
}

/// `GET /properties`
pub async fn list_properties(State(thing): State<AppState>) -> Json<Map<String, Value>> {
    Json(thing.get_properties())
}

/// `GET /properties/:name` → `{ "<name>": value }`
pub async fn get_property(
    State(thing): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ErrorResponse> {
    let value = thing.get_property(&name)?;
    Ok(Json(single(name, value)))
}

/// `PUT /properties/:name` with body `{ "<name>": value }`.
///
/// Responds with the committed value once the write (and, for the rate, the
/// scheduler reconfiguration) has taken effect.
pub async fn put_property(
    State(thing): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ErrorResponse> {
    if !thing.has_property(&name) {
        return Err(PropertyError::UnknownProperty(name).into());
    }

    let value = body.get(&name).ok_or_else(|| {
        ErrorResponse::new(
            StatusCode::BAD_REQUEST,
            "validation_error",
            format!("request body must be an object with a '{name}' member"),
        )
    })?;

    match thing.set_property(&name, value) {
        Ok(committed) => {
            debug!(property = %name, value = %committed, "Property written");
            Ok(Json(single(name, committed)))
        }
        Err(e) => {
            warn!(property = %name, "Property write rejected: {}", e);
            Err(e.into())
        }
    }
}

/// `GET /events/properties` – one SSE `data:` frame per property change.
///
/// A subscriber that falls behind gets a single frame with all current values
/// in place of the changes it missed.
pub async fn property_events(
    State(thing): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let changes = thing.subscribe();
    let stream = BroadcastStream::new(changes).map(move |msg| {
        let message = match msg {
            Ok(change) => change.to_message(),
            // Lagged behind: resync with a snapshot of every property.
            Err(_) => thing.status_message(),
        };
        Ok(Event::default().data(message.to_string()))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn single(name: String, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(name, value);
    Value::Object(object)
}
