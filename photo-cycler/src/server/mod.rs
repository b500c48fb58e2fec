/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Web Thing HTTP surface.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | `GET` | `/` | thing description |
//! | `GET` | `/properties` | all property values |
//! | `GET` | `/properties/:name` | one property value |
//! | `PUT` | `/properties/:name` | write a property |
//! | `GET` | `/events/properties` | Server-Sent Events change stream |
//! | `GET` | `/static/*` | publication directory (`current.jpg`) |

pub mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::thing::{PhotoCyclerThing, EVENTS_HREF, STATIC_BASE};

/// Shared handler state.
pub type AppState = Arc<PhotoCyclerThing>;

/// Build the router serving `thing` and the files under `static_dir`.
pub fn router(thing: AppState, static_dir: &Path) -> Router {
    // Thing UIs are usually served from a different origin (gateway, file://).
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::describe))
        .route("/properties", get(handlers::list_properties))
        .route(
            "/properties/:name",
            get(handlers::get_property).put(handlers::put_property),
        )
        .route(EVENTS_HREF, get(handlers::property_events))
        .nest_service(STATIC_BASE, ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(thing)
}
