/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Photo cycler – a Web Thing that republishes a random photo at a
//! remotely configurable rate.
//!
//! Module layout (leaf-first):
//!
//! ```text
//! lib.rs
//! ├── property/    – typed observable property cells + write handlers
//! ├── source       – photo directory listing and extension filtering
//! ├── publisher/   – atomic replace of <static>/current.jpg
//! ├── cycler/      – re-armable periodic scheduler + photo rotation tick
//! ├── thing/       – the composed thing, description, change feed
//! ├── config/      – CLI / YAML settings resolution
//! └── server/      – axum routes for the Web Thing REST surface
//! ```

pub mod config;
pub mod cycler;
pub mod property;
pub mod publisher;
pub mod server;
pub mod source;
pub mod thing;
