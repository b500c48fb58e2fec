/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Error types for the cycle scheduler.
//!
//! * [`SchedulerError`] — returned synchronously from `start()` /
//!   `reconfigure()`; the scheduler state is unchanged when one is returned.
//! * [`TickError`] — the outcome of one failed tick.  Logged by the timer
//!   task and otherwise ignored: a failed tick never disarms the scheduler.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::publisher::PublishError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The requested period is too short or too long to schedule.
    #[error("invalid cycle period {period:?}: {reason}")]
    InvalidPeriod {
        period: Duration,
        reason: &'static str,
    },

    /// `start()` was called while a job is already armed.
    ///
    /// Use `reconfigure()` to change the period of a running scheduler.
    #[error("scheduler already armed with period {period:?}")]
    AlreadyArmed { period: Duration },

    /// The scheduler was constructed outside a tokio runtime.
    #[error("no tokio runtime available to host the cycle timer")]
    NoRuntime,
}

#[derive(Debug, Error)]
pub enum TickError {
    /// The source contained no eligible photos; nothing was published.
    #[error("no candidate photos to publish")]
    EmptyCandidateSet,

    /// The photo source could not be listed.
    #[error("failed to list photo source: {0}")]
    ListFailed(#[source] io::Error),

    /// A candidate was selected but could not be published.
    #[error(transparent)]
    Publish(#[from] PublishError),
}
