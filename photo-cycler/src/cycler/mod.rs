/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Re-armable periodic scheduler for the photo cycle.
//!
//! [`CycleScheduler`] owns at most one timer task.  Every arm gets a fresh
//! generation number; the timer task compares its own generation with the
//! scheduler's current one before each tick and exits as soon as it has been
//! superseded.  Together with `JoinHandle::abort()` this makes it impossible
//! for an old-period job to fire after `reconfigure()` has returned.
//!
//! ```text
//!            start(p)                 reconfigure(q)
//! Stopped ─────────────► Armed(p) ──────────────────► Armed(q)
//!    ▲                      │  gen n                     gen n+1
//!    └───────── stop() ─────┘
//! ```
//!
//! A tick already running when `reconfigure()` or `stop()` is called is not
//! interrupted: the job body is synchronous, so `abort()` only takes effect
//! at the timer task's next `.await`.
//!
//! # Design decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | Timer | `tokio::time::interval_at(now + period, period)` — no fire at t=0 |
//! | Missed ticks | `MissedTickBehavior::Delay` — a slow tick pushes the schedule back instead of bursting |
//! | Cancellation | generation counter + `abort()` |
//! | Calling context | `start` / `reconfigure` / `stop` are synchronous so they can run inside a property write handler |

pub mod error;
pub mod rotation;

pub use error::{SchedulerError, TickError};
pub use rotation::PhotoRotation;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Cycle rate used when none is configured, in seconds.
pub const DEFAULT_RATE_SECS: f64 = 5.0;

/// Shortest period the scheduler accepts.
///
/// Every tick touches the filesystem and notifies subscribers; anything
/// faster than this degenerates into a busy loop.
pub const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Longest period the scheduler accepts (366 days).
///
/// Keeps `Instant + period` arithmetic inside the timer far from overflow.
pub const MAX_PERIOD: Duration = Duration::from_secs(366 * 24 * 60 * 60);

// ── Job abstraction ───────────────────────────────────────────────────────────

/// What a successful tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The named photo is now the published artifact.
    Published { name: String, path: PathBuf },
}

/// The work performed on every tick.
///
/// Implemented by [`PhotoRotation`]; tests substitute their own jobs.
pub trait CycleJob: Send + Sync + 'static {
    fn tick(&self) -> Result<TickOutcome, TickError>;
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Externally observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Armed(Duration),
}

/// The single live timer task.
struct ArmedJob {
    generation: u64,
    period: Duration,
    handle: JoinHandle<()>,
}

// ── CycleScheduler ────────────────────────────────────────────────────────────

pub struct CycleScheduler {
    job: Arc<dyn CycleJob>,
    runtime: Handle,
    /// Generation of the job allowed to fire; bumped on every arm and stop.
    generation: Arc<AtomicU64>,
    armed: Mutex<Option<ArmedJob>>,
}

impl CycleScheduler {
    /// Create a stopped scheduler whose timer tasks run on the current tokio
    /// runtime.
    ///
    /// # Errors
    /// [`SchedulerError::NoRuntime`] if called outside a runtime context.
    pub fn new(job: Arc<dyn CycleJob>) -> Result<Self, SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        Ok(Self::with_runtime(job, runtime))
    }

    pub fn with_runtime(job: Arc<dyn CycleJob>, runtime: Handle) -> Self {
        Self {
            job,
            runtime,
            generation: Arc::new(AtomicU64::new(0)),
            armed: Mutex::new(None),
        }
    }

    /// `Stopped → Armed(period)`.  The first tick fires one `period` from now.
    ///
    /// # Errors
    /// * [`SchedulerError::InvalidPeriod`] for a period outside
    ///   [`MIN_PERIOD`]..=[`MAX_PERIOD`].
    /// * [`SchedulerError::AlreadyArmed`] if a job is already armed.
    pub fn start(&self, period: Duration) -> Result<(), SchedulerError> {
        validate_period(period)?;

        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = armed.as_ref() {
            return Err(SchedulerError::AlreadyArmed {
                period: current.period,
            });
        }

        let job = self.arm(period);
        info!(period = ?period, generation = job.generation, "Cycle scheduler started");
        *armed = Some(job);
        Ok(())
    }

    /// Any state `→ Armed(period)`.
    ///
    /// The old job is cancelled before the new one is spawned.  An invalid
    /// period leaves the current job running untouched.
    pub fn reconfigure(&self, period: Duration) -> Result<(), SchedulerError> {
        validate_period(period)?;

        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = armed.take().map(|old| self.cancel(old));

        let job = self.arm(period);
        info!(
            period = ?period,
            previous = ?previous,
            generation = job.generation,
            "Cycle scheduler reconfigured"
        );
        *armed = Some(job);
        Ok(())
    }

    /// `Armed → Stopped`.  Idempotent.
    pub fn stop(&self) {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = armed.take() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            let period = self.cancel(old);
            info!(period = ?period, "Cycle scheduler stopped");
        }
    }

    pub fn state(&self) -> SchedulerState {
        match self
            .armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(job) => SchedulerState::Armed(job.period),
            None => SchedulerState::Stopped,
        }
    }

    /// Generation tag of the most recently armed (or stopped) job.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Run one tick immediately on the calling thread, outside the timer.
    ///
    /// The error is returned as well as logged.
    pub fn tick(&self) -> Result<TickOutcome, TickError> {
        run_tick(self.job.as_ref())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    /// Spawn a timer task tagged with a new generation.
    ///
    /// Caller holds the `armed` lock.
    fn arm(&self, period: Duration) -> ArmedJob {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let job = Arc::clone(&self.job);
        let first = Instant::now() + period;

        let handle = self.runtime.spawn(async move {
            let mut interval = time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if current.load(Ordering::SeqCst) != generation {
                    debug!(generation, "Timer superseded, exiting");
                    break;
                }
                // Failures are logged inside run_tick and never end the loop.
                let _ = run_tick(job.as_ref());
            }
        });

        ArmedJob {
            generation,
            period,
            handle,
        }
    }

    fn cancel(&self, old: ArmedJob) -> Duration {
        old.handle.abort();
        debug!(generation = old.generation, "Timer cancelled");
        old.period
    }
}

impl Drop for CycleScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CycleScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleScheduler")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .finish()
    }
}

fn validate_period(period: Duration) -> Result<(), SchedulerError> {
    if period < MIN_PERIOD {
        return Err(SchedulerError::InvalidPeriod {
            period,
            reason: "period is shorter than the minimum of 100 ms",
        });
    }
    if period > MAX_PERIOD {
        return Err(SchedulerError::InvalidPeriod {
            period,
            reason: "period exceeds the maximum of 366 days",
        });
    }
    Ok(())
}

/// Execute one tick of `job` and log the outcome.
fn run_tick(job: &dyn CycleJob) -> Result<TickOutcome, TickError> {
    let result = job.tick();
    match &result {
        Ok(TickOutcome::Published { name, .. }) => debug!(photo = %name, "Tick complete"),
        Err(TickError::EmptyCandidateSet) => debug!("Tick skipped: no candidate photos"),
        Err(e) => warn!("Tick failed: {}", e),
    }
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
