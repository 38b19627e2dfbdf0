//! Circuit breaker guarding one adapter's outbound calls.
//!
//! ```text
//!            threshold consecutive failures
//!   Closed ────────────────────────────────▶ Open
//!     ▲                                       │ cool-down elapsed,
//!     │ probe healthy                         ▼ next caller becomes the probe
//!     └──────────────────────────────────── HalfOpen
//!                                             │ probe unavailable (or dropped)
//!                                             └──────▶ Open (cool-down restarts)
//! ```
//!
//! All state lives behind one mutex and every transition happens inside a
//! single lock scope. The lock is never held across an `.await`.
//!
//! Time is read from [`tokio::time::Instant`] so paused-clock tests can step
//! through the cool-down.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use scm::{BreakerState, BreakerStats, ScmError, Timestamp};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::BreakerConfig;

/// How a finished call reflects on the remote's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The remote answered (including 4xx other than 429).
    Healthy,
    /// Timeout, connection failure, 429 or 5xx.
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { until: Instant },
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    success_count: u64,
    failure_count: u64,
    opened_at: Option<Timestamp>,
    /// Bumped on every trip; permits from an earlier closed window are stale.
    generation: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                success_count: 0,
                failure_count: 0,
                opened_at: None,
                generation: 0,
            }),
        }
    }

    /// Asks to send one request.
    ///
    /// Fails with [`ScmError::CircuitOpen`] while open, and while a half-open
    /// probe is in flight. The returned permit must be settled with
    /// [`Permit::record`]; a probe permit dropped unsettled counts as a
    /// failure.
    pub fn acquire(&self) -> Result<Permit<'_>, ScmError> {
        let mut inner = self.lock();
        match inner.phase {
            Phase::Closed => Ok(Permit::new(self, false, inner.generation)),
            Phase::Open { until } => {
                let now = Instant::now();
                if now < until {
                    return Err(ScmError::CircuitOpen {
                        retry_after: until - now,
                    });
                }
                inner.phase = Phase::HalfOpen;
                info!("circuit half-open, admitting probe call");
                Ok(Permit::new(self, true, inner.generation))
            }
            Phase::HalfOpen => Err(ScmError::CircuitOpen {
                retry_after: Duration::ZERO,
            }),
        }
    }

    /// Snapshot for observability. Never changes state, even when the
    /// cool-down has already elapsed.
    pub fn stats(&self) -> BreakerStats {
        let inner = self.lock();
        BreakerStats {
            state: match inner.phase {
                Phase::Closed => BreakerState::Closed,
                Phase::Open { .. } => BreakerState::Open,
                Phase::HalfOpen => BreakerState::HalfOpen,
            },
            success_count: inner.success_count,
            failure_count: inner.failure_count,
            opened_at: inner.opened_at,
        }
    }

    fn settle(&self, probe: bool, generation: u64, outcome: Outcome) {
        let mut inner = self.lock();
        if probe {
            match outcome {
                Outcome::Healthy => {
                    inner.phase = Phase::Closed;
                    inner.success_count = 0;
                    inner.failure_count = 0;
                    info!("circuit closed after successful probe");
                }
                Outcome::Unavailable => {
                    inner.failure_count += 1;
                    self.trip(&mut inner);
                }
            }
            return;
        }

        // Results of calls admitted before the last trip do not move it, even
        // once a probe has closed it again.
        if inner.generation != generation || !matches!(inner.phase, Phase::Closed) {
            return;
        }
        match outcome {
            Outcome::Healthy => {
                inner.success_count += 1;
                inner.failure_count = 0;
            }
            Outcome::Unavailable => {
                inner.failure_count += 1;
                if inner.failure_count >= u64::from(self.config.failure_threshold) {
                    self.trip(&mut inner);
                }
            }
        }
    }

    fn trip(&self, inner: &mut Inner) {
        let cool_down = self.config.cool_down();
        inner.phase = Phase::Open {
            until: Instant::now() + cool_down,
        };
        inner.opened_at = Some(Timestamp::now());
        inner.generation += 1;
        warn!(
            failure_count = inner.failure_count,
            cool_down_ms = cool_down.as_millis() as u64,
            "circuit opened"
        );
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Permit
// ---------------------------------------------------------------------------

/// Admission for one request through the breaker.
#[must_use = "a permit must be settled with `record`"]
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    generation: u64,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool, generation: u64) -> Self {
        Self {
            breaker,
            probe,
            generation,
            settled: false,
        }
    }

    /// `true` when this call decides whether a half-open breaker closes.
    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn record(mut self, outcome: Outcome) {
        self.settled = true;
        self.breaker.settle(self.probe, self.generation, outcome);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        // A cancelled probe would otherwise leave the breaker half-open forever.
        if !self.settled && self.probe {
            self.breaker.settle(true, self.generation, Outcome::Unavailable);
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
