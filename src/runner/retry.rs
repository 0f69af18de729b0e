//! Bounded retry with backoff for flaky network and package operations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ProvisionError, Result};

/// Default number of attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default linear backoff step.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(2);

/// How long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `attempt * step` after the given failed attempt.
    Linear(Duration),

    /// The same delay after every failed attempt.
    Fixed(Duration),
}

impl Backoff {
    /// Delay after failed attempt `attempt` (1-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Linear(step) => step.saturating_mul(attempt),
            Backoff::Fixed(delay) => *delay,
        }
    }
}

/// Blocks the calling thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// A value produced by a retried operation, with the attempt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Retry policy: at most `max_attempts` tries, sleeping per `backoff` between.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Linear(DEFAULT_BACKOFF_STEP),
            sleeper: Arc::new(ThreadSleeper),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` must be at least 1.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Result<Self> {
        if max_attempts == 0 {
            return Err(ProvisionError::ConfigValidationError {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(Self {
            max_attempts,
            backoff,
            sleeper: Arc::new(ThreadSleeper),
        })
    }

    /// A policy that never retries.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed(Duration::ZERO),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// Replace the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Total time slept if every attempt fails.
    pub fn worst_case_delay(&self) -> Duration {
        (1..self.max_attempts).map(|n| self.backoff.delay(n)).sum()
    }

    /// Run `op`, retrying every failure.
    pub fn execute<T, E, F>(&self, label: &str, op: F) -> std::result::Result<Retried<T>, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        self.execute_if(label, op, |_| true)
    }

    /// Run `op`, retrying only failures for which `is_transient` holds.
    ///
    /// The last attempt's error is returned unchanged.
    pub fn execute_if<T, E, F, P>(
        &self,
        label: &str,
        mut op: F,
        is_transient: P,
    ) -> std::result::Result<Retried<T>, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
        P: Fn(&E) -> bool,
        E: fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}/{}", label, attempt, self.max_attempts);
                    }
                    return Ok(Retried {
                        value,
                        attempts: attempt,
                    });
                }
                Err(e) if attempt < self.max_attempts && is_transient(&e) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        "{} failed: {}. Retrying... (attempt {}/{}) in {:?}",
                        label,
                        e,
                        attempt + 1,
                        self.max_attempts,
                        delay
                    );
                    self.sleeper.sleep(delay);
                    attempt += 1;
                }
                Err(e) => {
                    if attempt > 1 {
                        warn!("{} failed after {} attempts: {}", label, attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}
