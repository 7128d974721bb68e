//! Retry with exponential backoff for transient failures.
//!
//! Shared by file I/O in the indexing service and directory registration in
//! the watcher. Two exhaustion modes are exposed: [`RetryPolicy::run`]
//! propagates the final error, [`RetryPolicy::run_opt`] returns `None`.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::{error, warn};

/// Exponential-backoff retry policy.
///
/// Delays start at `base_delay` and double after each failed attempt, capped
/// at `max_delay`.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Run the operation, propagating the last error once attempts are
    /// exhausted.
    pub fn run<T, E, F>(&self, label: &str, context: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        let mut delay = self.base_delay;
        let mut attempts = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.max_attempts {
                        error!(
                            "Failed to {} after {} attempts: {} - {}",
                            label, self.max_attempts, context, e
                        );
                        return Err(e);
                    }
                    warn!(
                        "Failed to {} (attempt {}/{}), retrying in {:?}: {}",
                        label, attempts, self.max_attempts, delay, context
                    );
                    thread::sleep(delay);
                    delay = (delay * 2).min(self.max_delay);
                }
            }
        }
    }

    /// Run the operation, returning `None` once attempts are exhausted.
    pub fn run_opt<T, E, F>(&self, label: &str, context: &str, op: F) -> Option<T>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        self.run(label, context, op).ok()
    }
}
