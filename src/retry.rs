//! Fixed-interval retry policy for waiting on the backend.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub interval: Duration,
    /// Give up after this many failed attempts.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first attempt.
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    /// Retries forever.
    pub fn unbounded(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            deadline: None,
        }
    }

    pub fn start(&self) -> Attempts {
        Attempts {
            policy: *self,
            started: Instant::now(),
            failures: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(Duration::from_secs(1))
    }
}

/// Progress through a [`RetryPolicy`].
#[derive(Debug)]
pub struct Attempts {
    policy: RetryPolicy,
    started: Instant,
    failures: u32,
}

impl Attempts {
    /// Records a failed attempt. Returns whether another is allowed.
    pub fn record_failure(&mut self) -> bool {
        self.failures = self.failures.saturating_add(1);
        if self
            .policy
            .max_attempts
            .is_some_and(|max| self.failures >= max)
        {
            return false;
        }
        !self
            .policy
            .deadline
            .is_some_and(|deadline| self.started.elapsed() >= deadline)
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
