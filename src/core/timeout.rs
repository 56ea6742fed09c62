// src/core/timeout.rs

use std::time::{Duration, Instant};

use crate::core::error::{Error, Result};

/// A cooperative wall-clock deadline.
///
/// Long-running loops call `check()` at the head of each outer iteration;
/// there is no background thread and no implicit yield point. An indefinite
/// timeout never elapses.
#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    started: Instant,
    limit: Option<Duration>,
}

impl Timeout {
    /// A timeout that never elapses.
    pub fn indefinite() -> Self {
        Timeout { started: Instant::now(), limit: None }
    }

    /// A timeout that elapses the given number of seconds from now.
    pub fn after_seconds(seconds: u64) -> Self {
        Timeout { started: Instant::now(), limit: Some(Duration::from_secs(seconds)) }
    }

    /// Parses an optional second count: `None` is indefinite, `Some(s)` is
    /// "s seconds from now".
    pub fn parse(seconds: Option<u64>) -> Self {
        match seconds {
            None => Timeout::indefinite(),
            Some(s) => Timeout::after_seconds(s),
        }
    }

    pub fn is_indefinite(&self) -> bool {
        self.limit.is_none()
    }

    /// Queries the deadline without failing.
    pub fn is_elapsed(&self) -> bool {
        match self.limit {
            None => false,
            Some(limit) => self.started.elapsed() > limit,
        }
    }

    /// Fails with `TimedOut` if the deadline has elapsed.
    pub fn check(&self) -> Result<()> {
        if self.is_elapsed() {
            return Err(Error::TimedOut);
        }
        Ok(())
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::indefinite()
    }
}
