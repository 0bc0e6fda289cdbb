//! Retry policy on top of a [`TelemetrySource`].
//!
//! A connection that worked for the previous call may have gone stale since
//! (the terminal reboots, NAT state expires). So when a call fails on a
//! connection that was already in use, it is retried exactly once. A failure
//! on a fresh connection is returned as is.

use crate::error::Result;
use crate::history::HistorySnapshot;
use crate::source::TelemetrySource;
use crate::status::DishStatus;

/// Wraps a source with the reused-connection retry rule.
#[derive(Debug)]
pub struct DishClient<S> {
    source: S,
    reused: bool,
}

impl<S: TelemetrySource> DishClient<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            reused: false,
        }
    }

    pub fn history(&mut self) -> Result<HistorySnapshot> {
        self.call(|s| s.fetch_history())
    }

    pub fn status(&mut self) -> Result<DishStatus> {
        self.call(|s| s.fetch_status())
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Whether the last call succeeded, so the next one counts as reused.
    pub fn is_reused(&self) -> bool {
        self.reused
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn call<T>(&mut self, mut op: impl FnMut(&mut S) -> Result<T>) -> Result<T> {
        loop {
            let reused = self.reused;
            match op(&mut self.source) {
                Ok(value) => {
                    self.reused = true;
                    return Ok(value);
                }
                Err(e) if e.is_connection() => {
                    self.reused = false;
                    if !reused {
                        return Err(e);
                    }
                    log::debug!("call on reused connection failed ({e}), retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
