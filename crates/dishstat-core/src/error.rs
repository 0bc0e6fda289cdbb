//! Error type shared by the telemetry sources, the sinks, and the poller.
//!
//! The window and statistics code never fails: everything it receives is
//! clamped instead of rejected. Errors only come from talking to the
//! terminal, parsing what it sent back, or handing records to a sink.

use thiserror::Error;

/// Errors surfaced by dishstat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The user terminal could not be reached, or the RPC itself failed.
    #[error("cannot reach dish at {target}: {detail}")]
    Connection { target: String, detail: String },

    /// The response was not valid JSON for the expected message.
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// The response parsed but did not contain the requested message.
    #[error("response has no '{0}' member")]
    MissingResponse(&'static str),

    /// A per-metric history sequence disagrees with the buffer capacity.
    #[error("history field '{field}' has {actual} samples, expected {expected}")]
    MalformedHistory {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// File or stdin I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A time-series sink failed to accept a write.
    #[error("sink write failed: {0}")]
    Sink(String),
}

impl Error {
    /// Whether this error came from the transport rather than the payload.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Result alias for dishstat operations.
pub type Result<T> = std::result::Result<T, Error>;
