//! Telemetry source trait and its implementations.
//!
//! Every way of obtaining terminal data implements [`TelemetrySource`]: a
//! live terminal reached through `grpcurl` ([`GrpcurlSource`]) or a saved
//! JSON response ([`JsonSource`]). Retry policy lives one level up, in
//! [`crate::client::DishClient`].

use std::io::Read;
use std::path::PathBuf;
use std::process::Command;

use crate::error::{Error, Result};
use crate::history::HistorySnapshot;
use crate::status::DishStatus;

/// Default gRPC address of the user terminal on the local network.
pub const DEFAULT_TARGET: &str = "192.168.100.1:9200";

/// gRPC method that serves every device request.
pub const DEVICE_METHOD: &str = "SpaceX.API.Device.Device/Handle";

const HISTORY_REQUEST: &str = r#"{"get_history":{}}"#;
const STATUS_REQUEST: &str = r#"{"get_status":{}}"#;

/// Trait that every telemetry source must implement.
pub trait TelemetrySource: Send {
    /// Human-readable description of where data comes from.
    fn describe(&self) -> String;

    /// Fetch a full history snapshot.
    fn fetch_history(&mut self) -> Result<HistorySnapshot>;

    /// Fetch the current status.
    fn fetch_status(&mut self) -> Result<DishStatus>;
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn fetch_history(&mut self) -> Result<HistorySnapshot> {
        (**self).fetch_history()
    }

    fn fetch_status(&mut self) -> Result<DishStatus> {
        (**self).fetch_status()
    }
}

// ---------------------------------------------------------------------------
// grpcurl
// ---------------------------------------------------------------------------

/// A live terminal, queried by running `grpcurl` once per request.
#[derive(Debug, Clone)]
pub struct GrpcurlSource {
    program: String,
    target: String,
}

impl GrpcurlSource {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            program: "grpcurl".to_string(),
            target: target.into(),
        }
    }

    /// Use a different grpcurl executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn connection_error(&self, detail: String) -> Error {
        Error::Connection {
            target: self.target.clone(),
            detail,
        }
    }

    /// Run one request and return the JSON response text.
    fn call(&self, request: &str) -> Result<String> {
        log::debug!(
            "{} -plaintext -d {request} {} {DEVICE_METHOD}",
            self.program,
            self.target
        );
        let output = Command::new(&self.program)
            .args(["-plaintext", "-d", request, &self.target, DEVICE_METHOD])
            .output()
            .map_err(|e| {
                self.connection_error(format!("failed to run {}: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = match stderr.trim() {
                "" => format!("{} exited with {}", self.program, output.status),
                msg => msg.to_string(),
            };
            return Err(self.connection_error(detail));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GrpcurlSource {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl TelemetrySource for GrpcurlSource {
    fn describe(&self) -> String {
        format!("dish at {}", self.target)
    }

    fn fetch_history(&mut self) -> Result<HistorySnapshot> {
        HistorySnapshot::from_json(&self.call(HISTORY_REQUEST)?)
    }

    fn fetch_status(&mut self) -> Result<DishStatus> {
        DishStatus::from_json(&self.call(STATUS_REQUEST)?)
    }
}

// ---------------------------------------------------------------------------
// Saved JSON
// ---------------------------------------------------------------------------

/// Where a [`JsonSource`] reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonInput {
    Stdin,
    File(PathBuf),
    Text(String),
}

impl JsonInput {
    /// `-` means stdin, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

/// A saved grpcurl response, e.g. from
/// `grpcurl -plaintext -d '{"get_history":{}}' 192.168.100.1:9200 SpaceX.API.Device.Device/Handle`.
#[derive(Debug, Clone)]
pub struct JsonSource {
    input: JsonInput,
}

impl JsonSource {
    pub fn new(input: JsonInput) -> Self {
        Self { input }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(JsonInput::Text(text.into()))
    }

    fn read(&self) -> Result<String> {
        match &self.input {
            JsonInput::Stdin => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
            JsonInput::File(path) => Ok(std::fs::read_to_string(path)?),
            JsonInput::Text(text) => Ok(text.clone()),
        }
    }
}

impl TelemetrySource for JsonSource {
    fn describe(&self) -> String {
        match &self.input {
            JsonInput::Stdin => "JSON on stdin".to_string(),
            JsonInput::File(path) => format!("JSON file {}", path.display()),
            JsonInput::Text(_) => "inline JSON".to_string(),
        }
    }

    fn fetch_history(&mut self) -> Result<HistorySnapshot> {
        HistorySnapshot::from_json(&self.read()?)
    }

    fn fetch_status(&mut self) -> Result<DishStatus> {
        DishStatus::from_json(&self.read()?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
