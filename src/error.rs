//! Error types for the suite

use thiserror::Error;

/// Failures surfaced by the browser driver layer.
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    /// Chromium could not be launched or connected to
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// CDP transport failure (websocket, channel, process)
    #[error("cdp i/o failure: {0}")]
    CdpIo(String),

    /// Bounded wait elapsed before the condition held
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Selector resolved to no element
    #[error("target element not found: {0}")]
    TargetNotFound(String),

    /// Script raised inside the page
    #[error("javascript exception: {0}")]
    JsException(String),

    /// Response did not carry the expected shape
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl DriverError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, DriverError::CdpIo(_) | DriverError::Timeout(_))
    }
}

/// Suite-level error covering both UI and API scenarios.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// HTTP transport failure before any status was observed
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with the server-provided message
    #[error("api contract violation: status {status}, message: {message}")]
    ApiContract { status: u16, message: String },

    /// 2xx response whose body did not match the expected shape
    #[error("invalid response shape: {0}")]
    InvalidResponse(String),

    /// Navigation landed somewhere other than the expected URL
    #[error("unexpected url: expected {expected}, got {actual}")]
    UnexpectedUrl { expected: String, actual: String },

    /// Configuration value could not be used
    #[error("configuration error: {0}")]
    Config(String),
}

impl SuiteError {
    /// Build a contract error from a status code and a raw JSON body,
    /// preferring the server's `message` field when present.
    pub fn from_contract(status: u16, body: &serde_json::Value) -> Self {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string())
            .unwrap_or_else(|| body.to_string());
        SuiteError::ApiContract { status, message }
    }
}
