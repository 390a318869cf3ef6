use thiserror::Error;

/// Failure to obtain a well-formed slide deck from the backend.
///
/// The only error class that reaches the learner: it is rendered by the
/// deck's `Error` state together with a retry hint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with status {status}")]
    Status { status: u16 },
    #[error("{0}")]
    Malformed(String),
}

/// The camera or the landmark model could not be brought up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InferenceInitError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("face detector failed to load: {0}")]
    DetectorLoad(String),
}

/// A single detector invocation failed; the frame is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("detector failed on frame {frame_index}: {message}")]
pub struct DetectorError {
    pub frame_index: u64,
    pub message: String,
}

/// An attention report did not reach the collector.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemetrySendError {
    #[error("attention report failed: {0}")]
    Transport(String),
    #[error("attention report rejected with status {status}")]
    Status { status: u16 },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
    #[error("{field} must be within 0.0..=1.0, got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}
