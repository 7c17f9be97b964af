// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera panel

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Remote camera control errors
    Camera(CameraError),
    /// Video feed errors
    Stream(StreamError),
    /// Recording-related errors
    Recording(RecordingError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors from the camera's control endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Request never produced a response (connect, timeout, reset)
    Network(String),
    /// Server answered with a non-2xx status
    Status(u16),
    /// Response body could not be understood
    InvalidResponse(String),
    /// Focus value outside 0..=100
    InvalidFocus(u32),
}

/// Errors from the MJPEG feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Connection failed or dropped
    Network(String),
    /// Server answered with a non-2xx status
    Status(u16),
    /// Response is not a multipart stream
    NotMultipart(String),
    /// A part could not be decoded as an image
    Decode(String),
    /// Server closed the stream
    Ended,
}

/// Recording-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// None of the preferred formats can be encoded here
    NoSupportedFormat,
    /// Recording already in progress
    AlreadyRecording,
    /// Encoder element missing for the chosen format
    EncoderNotAvailable(String),
    /// Pipeline error during recording
    PipelineError(String),
    /// Finished file could not be written
    SaveFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Stream(e) => write!(f, "Stream error: {}", e),
            AppError::Recording(e) => write!(f, "Recording error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Network(msg) => write!(f, "Request failed: {}", msg),
            CameraError::Status(code) => write!(f, "Server returned HTTP {}", code),
            CameraError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            CameraError::InvalidFocus(value) => {
                write!(f, "Focus {} is outside 0-100", value)
            }
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Network(msg) => write!(f, "Connection error: {}", msg),
            StreamError::Status(code) => write!(f, "Feed returned HTTP {}", code),
            StreamError::NotMultipart(content_type) => {
                write!(f, "Not a multipart stream: {}", content_type)
            }
            StreamError::Decode(msg) => write!(f, "Failed to decode frame: {}", msg),
            StreamError::Ended => write!(f, "Stream ended"),
        }
    }
}

impl fmt::Display for RecordingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingError::NoSupportedFormat => {
                write!(f, "No supported video format is available for recording")
            }
            RecordingError::AlreadyRecording => write!(f, "Recording already in progress"),
            RecordingError::EncoderNotAvailable(msg) => write!(f, "Encoder not available: {}", msg),
            RecordingError::PipelineError(msg) => write!(f, "Pipeline error: {}", msg),
            RecordingError::SaveFailed(msg) => write!(f, "Save failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for StreamError {}
impl std::error::Error for RecordingError {}

impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<StreamError> for AppError {
    fn from(err: StreamError) -> Self {
        AppError::Stream(err)
    }
}

impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        AppError::Recording(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for CameraError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => CameraError::Status(status.as_u16()),
            None if err.is_decode() => CameraError::InvalidResponse(err.to_string()),
            None => CameraError::Network(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => StreamError::Status(status.as_u16()),
            None => StreamError::Network(err.to_string()),
        }
    }
}

impl From<std::io::Error> for RecordingError {
    fn from(err: std::io::Error) -> Self {
        RecordingError::SaveFailed(err.to_string())
    }
}
