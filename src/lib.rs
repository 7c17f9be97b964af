// SPDX-License-Identifier: GPL-3.0-only

//! Camera Panel - control panel for a network camera
//!
//! This library provides the core functionality of the panel: showing the
//! camera's live MJPEG feed, changing focus and backlight over HTTP, and
//! recording the displayed feed to a local video file.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Panel state, message handling and controls
//! - [`backends`]: HTTP camera control and the MJPEG feed client
//! - [`media`]: Recording formats and video encoding
//! - [`pipelines`]: Stream recording pipeline
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving finished recordings
//! - [`terminal`]: Terminal UI
//!
//! # Example
//!
//! ```ignore
//! // This is a terminal application, typically run via:
//! // camera-panel --camera-url http://10.0.0.2:5000
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{Message, Panel, Services};
pub use backends::camera::{CameraControl, CameraSettings};
pub use config::Config;
pub use errors::{AppError, AppResult};
