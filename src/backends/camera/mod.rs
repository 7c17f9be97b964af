// SPDX-License-Identifier: GPL-3.0-only

//! Remote camera control
//!
//! The camera server exposes its settings as plain `GET` endpoints. Any 2xx
//! answer counts as success; everything else is a [`CameraError`].

pub mod client;
pub mod types;

pub use client::HttpCameraClient;
pub use types::*;

use crate::errors::CameraError;
use futures::future::BoxFuture;

/// Result type for control requests
pub type ControlResult<T> = Result<T, CameraError>;

/// Operations the panel needs from the camera server
///
/// Object safe so the panel can hold an `Arc<dyn CameraControl>` and tests
/// can swap in a scripted implementation.
pub trait CameraControl: Send + Sync {
    /// `GET /set_focus/{value}`
    fn set_focus(&self, value: u8) -> BoxFuture<'_, ControlResult<()>>;

    /// `GET /set_backlight/{1|0}`
    fn set_backlight(&self, enabled: bool) -> BoxFuture<'_, ControlResult<()>>;

    /// `GET /get_backlight`
    fn backlight_status(&self) -> BoxFuture<'_, ControlResult<BacklightStatus>>;
}
