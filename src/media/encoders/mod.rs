// SPDX-License-Identifier: GPL-3.0-only

//! Video encoding for recordings
//!
//! A recording pushes RGBA surface frames into a [`FrameEncoder`] and
//! collects the encoded container bytes it emits as ordered fragments.
//! [`EncoderBackend`] answers which [`RecordingFormat`]s can be produced and
//! creates encoders for them. The production backend is GStreamer
//! ([`GstEncoderBackend`]); tests substitute their own.

pub mod detection;
pub mod video;

pub use detection::{is_element_available, log_available_encoders};
pub use video::{GstEncoderBackend, GstFrameEncoder};

use crate::errors::RecordingError;
use crate::media::formats::RecordingFormat;
use bytes::Bytes;
use image::RgbaImage;
use std::time::Duration;
use tracing::debug;

/// Creates encoders and reports which formats it supports
pub trait EncoderBackend: Send + Sync {
    /// Whether `format` can be recorded
    fn is_supported(&self, format: &RecordingFormat) -> bool;

    /// Create an encoder for frames of `width`x`height` at `fps`
    fn create_encoder(
        &self,
        format: &RecordingFormat,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Box<dyn FrameEncoder>, RecordingError>;
}

/// A running encoder
pub trait FrameEncoder: Send {
    /// Encode one captured frame presented `timestamp` after the first
    fn push_frame(&mut self, frame: &RgbaImage, timestamp: Duration) -> Result<(), RecordingError>;

    /// Encoded fragments produced since the last call, in order
    fn take_fragments(&mut self) -> Vec<Bytes>;

    /// False once the encoder has been stopped or has failed
    fn is_active(&self) -> bool;

    /// Flush and stop, returning the remaining fragments
    fn finish(self: Box<Self>) -> Result<Vec<Bytes>, RecordingError>;
}

/// First format of `preferred` that `backend` supports
///
/// Unparseable names are skipped.
pub fn select_format<S: AsRef<str>>(
    preferred: &[S],
    backend: &dyn EncoderBackend,
) -> Option<RecordingFormat> {
    preferred.iter().find_map(|name| {
        let name = name.as_ref();
        let Some(format) = RecordingFormat::parse(name) else {
            debug!(format = %name, "Skipping unknown recording format");
            return None;
        };
        if backend.is_supported(&format) {
            Some(format)
        } else {
            debug!(format = %name, "Recording format not supported");
            None
        }
    })
}
