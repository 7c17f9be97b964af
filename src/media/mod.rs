// SPDX-License-Identifier: GPL-3.0-only

//! Media encoding for recordings
//!
//! # Formats
//!
//! The [`formats`] module maps recording format names such as
//! `video/webm;codecs=vp9` onto a codec and a container.
//!
//! # Video Encoding
//!
//! The [`encoders`] module defines the [`EncoderBackend`]/[`FrameEncoder`]
//! pair used by the recorder and implements it on top of GStreamer.

pub mod encoders;
pub mod formats;

// Re-export commonly used types
pub use encoders::{EncoderBackend, FrameEncoder, GstEncoderBackend, select_format};
pub use formats::RecordingFormat;
