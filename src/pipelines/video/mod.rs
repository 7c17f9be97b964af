// SPDX-License-Identifier: GPL-3.0-only

//! Video recording pipeline
//!
//! This module records the displayed stream:
//! - Copies the current frame onto a capture surface every animation frame
//! - Samples the surface at a fixed 30 fps into the encoder
//! - Collects encoded fragments and saves them as one file on stop

pub mod recorder;
pub mod surface;

// Re-export commonly used types
pub use recorder::{FinalizeJob, RecordingSession, RecordingState, StreamRecorder};
pub use surface::{CaptureClock, Surface};
