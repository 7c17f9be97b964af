// SPDX-License-Identifier: GPL-3.0-only

//! Recording of the displayed stream
//!
//! The recorder is a two-state machine:
//!
//! ```text
//!          start (a format is supported)
//!   Idle ─────────────────────────────────▶ Recording
//!     ▲                                         │
//!     └─────────────────────────────────────────┘
//!          stop (encoder still active)
//! ```
//!
//! Every animation frame while recording, the current image is drawn onto
//! the session's surface and, when the capture clock is due, the surface is
//! pushed to the encoder. Encoded fragments accumulate in the session until
//! stop hands them to a [`FinalizeJob`], which writes the file.

use super::surface::{CaptureClock, Surface};
use crate::backends::camera::CameraFrame;
use crate::constants::CAPTURE_FPS;
use crate::errors::RecordingError;
use crate::media::encoders::{EncoderBackend, FrameEncoder, select_format};
use crate::media::formats::RecordingFormat;
use crate::storage::{Downloads, recording_file_name};
use bytes::Bytes;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Called with `true` when recording starts and `false` when it ends
pub type StateListener = Box<dyn Fn(bool) + Send>;

/// An active recording
pub struct RecordingSession {
    format: RecordingFormat,
    encoder: Box<dyn FrameEncoder>,
    surface: Surface,
    clock: CaptureClock,
    fragments: Vec<Bytes>,
    started_at: Instant,
    frames_captured: u64,
}

impl RecordingSession {
    pub fn format(&self) -> &RecordingFormat {
        &self.format
    }

    /// Encoded fragments collected so far
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }
}

/// Recording state machine
#[derive(Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording(RecordingSession),
}

impl std::fmt::Debug for RecordingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "Idle"),
            RecordingState::Recording(session) => write!(
                f,
                "Recording {{ format: {}, fragments: {} }}",
                session.format,
                session.fragments.len()
            ),
        }
    }
}

impl RecordingState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording(_))
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording(session) => Some(session),
        }
    }

    /// Stop recording (returns the previous state)
    pub fn stop(&mut self) -> Self {
        std::mem::replace(self, RecordingState::Idle)
    }
}

/// Records the displayed stream into an encoder
pub struct StreamRecorder {
    backend: Arc<dyn EncoderBackend>,
    preferred_formats: Vec<String>,
    state: RecordingState,
    listener: Option<StateListener>,
}

impl StreamRecorder {
    pub fn new(backend: Arc<dyn EncoderBackend>, preferred_formats: Vec<String>) -> Self {
        Self {
            backend,
            preferred_formats,
            state: RecordingState::Idle,
            listener: None,
        }
    }

    /// Register the owner's recording-state callback
    pub fn set_listener(&mut self, listener: StateListener) {
        self.listener = Some(listener);
    }

    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    fn notify(&self, recording: bool) {
        if let Some(listener) = &self.listener {
            listener(recording);
        }
    }

    /// Start recording what `frame` shows
    ///
    /// Fails with [`RecordingError::NoSupportedFormat`] without creating an
    /// encoder when none of the preferred formats can be encoded.
    pub fn start(&mut self, frame: Option<&CameraFrame>) -> Result<RecordingFormat, RecordingError> {
        if self.state.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }

        let Some(format) = select_format(&self.preferred_formats, self.backend.as_ref()) else {
            warn!(preferred = ?self.preferred_formats, "No supported recording format");
            return Err(RecordingError::NoSupportedFormat);
        };

        let surface = Surface::sized_for(frame);
        let clock = CaptureClock::new(CAPTURE_FPS);
        let encoder =
            self.backend
                .create_encoder(&format, surface.width(), surface.height(), CAPTURE_FPS)?;

        info!(
            format = %format,
            width = surface.width(),
            height = surface.height(),
            fps = CAPTURE_FPS,
            "Recording started"
        );

        self.state = RecordingState::Recording(RecordingSession {
            format: format.clone(),
            encoder,
            surface,
            clock,
            fragments: Vec::new(),
            started_at: Instant::now(),
            frames_captured: 0,
        });
        self.notify(true);

        Ok(format)
    }

    /// One redraw tick
    ///
    /// Draws `frame` onto the surface if the image has finished loading,
    /// then samples the surface when the capture clock is due. An encoder
    /// failure ends the session without saving.
    pub fn animation_frame(
        &mut self,
        frame: Option<&CameraFrame>,
        complete: bool,
        now: Instant,
    ) -> Result<(), RecordingError> {
        let RecordingState::Recording(session) = &mut self.state else {
            return Ok(());
        };

        if complete && let Some(frame) = frame {
            session.surface.draw(frame);
        }

        let Some(timestamp) = session.clock.due(now) else {
            return Ok(());
        };

        if let Err(e) = session.encoder.push_frame(session.surface.image(), timestamp) {
            error!(error = %e, "Recording failed, discarding session");
            self.state.stop();
            self.notify(false);
            return Err(e);
        }
        session.frames_captured += 1;
        session.fragments.extend(session.encoder.take_fragments());

        Ok(())
    }

    /// Stop recording
    ///
    /// A no-op returning `None` unless a session with an active encoder
    /// exists. The returned job flushes the encoder and writes the file.
    pub fn stop(&mut self) -> Option<FinalizeJob> {
        match &self.state {
            RecordingState::Idle => {
                debug!("Stop requested while idle");
                return None;
            }
            RecordingState::Recording(session) if !session.encoder.is_active() => {
                debug!("Stop requested but encoder is inactive");
                return None;
            }
            RecordingState::Recording(_) => {}
        }

        let RecordingState::Recording(mut session) = self.state.stop() else {
            return None;
        };
        session.fragments.extend(session.encoder.take_fragments());

        info!(
            format = %session.format,
            frames = session.frames_captured,
            fragments = session.fragments.len(),
            elapsed_secs = session.started_at.elapsed().as_secs(),
            "Recording stopped"
        );
        self.notify(false);

        Some(FinalizeJob {
            format: session.format,
            encoder: session.encoder,
            fragments: session.fragments,
        })
    }
}

/// Flushes a stopped session into a saved file
///
/// Blocks on the encoder, so run it off the UI loop.
pub struct FinalizeJob {
    format: RecordingFormat,
    encoder: Box<dyn FrameEncoder>,
    fragments: Vec<Bytes>,
}

impl FinalizeJob {
    pub fn format(&self) -> &RecordingFormat {
        &self.format
    }

    pub fn run(self, downloads: &Downloads) -> Result<PathBuf, RecordingError> {
        let mut fragments = self.fragments;
        fragments.extend(self.encoder.finish()?);

        let name = recording_file_name(self.format.name(), Utc::now());
        let path = downloads.save(&name, &fragments)?;
        Ok(path)
    }
}
