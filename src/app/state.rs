// SPDX-License-Identifier: GPL-3.0-only

//! Panel messages and transient UI state

use crate::backends::camera::ControlResult;
use crate::backends::stream::StreamEvent;
use crate::constants::NOTICE_DURATION;
use crate::errors::RecordingError;
use std::path::PathBuf;
use std::time::Instant;

/// Everything background work reports back to the panel
#[derive(Debug, Clone)]
pub enum Message {
    /// One-second clock refresh
    Tick,
    /// A focus request finished
    FocusResult {
        value: u8,
        result: ControlResult<()>,
    },
    /// A backlight request finished
    BacklightResult {
        enabled: bool,
        result: ControlResult<()>,
    },
    /// Stream connection or retry event
    Stream(StreamEvent),
    /// The recorder started (`true`) or stopped (`false`)
    RecordingStateChanged(bool),
    /// A finished recording was written
    RecordingSaved(PathBuf),
    /// Finalizing a recording failed
    RecordingFailed(RecordingError),
}

/// Short-lived status line message
#[derive(Debug, Clone)]
pub struct Notice {
    text: String,
    shown_at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            shown_at: Instant::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= NOTICE_DURATION
    }
}
