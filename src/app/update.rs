// SPDX-License-Identifier: GPL-3.0-only

//! Message handling for the panel
//!
//! Settings are optimistic only in the sense that they change after the
//! camera confirms: a failed request leaves the previous value in place.

use super::{Message, Notice, Panel};
use tracing::{debug, error, info, warn};

impl Panel {
    /// Apply one message from background work
    pub fn update(&mut self, message: Message) {
        match message {
            Message::Tick => self.refresh_clock(),

            Message::FocusResult { value, result } => match result {
                Ok(()) => {
                    self.settings = self.settings.with_focus(value);
                    info!(value, "Focus updated");
                }
                Err(e) => {
                    warn!(value, error = %e, "Failed to update focus");
                    self.notice = Some(Notice::new(format!("Focus not set: {}", e)));
                }
            },

            Message::BacklightResult { enabled, result } => match result {
                Ok(()) => {
                    self.settings = self.settings.with_backlight(enabled);
                    info!(enabled, "Backlight updated");
                }
                Err(e) => {
                    warn!(enabled, error = %e, "Failed to update backlight");
                    self.notice = Some(Notice::new(format!("Backlight not set: {}", e)));
                }
            },

            Message::Stream(event) => {
                self.stream.handle(event);
            }

            Message::RecordingStateChanged(recording) => {
                debug!(recording, "Recording state changed");
                self.recording = recording;
            }

            Message::RecordingSaved(path) => {
                self.notice = Some(Notice::new(format!("Saved: {}", path.display())));
            }

            Message::RecordingFailed(e) => {
                error!(error = %e, "Failed to save recording");
                self.notice = Some(Notice::new(format!("Recording not saved: {}", e)));
            }
        }
    }
}
