// SPDX-License-Identifier: GPL-3.0-only

//! Live stream display with automatic reload
//!
//! Keeps the displayed source equal to the configured feed URL. Every load
//! error shows [`STREAM_ERROR_BANNER`] and schedules one reload after
//! [`STREAM_RETRY_DELAY`]; a successful load clears the banner. Retries are
//! not merged, so overlapping errors each get their own reload.
//!
//! Connections are tagged with a generation and retries with an epoch.
//! Unmounting or changing the URL bumps both, so late events from a
//! replaced connection or a cancelled retry are dropped.

use super::task::ScheduledTask;
use crate::backends::camera::CameraFrame;
use crate::backends::stream::{EventSink, FrameSource, StreamConnection, StreamEvent};
use crate::constants::{STREAM_ERROR_BANNER, STREAM_RETRY_DELAY};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StreamDisplay {
    url: String,
    source: Option<String>,
    frame: Option<Arc<CameraFrame>>,
    complete: bool,
    error: Option<String>,
    connection: Option<StreamConnection>,
    retries: Vec<ScheduledTask>,
    generation: u64,
    epoch: u64,
    mounted: bool,
    frame_source: Arc<dyn FrameSource>,
    sink: EventSink,
}

impl StreamDisplay {
    /// `sink` receives the events of every connection this display opens
    pub fn new(url: impl Into<String>, frame_source: Arc<dyn FrameSource>, sink: EventSink) -> Self {
        Self {
            url: url.into(),
            source: None,
            frame: None,
            complete: false,
            error: None,
            connection: None,
            retries: Vec::new(),
            generation: 0,
            epoch: 0,
            mounted: false,
            frame_source,
            sink,
        }
    }

    /// Start showing the feed
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.load();
    }

    /// Stop showing the feed: drop the connection and pending reloads
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.detach();
        debug!(url = %self.url, "Stream display unmounted");
    }

    /// Switch to a different feed URL
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if url == self.url {
            return;
        }
        info!(from = %self.url, to = %url, "Stream URL changed");
        self.url = url;
        if self.mounted {
            self.detach();
            self.load();
        }
    }

    /// Apply an event from a connection or a retry timer
    ///
    /// Returns false if the event was stale and ignored.
    pub fn handle(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::Loaded { generation, frame } => {
                if !self.is_current(generation) {
                    return false;
                }
                self.frame = Some(frame);
                self.complete = true;
                if self.error.take().is_some() {
                    info!(url = %self.url, "Video stream recovered");
                }
                true
            }
            StreamEvent::Failed { generation, error } => {
                if !self.is_current(generation) {
                    return false;
                }
                warn!(url = %self.url, error = %error, "Failed to load video stream");
                self.complete = false;
                self.error = Some(STREAM_ERROR_BANNER.to_string());
                self.schedule_retry();
                true
            }
            StreamEvent::RetryDue { epoch } => {
                if !self.mounted || epoch != self.epoch {
                    debug!(epoch, current = self.epoch, "Ignoring cancelled retry");
                    return false;
                }
                debug!(url = %self.url, "Reloading video stream");
                self.load();
                true
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL currently assigned to the display, `None` while unmounted
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Banner text while the stream is failing
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_frame(&self) -> Option<&Arc<CameraFrame>> {
        self.frame.as_ref()
    }

    /// True while the latest load of the current connection succeeded
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Reloads scheduled and not yet run
    pub fn pending_retries(&self) -> usize {
        self.retries.iter().filter(|task| !task.is_finished()).count()
    }

    fn is_current(&self, generation: u64) -> bool {
        if !self.mounted || generation != self.generation {
            debug!(generation, current = self.generation, "Ignoring stale stream event");
            return false;
        }
        true
    }

    fn load(&mut self) {
        self.generation += 1;
        self.complete = false;
        self.source = Some(self.url.clone());
        // Replacing the handle closes the previous connection
        self.connection = Some(
            self.frame_source
                .connect(&self.url, self.generation, self.sink.clone()),
        );
    }

    fn schedule_retry(&mut self) {
        self.retries.retain(|task| !task.is_finished());

        let epoch = self.epoch;
        let sink = self.sink.clone();
        self.retries.push(ScheduledTask::once(STREAM_RETRY_DELAY, move || {
            sink(StreamEvent::RetryDue { epoch })
        }));
        debug!(pending = self.retries.len(), "Stream reload scheduled");
    }

    fn detach(&mut self) {
        self.epoch += 1;
        self.generation += 1;
        for task in self.retries.drain(..) {
            task.cancel();
        }
        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }
        self.source = None;
        self.complete = false;
    }
}

impl Drop for StreamDisplay {
    fn drop(&mut self) {
        self.detach();
    }
}
