// SPDX-License-Identifier: GPL-3.0-only

//! Camera control panel
//!
//! [`Panel`] owns everything the user sees: the confirmed camera settings,
//! the clock string, the stream display and the recorder. It is driven by a
//! single UI loop through [`Panel::update`] and [`Panel::animation_frame`];
//! background work (HTTP requests, timers, stream connections, saving)
//! reports back with [`Message`]s on the channel returned by [`Panel::new`].
//!
//! # Architecture
//!
//! - `state`: Messages and transient UI state
//! - `stream`: Stream display with automatic reload
//! - `controls`: Focus slider and backlight toggle
//! - `task`: Cancellable timers
//! - `update`: Message handling

pub mod controls;
pub mod state;
pub mod stream;
pub mod task;
mod update;

pub use controls::{ControlEvent, ControlsView};
pub use state::{Message, Notice};
pub use stream::StreamDisplay;
pub use task::ScheduledTask;

use crate::backends::camera::{CameraControl, CameraSettings, HttpCameraClient};
use crate::backends::stream::{EventSink, FrameSource, HttpFrameSource};
use crate::config::Config;
use crate::constants::{CLOCK_TICK, DEFAULT_CLOCK_FORMAT};
use crate::errors::{AppResult, RecordingError};
use crate::media::encoders::{EncoderBackend, GstEncoderBackend};
use crate::pipelines::video::{FinalizeJob, StreamRecorder};
use crate::storage::Downloads;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// External collaborators of the panel
#[derive(Clone)]
pub struct Services {
    pub camera: Arc<dyn CameraControl>,
    pub frames: Arc<dyn FrameSource>,
    pub encoders: Arc<dyn EncoderBackend>,
}

impl Services {
    /// HTTP camera, HTTP feed and GStreamer encoders
    pub fn production(config: &Config) -> AppResult<Self> {
        let camera = HttpCameraClient::new(&config.camera_url, config.request_timeout())?;
        Ok(Self {
            camera: Arc::new(camera),
            frames: Arc::new(HttpFrameSource::new(config.request_timeout())?),
            encoders: Arc::new(GstEncoderBackend::new()),
        })
    }
}

/// Format `now` with a chrono format string, falling back to the default
/// format if the string is invalid
pub fn format_clock<Tz: TimeZone>(format: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", now.format(format)).is_err() {
        out.clear();
        let _ = write!(out, "{}", now.format(DEFAULT_CLOCK_FORMAT));
    }
    out
}

pub struct Panel {
    config: Config,
    settings: CameraSettings,
    timestamp: String,
    camera: Arc<dyn CameraControl>,
    stream: StreamDisplay,
    recorder: StreamRecorder,
    downloads: Downloads,
    sender: UnboundedSender<Message>,
    clock: Option<ScheduledTask>,
    recording: bool,
    alert: Option<String>,
    notice: Option<Notice>,
    pending_saves: Vec<JoinHandle<()>>,
}

impl Panel {
    /// Build a panel with default settings
    ///
    /// Nothing runs until [`Panel::mount`].
    pub fn new(config: Config, services: Services) -> (Self, UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        let stream_sender = sender.clone();
        let sink: EventSink = Arc::new(move |event| {
            let _ = stream_sender.send(Message::Stream(event));
        });
        let stream = StreamDisplay::new(config.stream_url(), services.frames, sink);

        let mut recorder = StreamRecorder::new(services.encoders, config.preferred_formats.clone());
        let recording_sender = sender.clone();
        recorder.set_listener(Box::new(move |recording| {
            let _ = recording_sender.send(Message::RecordingStateChanged(recording));
        }));

        let downloads = Downloads::new(config.recordings_dir());
        let timestamp = format_clock(&config.clock_format, &Local::now());

        let panel = Self {
            config,
            settings: CameraSettings::default(),
            timestamp,
            camera: services.camera,
            stream,
            recorder,
            downloads,
            sender,
            clock: None,
            recording: false,
            alert: None,
            notice: None,
            pending_saves: Vec::new(),
        };
        (panel, receiver)
    }

    /// Start the clock and the stream
    pub fn mount(&mut self) {
        info!(camera = %self.config.camera_url, "Mounting panel");
        self.refresh_clock();

        let sender = self.sender.clone();
        self.clock = Some(ScheduledTask::repeating(CLOCK_TICK, move || {
            let _ = sender.send(Message::Tick);
        }));
        self.stream.mount();
    }

    /// Stop timers and the stream; an active recording is stopped and saved
    pub fn unmount(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.cancel();
        }
        self.stream.unmount();
        if let Some(job) = self.recorder.stop() {
            self.finalize(job);
        }
        info!("Panel unmounted");
    }

    /// Ask the camera for a new focus level
    ///
    /// Local settings change once the request succeeds.
    pub fn set_focus(&self, value: u8) {
        let camera = self.camera.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = camera.set_focus(value).await;
            let _ = sender.send(Message::FocusResult { value, result });
        });
    }

    /// Ask the camera to switch backlight compensation
    pub fn set_backlight(&self, enabled: bool) {
        let camera = self.camera.clone();
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let result = camera.set_backlight(enabled).await;
            let _ = sender.send(Message::BacklightResult { enabled, result });
        });
    }

    /// Forward a control change to the camera
    pub fn handle_control(&self, event: ControlEvent) {
        match event {
            ControlEvent::FocusChanged(value) => self.set_focus(value),
            ControlEvent::BacklightToggled(enabled) => self.set_backlight(enabled),
        }
    }

    /// Start recording if idle, otherwise stop and save
    pub fn toggle_recording(&mut self) {
        if self.recorder.is_recording() {
            self.stop_recording();
        } else {
            self.start_recording();
        }
    }

    pub fn start_recording(&mut self) {
        let frame = self.stream.current_frame().map(Arc::as_ref);
        match self.recorder.start(frame) {
            Ok(format) => info!(format = %format, "Recording"),
            Err(RecordingError::AlreadyRecording) => {}
            Err(e) => {
                error!(error = %e, "Failed to start recording");
                self.alert = Some(e.to_string());
            }
        }
    }

    pub fn stop_recording(&mut self) {
        if let Some(job) = self.recorder.stop() {
            self.finalize(job);
        }
    }

    /// One redraw of the UI loop
    pub fn animation_frame(&mut self, now: Instant) {
        let frame = self.stream.current_frame().map(Arc::as_ref);
        if let Err(e) = self
            .recorder
            .animation_frame(frame, self.stream.is_complete(), now)
        {
            self.notice = Some(Notice::new(format!("Recording failed: {}", e)));
        }
    }

    fn finalize(&mut self, job: FinalizeJob) {
        self.pending_saves.retain(|handle| !handle.is_finished());

        let downloads = self.downloads.clone();
        let sender = self.sender.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let message = match job.run(&downloads) {
                Ok(path) => Message::RecordingSaved(path),
                Err(e) => Message::RecordingFailed(e),
            };
            let _ = sender.send(message);
        });
        self.pending_saves.push(handle);
    }

    fn refresh_clock(&mut self) {
        self.timestamp = format_clock(&self.config.clock_format, &Local::now());
    }

    /// Saves still being written; await them before exiting
    pub fn take_pending_saves(&mut self) -> Vec<JoinHandle<()>> {
        std::mem::take(&mut self.pending_saves)
    }

    /// Last settings the camera confirmed
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn stream(&self) -> &StreamDisplay {
        &self.stream
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    /// Recording state as last reported to the panel
    pub fn recording_indicator(&self) -> bool {
        self.recording
    }

    /// Blocking alert awaiting dismissal
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Current status line notice, if not expired
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|notice| !notice.is_expired())
            .map(Notice::text)
    }
}
