// SPDX-License-Identifier: GPL-3.0-only

//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use bytes::Bytes;
use camera_panel::app::{Message, Panel, Services};
use camera_panel::backends::camera::{
    BacklightStatus, CameraControl, CameraFrame, ControlResult,
};
use camera_panel::backends::stream::{EventSink, FrameSource, StreamConnection};
use camera_panel::config::Config;
use camera_panel::errors::{CameraError, RecordingError};
use camera_panel::media::encoders::{EncoderBackend, FrameEncoder};
use camera_panel::media::formats::RecordingFormat;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Focus(u8),
    Backlight(bool),
    Status,
}

/// Records every request; answers `Status(500)` while `failing` is set
#[derive(Default)]
pub struct MockCamera {
    pub calls: Mutex<Vec<Call>>,
    pub failing: AtomicBool,
}

impl MockCamera {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn answer(&self, call: Call) -> ControlResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            Err(CameraError::Status(500))
        } else {
            Ok(())
        }
    }
}

impl CameraControl for MockCamera {
    fn set_focus(&self, value: u8) -> BoxFuture<'_, ControlResult<()>> {
        let result = self.answer(Call::Focus(value));
        async move { result }.boxed()
    }

    fn set_backlight(&self, enabled: bool) -> BoxFuture<'_, ControlResult<()>> {
        let result = self.answer(Call::Backlight(enabled));
        async move { result }.boxed()
    }

    fn backlight_status(&self) -> BoxFuture<'_, ControlResult<BacklightStatus>> {
        let result = self.answer(Call::Status).map(|()| BacklightStatus {
            backlight_enabled: true,
        });
        async move { result }.boxed()
    }
}

/// Counts connections; events are injected by the test through the panel
#[derive(Default)]
pub struct MockFrames {
    pub connects: Mutex<Vec<(String, u64)>>,
}

impl MockFrames {
    pub fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }

    /// Generation of the most recent connection
    pub fn last_generation(&self) -> u64 {
        self.connects
            .lock()
            .unwrap()
            .last()
            .map(|(_, generation)| *generation)
            .unwrap_or(0)
    }
}

impl FrameSource for MockFrames {
    fn connect(&self, url: &str, generation: u64, _sink: EventSink) -> StreamConnection {
        self.connects
            .lock()
            .unwrap()
            .push((url.to_string(), generation));
        StreamConnection::detached(generation)
    }
}

/// Encoder backend supporting a fixed set of format names
#[derive(Default)]
pub struct MockEncoders {
    pub supported: Vec<&'static str>,
    pub creates: AtomicUsize,
    pub fail_push: bool,
}

impl MockEncoders {
    pub fn supporting(supported: &[&'static str]) -> Self {
        Self {
            supported: supported.to_vec(),
            ..Default::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

impl EncoderBackend for MockEncoders {
    fn is_supported(&self, format: &RecordingFormat) -> bool {
        self.supported.contains(&format.name())
    }

    fn create_encoder(
        &self,
        _format: &RecordingFormat,
        width: u32,
        height: u32,
        _fps: u32,
    ) -> Result<Box<dyn FrameEncoder>, RecordingError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockEncoder {
            header: Bytes::from(format!("HDR{}x{}", width, height)),
            frames: 0,
            pending: Vec::new(),
            fail_push: self.fail_push,
        }))
    }
}

/// Emits a header, one byte per frame, and a trailer on finish
pub struct MockEncoder {
    header: Bytes,
    frames: usize,
    pending: Vec<Bytes>,
    fail_push: bool,
}

impl FrameEncoder for MockEncoder {
    fn push_frame(
        &mut self,
        _frame: &image::RgbaImage,
        _timestamp: Duration,
    ) -> Result<(), RecordingError> {
        if self.fail_push {
            return Err(RecordingError::PipelineError("encoder crashed".into()));
        }
        if self.frames == 0 {
            self.pending.push(self.header.clone());
        }
        self.frames += 1;
        self.pending.push(Bytes::from_static(b"F"));
        Ok(())
    }

    fn take_fragments(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.pending)
    }

    fn is_active(&self) -> bool {
        true
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<Bytes>, RecordingError> {
        let mut rest = std::mem::take(&mut self.pending);
        rest.push(Bytes::from_static(b"END"));
        Ok(rest)
    }
}

pub struct Harness {
    pub panel: Panel,
    pub messages: UnboundedReceiver<Message>,
    pub camera: Arc<MockCamera>,
    pub frames: Arc<MockFrames>,
    pub encoders: Arc<MockEncoders>,
}

impl Harness {
    pub fn new(recordings_dir: &Path, encoders: MockEncoders) -> Self {
        let camera = Arc::new(MockCamera::default());
        let frames = Arc::new(MockFrames::default());
        let encoders = Arc::new(encoders);

        let mut config = Config::default();
        config.recordings_dir = Some(recordings_dir.to_path_buf());

        let services = Services {
            camera: camera.clone(),
            frames: frames.clone(),
            encoders: encoders.clone(),
        };
        let (panel, messages) = Panel::new(config, services);
        Self {
            panel,
            messages,
            camera,
            frames,
            encoders,
        }
    }

    /// Apply every queued message, returning those that are not clock ticks
    pub fn drain(&mut self) -> Vec<String> {
        let mut seen = Vec::new();
        while let Ok(message) = self.messages.try_recv() {
            if !matches!(message, Message::Tick) {
                seen.push(format!("{:?}", message));
            }
            self.panel.update(message);
        }
        seen
    }

    /// Wait for the next non-tick message and apply it
    pub async fn next(&mut self) -> String {
        loop {
            let message = self
                .messages
                .recv()
                .await
                .expect("panel dropped its sender");
            if matches!(message, Message::Tick) {
                self.panel.update(message);
                continue;
            }
            let text = format!("{:?}", message);
            self.panel.update(message);
            return text;
        }
    }
}

pub fn test_frame(width: u32, height: u32) -> Arc<CameraFrame> {
    Arc::new(CameraFrame::from_rgba(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([200, 40, 40, 255]),
    )))
}

/// `camera_feed_YYYY-MM-DDTHH-MM-SS-mmmZ.(webm|mp4)`
pub fn is_recording_file_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("camera_feed_") else {
        return false;
    };
    let Some(stamp) = rest
        .strip_suffix(".webm")
        .or_else(|| rest.strip_suffix(".mp4"))
    else {
        return false;
    };
    let pattern = "dddd-dd-ddTdd-dd-dd-dddZ";
    stamp.len() == pattern.len()
        && stamp.chars().zip(pattern.chars()).all(|(c, p)| match p {
            'd' => c.is_ascii_digit(),
            other => c == other,
        })
}
