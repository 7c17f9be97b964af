// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer video encoder
//!
//! Pipeline per recording:
//!
//! ```text
//! appsrc (RGBA) -> videoconvert -> encoder -> [parser] -> muxer -> appsink
//! ```
//!
//! The muxer runs in streamable mode so the appsink receives the container
//! as a sequence of fragments that can be concatenated into a playable file.

use super::detection::{find_encoder, is_element_available};
use super::{EncoderBackend, FrameEncoder};
use crate::errors::RecordingError;
use crate::media::formats::{ContainerFormat, RecordingFormat};
use bytes::Bytes;
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use image::RgbaImage;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Upper bound on waiting for the muxer to drain after end of stream
const FINISH_TIMEOUT_SECS: u64 = 5;

/// Bitrate in kbps scaled by resolution
pub fn bitrate_kbps(width: u32, height: u32) -> u32 {
    let pixels = width * height;
    // 640x480: ~1.2 Mbps, 1080p: ~8 Mbps
    ((pixels as f64 * 0.004) as u32).clamp(500, 50000)
}

/// Encoder backend backed by the local GStreamer installation
#[derive(Debug, Clone, Copy, Default)]
pub struct GstEncoderBackend;

impl GstEncoderBackend {
    pub fn new() -> Self {
        Self
    }
}

impl EncoderBackend for GstEncoderBackend {
    fn is_supported(&self, format: &RecordingFormat) -> bool {
        let codec = format.codec();
        find_encoder(codec).is_some()
            && is_element_available(format.container().muxer_name())
            && codec.parser_name().is_none_or(is_element_available)
    }

    fn create_encoder(
        &self,
        format: &RecordingFormat,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Box<dyn FrameEncoder>, RecordingError> {
        let encoder = GstFrameEncoder::new(format, width, height, fps)?;
        Ok(Box::new(encoder))
    }
}

/// One running recording pipeline
pub struct GstFrameEncoder {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    appsink: gst_app::AppSink,
    width: u32,
    height: u32,
    frame_duration: gst::ClockTime,
    frames_pushed: u64,
    active: bool,
}

impl GstFrameEncoder {
    /// Build and start the pipeline for `format`
    pub fn new(
        format: &RecordingFormat,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self, RecordingError> {
        info!(format = %format, width, height, fps, "Creating recording pipeline");

        gst::init()
            .map_err(|e| RecordingError::PipelineError(format!("GStreamer init failed: {}", e)))?;

        let codec = format.codec();
        let encoder_name =
            find_encoder(codec).ok_or_else(|| RecordingError::EncoderNotAvailable(codec.to_string()))?;

        let pipeline = gst::Pipeline::new();

        let appsrc = make_element("appsrc")?
            .downcast::<gst_app::AppSrc>()
            .map_err(|_| RecordingError::PipelineError("Failed to downcast to AppSrc".into()))?;

        let fps = fps.max(1);
        let video_info =
            gst_video::VideoInfo::builder(gst_video::VideoFormat::Rgba, width, height)
                .fps(gst::Fraction::new(fps as i32, 1))
                .build()
                .map_err(|e| RecordingError::PipelineError(format!("Invalid video info: {}", e)))?;
        let caps = video_info
            .to_caps()
            .map_err(|e| RecordingError::PipelineError(format!("Invalid caps: {}", e)))?;

        appsrc.set_caps(Some(&caps));
        appsrc.set_format(gst::Format::Time);
        appsrc.set_is_live(true);

        let videoconvert = make_element("videoconvert")?;

        let encoder = make_element(encoder_name)?;
        configure_encoder(&encoder, encoder_name, width, height);

        let parser = codec.parser_name().map(make_element).transpose()?;

        let container = format.container();
        let muxer = make_element(container.muxer_name())?;
        configure_muxer(&muxer, container);

        let appsink = make_element("appsink")?
            .dynamic_cast::<gst_app::AppSink>()
            .map_err(|_| RecordingError::PipelineError("Failed to cast to AppSink".into()))?;
        appsink.set_property("sync", false);
        appsink.set_property("emit-signals", false);

        let mut elements: Vec<&gst::Element> = vec![appsrc.upcast_ref(), &videoconvert, &encoder];
        if let Some(ref parser) = parser {
            elements.push(parser);
        }
        elements.push(&muxer);
        elements.push(appsink.upcast_ref());

        pipeline
            .add_many(elements.iter().copied())
            .map_err(|e| RecordingError::PipelineError(format!("Failed to add elements: {}", e)))?;
        gst::Element::link_many(elements.iter().copied())
            .map_err(|e| RecordingError::PipelineError(format!("Failed to link elements: {}", e)))?;

        pipeline.set_state(gst::State::Playing).map_err(|e| {
            RecordingError::PipelineError(format!("Failed to start pipeline: {}", e))
        })?;

        info!(
            encoder = %encoder_name,
            muxer = %container.muxer_name(),
            "Recording pipeline started"
        );

        Ok(Self {
            pipeline,
            appsrc,
            appsink,
            width,
            height,
            frame_duration: gst::ClockTime::from_nseconds(1_000_000_000 / fps as u64),
            frames_pushed: 0,
            active: true,
        })
    }

    fn pull_available(&self, timeout: gst::ClockTime) -> Vec<Bytes> {
        let mut fragments = Vec::new();
        while let Some(sample) = self.appsink.try_pull_sample(timeout) {
            let Some(buffer) = sample.buffer() else {
                continue;
            };
            match buffer.map_readable() {
                Ok(map) => fragments.push(Bytes::copy_from_slice(map.as_slice())),
                Err(e) => warn!(?e, "Failed to map encoded buffer"),
            }
        }
        fragments
    }

    /// First error posted on the pipeline bus, if any
    fn bus_error(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        let msg = bus.pop_filtered(&[gst::MessageType::Error])?;
        match msg.view() {
            gst::MessageView::Error(err) => {
                error!(
                    error = %err.error(),
                    debug = ?err.debug(),
                    source = ?err.src().map(|s| s.name()),
                    "GStreamer error during recording"
                );
                Some(err.error().to_string())
            }
            _ => None,
        }
    }
}

impl FrameEncoder for GstFrameEncoder {
    fn push_frame(&mut self, frame: &RgbaImage, timestamp: Duration) -> Result<(), RecordingError> {
        if !self.active {
            return Err(RecordingError::PipelineError("Encoder is not active".into()));
        }
        if frame.width() != self.width || frame.height() != self.height {
            return Err(RecordingError::PipelineError(format!(
                "Frame size {}x{} doesn't match pipeline {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        if let Some(message) = self.bus_error() {
            self.active = false;
            return Err(RecordingError::PipelineError(message));
        }

        let mut buffer = gst::Buffer::from_slice(frame.as_raw().clone());
        if let Some(buffer_ref) = buffer.get_mut() {
            buffer_ref.set_pts(gst::ClockTime::from_nseconds(timestamp.as_nanos() as u64));
            buffer_ref.set_duration(self.frame_duration);
        }

        self.appsrc.push_buffer(buffer).map_err(|e| {
            self.active = false;
            RecordingError::PipelineError(format!("Failed to push frame: {:?}", e))
        })?;

        self.frames_pushed += 1;
        if self.frames_pushed % 100 == 0 {
            debug!(frames = self.frames_pushed, "Recording frames pushed");
        }
        Ok(())
    }

    fn take_fragments(&mut self) -> Vec<Bytes> {
        self.pull_available(gst::ClockTime::ZERO)
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<Bytes>, RecordingError> {
        info!(frames = self.frames_pushed, "Finishing recording pipeline");
        self.active = false;

        self.appsrc
            .end_of_stream()
            .map_err(|e| RecordingError::PipelineError(format!("Failed to send EOS: {:?}", e)))?;

        // Pull until the appsink reports EOS; the muxer writes its trailer last
        let mut fragments = Vec::new();
        let deadline = std::time::Instant::now()
            + Duration::from_secs(FINISH_TIMEOUT_SECS);
        while !self.appsink.is_eos() && std::time::Instant::now() < deadline {
            fragments.extend(self.pull_available(gst::ClockTime::from_mseconds(100)));
        }
        fragments.extend(self.pull_available(gst::ClockTime::ZERO));

        if !self.appsink.is_eos() {
            warn!("Recording pipeline did not reach end of stream in time");
        }
        let failure = self.bus_error();

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| RecordingError::PipelineError(format!("Failed to stop pipeline: {}", e)))?;

        match failure {
            Some(message) => Err(RecordingError::PipelineError(message)),
            None => Ok(fragments),
        }
    }
}

impl Drop for GstFrameEncoder {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
    }
}

fn make_element(name: &str) -> Result<gst::Element, RecordingError> {
    gst::ElementFactory::make(name)
        .build()
        .map_err(|e| RecordingError::EncoderNotAvailable(format!("{}: {}", name, e)))
}

/// Set a property when the element has it
fn set_if_present(element: &gst::Element, name: &str, value: &str) {
    if element.has_property(name) {
        element.set_property_from_str(name, value);
    }
}

/// Configure encoder for live capture
fn configure_encoder(encoder: &gst::Element, encoder_name: &str, width: u32, height: u32) {
    let bitrate = bitrate_kbps(width, height);

    match encoder_name {
        "vp8enc" | "vp9enc" => {
            set_if_present(encoder, "deadline", "1");
            set_if_present(encoder, "cpu-used", "4");
            set_if_present(encoder, "target-bitrate", &(bitrate * 1000).to_string());
            debug!("Configured {}: realtime, bitrate={} kbps", encoder_name, bitrate);
        }

        "x264enc" => {
            set_if_present(encoder, "speed-preset", "veryfast");
            set_if_present(encoder, "tune", "zerolatency");
            set_if_present(encoder, "bitrate", &bitrate.to_string());
            debug!("Configured x264enc: bitrate={} kbps", bitrate);
        }

        "openh264enc" => {
            set_if_present(encoder, "rate-control", "bitrate");
            set_if_present(encoder, "bitrate", &(bitrate * 1000).to_string());
            set_if_present(encoder, "usage-type", "camera");
            debug!("Configured openh264enc: bitrate={} bps", bitrate * 1000);
        }

        _ => {
            debug!("Unknown encoder type, using default configuration");
        }
    }
}

fn configure_muxer(muxer: &gst::Element, container: ContainerFormat) {
    set_if_present(muxer, "streamable", "true");
    // mp4mux refuses a non-seekable sink unless it writes fragments
    if container == ContainerFormat::MP4 {
        set_if_present(muxer, "fragment-duration", "1000");
    }
}
