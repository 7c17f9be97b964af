// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer element detection
//!
//! Finds out which of the encoders and muxers a recording needs are
//! installed.

use crate::media::formats::{ContainerFormat, VideoCodec};
use gstreamer as gst;
use tracing::{debug, info};

/// Check if a specific GStreamer element is available
pub fn is_element_available(element_name: &str) -> bool {
    gst::init().ok();
    gst::ElementFactory::find(element_name).is_some()
}

/// First installed encoder element for `codec`
pub fn find_encoder(codec: VideoCodec) -> Option<&'static str> {
    codec
        .encoder_names()
        .iter()
        .copied()
        .find(|name| is_element_available(name))
}

/// Detect the installed encoder elements for every recording codec
pub fn detect_video_encoders() -> Vec<String> {
    let mut available = Vec::new();

    for codec in [VideoCodec::VP9, VideoCodec::VP8, VideoCodec::H264] {
        for encoder in codec.encoder_names() {
            if is_element_available(encoder) {
                debug!("Video encoder available: {} ({})", encoder, codec);
                available.push(encoder.to_string());
            }
        }
    }

    info!("Detected {} video encoders", available.len());
    available
}

/// Detect the installed muxers
pub fn detect_muxers() -> Vec<String> {
    [ContainerFormat::WebM, ContainerFormat::MP4]
        .iter()
        .map(ContainerFormat::muxer_name)
        .filter(|name| is_element_available(name))
        .map(str::to_string)
        .collect()
}

/// Log the installed encoders and muxers once at startup
pub fn log_available_encoders() {

    info!("Video encoders:");
    for encoder in detect_video_encoders() {
        info!("  ✓ {}", encoder);
    }

    info!("Muxers:");
    for muxer in detect_muxers() {
        info!("  ✓ {}", muxer);
    }
}
