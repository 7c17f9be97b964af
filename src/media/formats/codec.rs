// SPDX-License-Identifier: GPL-3.0-only

//! Recording format names and the codec/container they map to

use std::fmt;

/// Video codecs a recording can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// VP9 (WebM)
    VP9,
    /// VP8 (WebM)
    VP8,
    /// H.264/AVC (MP4)
    H264,
}

impl VideoCodec {
    /// Candidate GStreamer encoder elements, in order of preference
    pub fn encoder_names(&self) -> &'static [&'static str] {
        match self {
            VideoCodec::VP9 => &["vp9enc"],
            VideoCodec::VP8 => &["vp8enc"],
            VideoCodec::H264 => &["x264enc", "openh264enc"],
        }
    }

    /// Parser element placed between encoder and muxer (if needed)
    pub fn parser_name(&self) -> Option<&'static str> {
        match self {
            VideoCodec::VP9 | VideoCodec::VP8 => None,
            VideoCodec::H264 => Some("h264parse"),
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoCodec::VP9 => "VP9",
            VideoCodec::VP8 => "VP8",
            VideoCodec::H264 => "H.264",
        };
        write!(f, "{}", name)
    }
}

/// Container formats for recordings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    WebM,
    MP4,
}

impl ContainerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::MP4 => "mp4",
            ContainerFormat::WebM => "webm",
        }
    }

    pub fn muxer_name(&self) -> &'static str {
        match self {
            ContainerFormat::MP4 => "mp4mux",
            ContainerFormat::WebM => "webmmux",
        }
    }
}

/// A MIME-style recording format such as `video/webm;codecs=vp9`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordingFormat {
    name: String,
    container: ContainerFormat,
    codec: VideoCodec,
}

impl RecordingFormat {
    /// Parse a format name. Returns `None` for names no encoder can produce.
    ///
    /// `video/webm` without a codec parameter records VP8.
    pub fn parse(name: &str) -> Option<Self> {
        let mut parts = name.split(';').map(str::trim);
        let mime = parts.next()?.to_ascii_lowercase();
        let codecs = parts
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("codecs"))
            .map(|(_, value)| value.trim().trim_matches('"').to_ascii_lowercase());

        let (container, codec) = match (mime.as_str(), codecs.as_deref()) {
            ("video/webm", Some("vp9")) => (ContainerFormat::WebM, VideoCodec::VP9),
            ("video/webm", Some("vp8") | None) => (ContainerFormat::WebM, VideoCodec::VP8),
            ("video/mp4", Some("avc1" | "h264") | None) => (ContainerFormat::MP4, VideoCodec::H264),
            _ => return None,
        };

        Some(Self {
            name: name.trim().to_string(),
            container,
            codec,
        })
    }

    /// The format name as given
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> ContainerFormat {
        self.container
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    /// File extension for a saved recording: `mp4` if the name mentions mp4,
    /// `webm` otherwise
    pub fn extension(&self) -> &'static str {
        extension_for(&self.name)
    }
}

impl fmt::Display for RecordingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Extension for a format name
pub fn extension_for(name: &str) -> &'static str {
    if name.contains("mp4") { "mp4" } else { "webm" }
}
