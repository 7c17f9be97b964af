// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Default base URL of the camera server
pub const DEFAULT_CAMERA_URL: &str = "http://10.0.0.2:5000";

/// Remote endpoints exposed by the camera server
pub mod endpoints {
    /// Continuous `multipart/x-mixed-replace` JPEG feed
    pub const VIDEO_FEED: &str = "/video_feed";
    /// `/set_focus/{value}`
    pub const SET_FOCUS: &str = "/set_focus";
    /// `/set_backlight/{0|1}`
    pub const SET_BACKLIGHT: &str = "/set_backlight";
    /// Returns `{"backlight_enabled": bool}`
    pub const GET_BACKLIGHT: &str = "/get_backlight";
}

/// Focus slider bounds
pub const FOCUS_MIN: u8 = 0;
pub const FOCUS_MAX: u8 = 100;
pub const FOCUS_STEP: u8 = 1;

/// Settings every panel starts with
pub const DEFAULT_FOCUS: u8 = 30;
pub const DEFAULT_BACKLIGHT_ENABLED: bool = true;

/// Delay before an errored stream is reloaded (fixed, no backoff)
pub const STREAM_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Banner shown while the stream is failing
pub const STREAM_ERROR_BANNER: &str = "Failed to load video stream. Retrying...";

/// Multipart boundary assumed when the server does not announce one
pub const DEFAULT_MULTIPART_BOUNDARY: &str = "frame";

/// Upper bound for a single buffered multipart part (guards against a
/// stream that never emits a boundary)
pub const MAX_PART_SIZE: usize = 16 * 1024 * 1024;

/// Clock refresh period
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Default chrono format for the on-screen clock
pub const DEFAULT_CLOCK_FORMAT: &str = "%-I:%M:%S %p";

/// Frame rate of the capture stream fed to the encoder
pub const CAPTURE_FPS: u32 = 30;

/// Surface size used when the displayed image has no dimensions yet
pub const FALLBACK_SURFACE_WIDTH: u32 = 640;
pub const FALLBACK_SURFACE_HEIGHT: u32 = 480;

/// Recording formats in preference order
pub const RECORDING_FORMATS: [&str; 4] = [
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/webm",
    "video/mp4",
];

/// Prefix of saved recordings
pub const RECORDING_FILE_PREFIX: &str = "camera_feed_";

/// Default timeout for control requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Terminal redraw interval (one animation frame)
pub const ANIMATION_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How long setting-failure notices stay in the status line
pub const NOTICE_DURATION: Duration = Duration::from_secs(4);

/// Application directory name under the user's config/cache dirs
pub const APP_DIR_NAME: &str = "camera-panel";
