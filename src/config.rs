// SPDX-License-Identifier: GPL-3.0-only

//! User configuration persisted as JSON under the config directory

use crate::constants::{
    APP_DIR_NAME, DEFAULT_CAMERA_URL, DEFAULT_CLOCK_FORMAT, DEFAULT_REQUEST_TIMEOUT_SECS,
    RECORDING_FORMATS, endpoints,
};
use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the camera server (e.g. "http://10.0.0.2:5000")
    pub camera_url: String,
    /// Where finished recordings are saved (None = download directory)
    pub recordings_dir: Option<PathBuf>,
    /// Timeout for focus/backlight requests
    pub request_timeout_secs: u64,
    /// chrono format string for the on-screen clock
    pub clock_format: String,
    /// Recording formats to try, most preferred first
    pub preferred_formats: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_url: DEFAULT_CAMERA_URL.to_string(),
            recordings_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            clock_format: DEFAULT_CLOCK_FORMAT.to_string(),
            preferred_formats: RECORDING_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl Config {
    /// Default location: `<config dir>/camera-panel/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from the default location.
    ///
    /// A missing file yields the defaults; an unreadable one is logged and
    /// also yields the defaults so the panel always starts.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents)?;
        config.normalize();
        Ok(config)
    }

    /// Save to the default location
    pub fn save(&self) -> AppResult<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| crate::errors::AppError::Config("No config directory".into()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Replace the camera URL (normalized)
    pub fn with_camera_url(mut self, url: impl Into<String>) -> Self {
        self.camera_url = url.into();
        self.normalize();
        self
    }

    /// Trim trailing slashes and fall back to defaults for empty values
    pub fn normalize(&mut self) {
        let trimmed = self.camera_url.trim().trim_end_matches('/');
        self.camera_url = if trimmed.is_empty() {
            DEFAULT_CAMERA_URL.to_string()
        } else {
            trimmed.to_string()
        };
        if self.clock_format.is_empty() {
            self.clock_format = DEFAULT_CLOCK_FORMAT.to_string();
        }
        if self.preferred_formats.is_empty() {
            self.preferred_formats = RECORDING_FORMATS.iter().map(|f| f.to_string()).collect();
        }
    }

    /// Full URL of the MJPEG feed
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.camera_url, endpoints::VIDEO_FEED)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Directory recordings are written to
    pub fn recordings_dir(&self) -> PathBuf {
        self.recordings_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
