// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera backend

use crate::constants::{DEFAULT_BACKLIGHT_ENABLED, DEFAULT_FOCUS, FOCUS_MAX, FOCUS_MIN};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Device settings shown by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSettings {
    /// Focus level, 0..=100
    pub focus: u8,
    /// Backlight compensation on/off
    pub backlight_enabled: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            focus: DEFAULT_FOCUS,
            backlight_enabled: DEFAULT_BACKLIGHT_ENABLED,
        }
    }
}

impl CameraSettings {
    pub fn with_focus(self, focus: u8) -> Self {
        Self { focus, ..self }
    }

    pub fn with_backlight(self, backlight_enabled: bool) -> Self {
        Self {
            backlight_enabled,
            ..self
        }
    }
}

/// Clamp an arbitrary integer into the focus range
pub fn clamp_focus(value: i32) -> u8 {
    value.clamp(FOCUS_MIN as i32, FOCUS_MAX as i32) as u8
}

/// Response body of `/get_backlight`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BacklightStatus {
    pub backlight_enabled: bool,
}

/// A decoded frame from the video feed, always tightly packed RGBA
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    /// When the part finished decoding
    pub captured_at: Instant,
}

impl CameraFrame {
    pub fn from_rgba(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw().into(),
            captured_at: Instant::now(),
        }
    }

    /// Decode a JPEG (or any format `image` recognises) into an RGBA frame
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_rgba(image.to_rgba8()))
    }

    /// Row stride in bytes
    pub fn stride(&self) -> u32 {
        self.width * 4
    }

    /// RGB at (x, y), clamped to the frame
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride() + x * 4) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }

    /// Borrow as an `image` view for scaling/copying
    pub fn as_image(&self) -> Option<image::ImageBuffer<image::Rgba<u8>, &[u8]>> {
        image::ImageBuffer::from_raw(self.width, self.height, &self.data[..])
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}
