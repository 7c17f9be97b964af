// SPDX-License-Identifier: GPL-3.0-only

//! Capture surface and capture clock
//!
//! While recording, the displayed image is copied onto a fixed-size RGBA
//! surface every animation frame, and the surface is sampled at a fixed
//! frame rate for the encoder.

use crate::backends::camera::CameraFrame;
use crate::constants::{FALLBACK_SURFACE_HEIGHT, FALLBACK_SURFACE_WIDTH};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::time::{Duration, Instant};

/// Drawing surface the recorder samples from
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Blank surface; zero dimensions fall back to 640x480
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = if width == 0 || height == 0 {
            (FALLBACK_SURFACE_WIDTH, FALLBACK_SURFACE_HEIGHT)
        } else {
            (width, height)
        };
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Surface matching the natural size of `frame`
    pub fn sized_for(frame: Option<&CameraFrame>) -> Self {
        match frame {
            Some(frame) => Self::new(frame.width, frame.height),
            None => Self::new(0, 0),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Copy `frame` onto the whole surface, scaling if the sizes differ
    pub fn draw(&mut self, frame: &CameraFrame) -> bool {
        let Some(source) = frame.as_image() else {
            return false;
        };

        if source.dimensions() == self.image.dimensions() {
            self.image.copy_from_slice(source.as_raw());
        } else {
            self.image = imageops::resize(
                &source,
                self.image.width(),
                self.image.height(),
                FilterType::Triangle,
            );
        }
        true
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Decides when the surface is sampled for the encoder
///
/// Captures follow a fixed schedule of one deadline per interval, counted
/// from the first capture, so a redraw loop running at any faster rate
/// yields the full frame rate. After a stall the schedule restarts at the
/// late capture instead of bursting through the missed deadlines.
#[derive(Debug, Clone)]
pub struct CaptureClock {
    interval: Duration,
    schedule: Option<Schedule>,
}

#[derive(Debug, Clone, Copy)]
struct Schedule {
    origin: Instant,
    next: Instant,
}

impl CaptureClock {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            schedule: None,
        }
    }

    /// Timestamp of the capture due at `now`, relative to the first capture
    ///
    /// The first call always captures, at zero.
    pub fn due(&mut self, now: Instant) -> Option<Duration> {
        let Some(schedule) = &mut self.schedule else {
            self.schedule = Some(Schedule {
                origin: now,
                next: now + self.interval,
            });
            return Some(Duration::ZERO);
        };
        if now < schedule.next {
            return None;
        }

        schedule.next += self.interval;
        if schedule.next <= now {
            schedule.next = now + self.interval;
        }
        Some(now.saturating_duration_since(schedule.origin))
    }
}
