// SPDX-License-Identifier: GPL-3.0-only

//! Video feed client
//!
//! A [`FrameSource`] opens the feed URL and reports what happens through an
//! [`EventSink`]: one [`StreamEvent::Loaded`] per decoded frame, and a single
//! [`StreamEvent::Failed`] when the connection dies. Every connection carries
//! the generation number it was opened with so the consumer can ignore
//! events from connections it has already replaced.

pub mod connection;
pub mod mjpeg;

pub use connection::{HttpFrameSource, StreamConnection};

use crate::backends::camera::CameraFrame;
use crate::errors::StreamError;
use std::sync::Arc;

/// Everything the stream display reacts to
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A frame finished loading
    Loaded {
        generation: u64,
        frame: Arc<CameraFrame>,
    },
    /// The connection failed or ended
    Failed { generation: u64, error: StreamError },
    /// A scheduled reload is due
    RetryDue { epoch: u64 },
}

/// Callback receiving stream events
pub type EventSink = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// Something that can open a video feed
pub trait FrameSource: Send + Sync {
    /// Start loading `url`. Dropping the returned handle halts the fetch.
    fn connect(&self, url: &str, generation: u64, sink: EventSink) -> StreamConnection;
}
