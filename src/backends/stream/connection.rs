// SPDX-License-Identifier: GPL-3.0-only

//! HTTP MJPEG connections

use super::mjpeg::multipart_parts;
use super::{EventSink, FrameSource, StreamEvent};
use crate::backends::camera::CameraFrame;
use crate::errors::StreamError;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle to one in-flight feed connection
///
/// The fetch task is aborted when the handle is closed or dropped.
#[derive(Debug)]
pub struct StreamConnection {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl StreamConnection {
    pub fn new(generation: u64, task: JoinHandle<()>) -> Self {
        Self {
            generation,
            task: Some(task),
        }
    }

    /// A connection with no background task (used by scripted sources)
    pub fn detached(generation: u64) -> Self {
        Self {
            generation,
            task: None,
        }
    }

    /// Halt the fetch
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "Stream connection closed");
        }
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens feeds over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpFrameSource {
    client: reqwest::Client,
}

impl HttpFrameSource {
    /// Only connecting is bounded by `connect_timeout`; the feed is an
    /// endless response, so reading it has no timeout.
    pub fn new(connect_timeout: Duration) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StreamError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl FrameSource for HttpFrameSource {
    fn connect(&self, url: &str, generation: u64, sink: EventSink) -> StreamConnection {
        let client = self.client.clone();
        let url = url.to_string();
        info!(url = %url, generation, "Connecting to video feed");

        let task = tokio::spawn(async move {
            let error = match read_feed(client, &url, generation, &sink).await {
                Ok(()) => StreamError::Ended,
                Err(e) => e,
            };
            warn!(url = %url, generation, error = %error, "Video feed failed");
            sink(StreamEvent::Failed { generation, error });
        });

        StreamConnection::new(generation, task)
    }
}

async fn read_feed(
    client: reqwest::Client,
    url: &str,
    generation: u64,
    sink: &EventSink,
) -> Result<(), StreamError> {
    let parts = multipart_parts(client, url.to_string());
    futures::pin_mut!(parts);

    let mut decoded: u64 = 0;
    while let Some(part) = parts.next().await {
        let part = part?;
        let frame = tokio::task::spawn_blocking(move || CameraFrame::decode(&part))
            .await
            .map_err(|e| StreamError::Decode(e.to_string()))?
            .map_err(|e| StreamError::Decode(e.to_string()))?;

        decoded += 1;
        if decoded == 1 {
            info!(width = frame.width, height = frame.height, "First frame decoded");
        }
        sink(StreamEvent::Loaded {
            generation,
            frame: Arc::new(frame),
        });
    }

    Ok(())
}
