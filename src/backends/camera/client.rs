// SPDX-License-Identifier: GPL-3.0-only

//! HTTP client for the camera's control endpoints

use super::{BacklightStatus, CameraControl, ControlResult};
use crate::constants::{FOCUS_MAX, endpoints};
use crate::errors::CameraError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpCameraClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCameraClient {
    /// Create a client for `base_url` (e.g. "http://10.0.0.2:5000")
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CameraError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CameraError::Network(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of `/set_focus/{value}`
    pub fn focus_url(&self, value: u8) -> String {
        format!("{}{}/{}", self.base_url, endpoints::SET_FOCUS, value)
    }

    /// URL of `/set_backlight/{1|0}`
    pub fn backlight_url(&self, enabled: bool) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            endpoints::SET_BACKLIGHT,
            if enabled { 1 } else { 0 }
        )
    }

    async fn get_ok(&self, url: String) -> ControlResult<reqwest::Response> {
        debug!(url = %url, "Camera request");
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CameraError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl CameraControl for HttpCameraClient {
    fn set_focus(&self, value: u8) -> BoxFuture<'_, ControlResult<()>> {
        async move {
            if value > FOCUS_MAX {
                return Err(CameraError::InvalidFocus(value as u32));
            }
            self.get_ok(self.focus_url(value)).await?;
            Ok(())
        }
        .boxed()
    }

    fn set_backlight(&self, enabled: bool) -> BoxFuture<'_, ControlResult<()>> {
        async move {
            self.get_ok(self.backlight_url(enabled)).await?;
            Ok(())
        }
        .boxed()
    }

    fn backlight_status(&self) -> BoxFuture<'_, ControlResult<BacklightStatus>> {
        async move {
            let url = format!("{}{}", self.base_url, endpoints::GET_BACKLIGHT);
            let response = self.get_ok(url).await?;
            response
                .json::<BacklightStatus>()
                .await
                .map_err(|e| CameraError::InvalidResponse(e.to_string()))
        }
        .boxed()
    }
}
