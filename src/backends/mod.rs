// SPDX-License-Identifier: GPL-3.0-only

//! Backend layer talking to the remote camera server
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────────┐  ┌──────────────────┐  │
//! │  │ Camera control  │  │   MJPEG stream   │  │
//! │  │ /set_focus ...  │  │   /video_feed    │  │
//! │  └─────────────────┘  └──────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! - [`camera`]: settings model and the HTTP control client
//! - [`stream`]: multipart JPEG feed client producing decoded frames

pub mod camera;
pub mod stream;
