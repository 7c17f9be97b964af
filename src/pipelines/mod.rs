// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Stream Frame │ ──▶ │  Video Pipeline   │ ──▶ │  WebM / MP4  │
//! │   (RGBA)     │     │  - Surface redraw │     │  Download    │
//! │              │     │  - 30 fps capture │     │              │
//! │              │     │  - GStreamer enc  │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Encoding runs inside GStreamer's own threads; the final flush and file
//! write run in a blocking task so the UI loop keeps redrawing.
//!
//! # Modules
//!
//! - [`video`]: Stream recording state machine, capture surface and clock

pub mod video;
