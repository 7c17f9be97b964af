// SPDX-License-Identifier: GPL-3.0-only

//! Format and codec utilities
//!
//! Recording formats are named the way media APIs name them
//! (`video/webm;codecs=vp9`). This module maps those names to a codec and a
//! container.

pub mod codec;

pub use codec::{ContainerFormat, RecordingFormat, VideoCodec, extension_for};
