//! Frame ingestion sources.
//!
//! This module provides different sources for raw frames:
//! - Synthetic streams (`stub://`, always available; tests and the demo)
//! - HTTP MJPEG / JPEG snapshot streams (feature: ingest-http)
//! - RTSP streams (feature: rtsp-gstreamer)
//!
//! All sources produce `Frame` instances that flow into the camera's
//! latest-frame slot. The ingestion layer is responsible for:
//! - Decoding frames in-memory
//! - Rate limiting / frame decimation
//!
//! The ingestion layer makes no motion decisions; those live entirely on
//! the consumer side of the slot.

mod camera;
#[cfg(feature = "ingest-http")]
pub mod http;
#[cfg(feature = "rtsp-gstreamer")]
pub mod rtsp;
mod synthetic;

pub use camera::{Camera, CameraStats, DEFAULT_TARGET_FPS};
#[cfg(feature = "ingest-http")]
pub use http::{HttpConfig, HttpSource};
#[cfg(feature = "rtsp-gstreamer")]
pub use rtsp::{RtspConfig, RtspSource};
pub use synthetic::{SyntheticConfig, SyntheticSource};

use anyhow::{anyhow, Result};
use std::time::Duration;

use crate::frame::Frame;

/// A capture device yielding decoded frames.
///
/// Implementations hold their device/network handle open for the lifetime
/// of the acquisition thread. `next_frame` may block on the device; no
/// per-read timeout is imposed by the caller.
pub trait FrameCapture: Send {
    /// Establish the device/network connection.
    fn connect(&mut self) -> Result<()>;

    /// Decode the next frame from the stream.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Whether the source is currently producing frames at a healthy rate.
    fn is_healthy(&self) -> bool;

    /// The URI this source was opened for.
    fn source_uri(&self) -> &str;
}

/// Open a capture backend for a source URI, dispatching on the scheme.
pub fn open_source(uri: &str, target_fps: u32) -> Result<Box<dyn FrameCapture>> {
    if uri.starts_with("stub://") {
        let config = SyntheticConfig {
            uri: uri.to_string(),
            ..SyntheticConfig::default()
        };
        return Ok(Box::new(SyntheticSource::new(config)));
    }
    if uri.starts_with("rtsp://") {
        return open_rtsp(uri, target_fps);
    }
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return open_http(uri, target_fps);
    }
    Err(anyhow!(
        "unsupported source uri '{}'; expected stub://, rtsp:// or http(s)://",
        uri
    ))
}

#[cfg(feature = "rtsp-gstreamer")]
fn open_rtsp(uri: &str, target_fps: u32) -> Result<Box<dyn FrameCapture>> {
    let config = RtspConfig {
        url: uri.to_string(),
        target_fps,
    };
    Ok(Box::new(RtspSource::new(config)?))
}

#[cfg(not(feature = "rtsp-gstreamer"))]
fn open_rtsp(_uri: &str, _target_fps: u32) -> Result<Box<dyn FrameCapture>> {
    Err(anyhow!("rtsp sources require the rtsp-gstreamer feature"))
}

#[cfg(feature = "ingest-http")]
fn open_http(uri: &str, target_fps: u32) -> Result<Box<dyn FrameCapture>> {
    let config = HttpConfig {
        url: uri.to_string(),
        target_fps,
    };
    Ok(Box::new(HttpSource::new(config)?))
}

#[cfg(not(feature = "ingest-http"))]
fn open_http(_uri: &str, _target_fps: u32) -> Result<Box<dyn FrameCapture>> {
    Err(anyhow!("http sources require the ingest-http feature"))
}

pub(crate) fn frame_interval(target_fps: u32) -> Duration {
    if target_fps == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis((1000 / target_fps).max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_source_dispatches_stub_scheme() {
        let source = open_source("stub://test", 10).expect("stub source");
        assert_eq!(source.source_uri(), "stub://test");
    }

    #[test]
    fn open_source_rejects_unknown_scheme() {
        assert!(open_source("ftp://camera", 10).is_err());
        assert!(open_source("front_camera", 10).is_err());
    }
}
