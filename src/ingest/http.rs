//! HTTP frame source.
//!
//! This module provides `HttpSource` for ingesting frames from IP pet
//! cameras that stream MJPEG over HTTP or serve single JPEG snapshots.
//!
//! The HTTP source is responsible for:
//! - Connecting to HTTP MJPEG or JPEG snapshot endpoints
//! - Decoding JPEG frames in-memory
//! - Decimating to the target frame rate
//!
//! Connectivity and authentication policy live with the operator; the URL
//! is taken as-is.

use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::time::{Duration, Instant};

use image::GenericImageView;
use url::Url;

use super::{frame_interval, FrameCapture};
use crate::frame::Frame;

const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;

/// Configuration for an HTTP source.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// Stream URL. Supported schemes: http(s):// for MJPEG or JPEG.
    pub url: String,
    /// Target frame rate. The source decimates to this rate.
    pub target_fps: u32,
}

/// HTTP frame source for MJPEG streams and JPEG snapshot endpoints.
pub struct HttpSource {
    config: HttpConfig,
    stream: Option<HttpStream>,
    last_frame_at: Option<Instant>,
    connected_at: Option<Instant>,
}

enum HttpStream {
    Mjpeg(MjpegStream),
    SingleJpeg,
}

impl HttpSource {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let url = Url::parse(&config.url).context("parse http source url")?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported http source scheme '{}'; expected http or https",
                    other
                ))
            }
        }
        Ok(Self {
            config,
            stream: None,
            last_frame_at: None,
            connected_at: None,
        })
    }

    fn health_grace(&self) -> Duration {
        let base_ms = if self.config.target_fps == 0 {
            2_000
        } else {
            (1000 / self.config.target_fps).saturating_mul(6)
        };
        Duration::from_millis(base_ms.max(2_000) as u64)
    }
}

impl FrameCapture for HttpSource {
    fn connect(&mut self) -> Result<()> {
        let response = ureq::get(&self.config.url)
            .call()
            .context("connect to http camera stream")?;
        let content_type = response.header("Content-Type").unwrap_or("");
        if content_type.to_lowercase().contains("multipart") {
            let reader = response.into_reader();
            self.stream = Some(HttpStream::Mjpeg(MjpegStream::new(reader)));
        } else {
            self.stream = Some(HttpStream::SingleJpeg);
        }
        self.connected_at = Some(Instant::now());
        log::info!("HttpSource: connected to {}", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow!("http source not connected; call connect() first"))?;
        let min_interval = frame_interval(self.config.target_fps);
        loop {
            let jpeg_bytes = match stream {
                HttpStream::Mjpeg(stream) => stream.read_next_jpeg(),
                HttpStream::SingleJpeg => fetch_single_jpeg(&self.config.url),
            }?;

            let now = Instant::now();
            if let Some(last) = self.last_frame_at {
                if now.duration_since(last) < min_interval {
                    continue;
                }
            }

            let frame = decode_jpeg(&jpeg_bytes)?;
            self.last_frame_at = Some(now);
            return Ok(frame);
        }
    }

    fn is_healthy(&self) -> bool {
        let Some(connected_at) = self.connected_at else {
            return false;
        };
        let Some(last_frame_at) = self.last_frame_at else {
            return connected_at.elapsed() <= Duration::from_secs(5);
        };
        last_frame_at.elapsed() <= self.health_grace()
    }

    fn source_uri(&self) -> &str {
        &self.config.url
    }
}

struct MjpegStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl MjpegStream {
    fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    fn read_next_jpeg(&mut self) -> Result<Vec<u8>> {
        let mut chunk = vec![0u8; 8192];
        loop {
            if let Some((start, end)) = find_jpeg_bounds(&self.buffer) {
                let frame = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(frame);
            }

            let read = self.reader.read(&mut chunk).context("read mjpeg chunk")?;
            if read == 0 {
                return Err(anyhow!("mjpeg stream ended"));
            }
            self.buffer.extend_from_slice(&chunk[..read]);

            // A buffer without a complete frame past this point is garbage;
            // keep only the tail so the marker scan stays bounded.
            if self.buffer.len() > MAX_JPEG_BYTES * 2 {
                let keep = 2.min(self.buffer.len());
                let drain_len = self.buffer.len() - keep;
                self.buffer.drain(..drain_len);
            }
        }
    }
}

fn fetch_single_jpeg(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("fetch jpeg snapshot from {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .context("read jpeg snapshot")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty jpeg snapshot"));
    }
    Ok(bytes)
}

fn decode_jpeg(bytes: &[u8]) -> Result<Frame> {
    let image = image::load_from_memory(bytes).context("decode jpeg")?;
    let (width, height) = image.dimensions();
    let rgb = image.into_rgb8();
    Frame::new(rgb.into_raw(), width, height)
}

/// Locate one complete JPEG (SOI..EOI) in the buffer.
fn find_jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let start = buffer.windows(2).position(|w| w == [0xFF, 0xD8])?;
    let end = buffer[start + 2..]
        .windows(2)
        .position(|w| w == [0xFF, 0xD9])?;
    Some((start, start + 2 + end + 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_jpeg_bounds_in_stream_buffer() {
        let mut buffer = vec![0x00, 0x11];
        buffer.extend_from_slice(&[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
        buffer.extend_from_slice(&[0x22, 0x33]);

        let (start, end) = find_jpeg_bounds(&buffer).expect("bounds");
        assert_eq!(start, 2);
        assert_eq!(end, 8);
        assert_eq!(&buffer[start..end], &[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
    }

    #[test]
    fn incomplete_jpeg_yields_no_bounds() {
        let buffer = [0xFF, 0xD8, 0xAA, 0xBB];
        assert!(find_jpeg_bounds(&buffer).is_none());
    }

    #[test]
    fn rejects_non_http_scheme() {
        let result = HttpSource::new(HttpConfig {
            url: "ftp://camera/stream".to_string(),
            target_fps: 10,
        });
        assert!(result.is_err());
    }
}
