//! Background frame acquisition.
//!
//! `Camera` decouples the capture device's cadence from the consumer's: a
//! dedicated thread pulls frames at the target rate and overwrites a single
//! latest-frame slot. Consumers take a non-blocking snapshot of that slot
//! and may observe a repeated frame or skip one; neither side waits on the
//! other.
//!
//! Retention is at-most-one-frame. A bounded queue would only buffer
//! frames the detector no longer wants; the slot trades completeness for
//! bounded latency.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::{frame_interval, open_source, FrameCapture};
use crate::frame::Frame;

/// Default acquisition rate, matching a typical camera stream.
pub const DEFAULT_TARGET_FPS: u32 = 30;

/// Counters exposed for the daemon's periodic health log.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub capture_failures: u64,
}

/// Single-writer/multiple-reader slot holding the most recent frame.
struct FrameSlot {
    latest: Mutex<Option<Arc<Frame>>>,
    frames_captured: AtomicU64,
    capture_failures: AtomicU64,
}

impl FrameSlot {
    fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            frames_captured: AtomicU64::new(0),
            capture_failures: AtomicU64::new(0),
        }
    }

    fn store(&self, frame: Frame) {
        let frame = Arc::new(frame);
        let mut slot = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(frame);
    }

    fn snapshot(&self) -> Option<Arc<Frame>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Handle to a running acquisition loop.
pub struct Camera {
    slot: Arc<FrameSlot>,
    uri: String,
}

impl Camera {
    /// Open and connect the capture backend for `uri`, then start the
    /// acquisition thread. The thread holds the device handle for the
    /// process lifetime; there is no cancellation beyond shutdown.
    pub fn start(uri: &str, target_fps: u32) -> Result<Self> {
        let mut source =
            open_source(uri, target_fps).with_context(|| format!("open frame source {}", uri))?;
        source
            .connect()
            .with_context(|| format!("connect frame source {}", uri))?;
        Self::start_with(source, target_fps)
    }

    /// Start the acquisition thread on an already-connected source.
    pub fn start_with(source: Box<dyn FrameCapture>, target_fps: u32) -> Result<Self> {
        let uri = source.source_uri().to_string();
        let slot = Arc::new(FrameSlot::new());
        let thread_slot = Arc::clone(&slot);
        let interval = frame_interval(target_fps);
        let thread_uri = uri.clone();
        thread::Builder::new()
            .name("preylock-acquisition".to_string())
            .spawn(move || acquisition_loop(source, thread_slot, interval, thread_uri))
            .context("spawn acquisition thread")?;

        Ok(Self { slot, uri })
    }

    /// The most recent decoded frame, without blocking. `None` until the
    /// first frame arrives ("not ready").
    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.slot.snapshot()
    }

    pub fn is_ready(&self) -> bool {
        self.latest_frame().is_some()
    }

    pub fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.slot.frames_captured.load(Ordering::Relaxed),
            capture_failures: self.slot.capture_failures.load(Ordering::Relaxed),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Acquisition loop body.
///
/// A capture failure leaves the previous frame in the slot; the consumer
/// cannot distinguish a stale frame from a fresh one. Every attempt is
/// independently guarded, so no failure escapes the loop. A stalled device
/// read blocks this loop until the device returns or errors; no per-read
/// timeout is imposed.
fn acquisition_loop(
    mut source: Box<dyn FrameCapture>,
    slot: Arc<FrameSlot>,
    interval: Duration,
    uri: String,
) {
    loop {
        let started = Instant::now();
        match source.next_frame() {
            Ok(frame) => {
                slot.store(frame);
                slot.frames_captured.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                slot.capture_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("capture from {} failed, keeping previous frame: {:#}", uri, e);
            }
        }

        if let Some(rest) = interval.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }
}
