//! The detection loop.
//!
//! `Monitor` consumes the camera's latest-frame slot at its own cadence,
//! crops each frame to the active zone, refreshes the comparison
//! background on a fixed frame interval, and publishes the motion state to
//! an observer. Detection never blocks on what observers do with it.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::detect::MotionDetector;
use crate::frame::Frame;
use crate::ingest::Camera;
use crate::zone::{crop_to_zone, SharedZone};

/// Default background refresh period in processed frames: one second's
/// worth at the default camera rate.
pub const DEFAULT_BACKGROUND_RESET_FRAMES: u64 = 30;

const WARMUP_BACKOFF: Duration = Duration::from_secs(1);
const WARMUP_ATTEMPTS: u32 = 60;
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    /// No frame seen yet; idling with backoff.
    WarmingUp,
    /// Processing frames.
    Running,
}

#[derive(Clone, Copy, Debug)]
pub struct MonitorConfig {
    /// Consumer cadence, independent of the acquisition rate.
    pub poll_interval: Duration,
    /// Background refresh period, in processed frames.
    pub background_reset_frames: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(33),
            background_reset_frames: DEFAULT_BACKGROUND_RESET_FRAMES,
        }
    }
}

/// Downstream collaborators of the detection loop.
///
/// Detection only signals; implementations own their storage and
/// rate-limiting policy and must not block the loop on completion.
pub trait MonitorObserver {
    /// Called once per cycle with the raw frame and the published motion
    /// state. Display surfaces render from here.
    fn frame_processed(&mut self, _frame: &Frame, _motion: bool) {}

    /// Called on each false-to-true motion transition with the raw frame.
    /// Capture pipelines hook in here.
    fn motion_started(&mut self, _frame: &Frame) {}
}

pub struct Monitor {
    camera: Camera,
    zone: SharedZone,
    detector: MotionDetector,
    config: MonitorConfig,
    state: MonitorState,
    cycle: u64,
    motion: bool,
}

impl Monitor {
    pub fn new(
        camera: Camera,
        zone: SharedZone,
        detector: MotionDetector,
        mut config: MonitorConfig,
    ) -> Self {
        // A zero reset period would never install a background.
        config.background_reset_frames = config.background_reset_frames.max(1);
        Self {
            camera,
            zone,
            detector,
            config,
            state: MonitorState::WarmingUp,
            cycle: 0,
            motion: false,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn motion(&self) -> bool {
        self.motion
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Idle with a fixed backoff until the camera reports a frame, then
    /// transition to `Running`. Bounded: a source that never produces a
    /// frame surfaces as an error instead of retrying forever.
    pub fn wait_until_ready(&mut self) -> Result<()> {
        if self.state == MonitorState::Running {
            return Ok(());
        }
        for attempt in 0..WARMUP_ATTEMPTS {
            if self.camera.is_ready() {
                self.state = MonitorState::Running;
                log::info!("camera {} ready, monitor running", self.camera.uri());
                return Ok(());
            }
            log::debug!(
                "camera {} not ready (attempt {}), backing off",
                self.camera.uri(),
                attempt + 1
            );
            thread::sleep(WARMUP_BACKOFF);
        }
        Err(anyhow!(
            "camera {} produced no frame within {} attempts",
            self.camera.uri(),
            WARMUP_ATTEMPTS
        ))
    }

    /// One detection cycle over a frame. Returns the published motion
    /// state.
    ///
    /// The zone is snapshotted once per cycle, so a concurrent drag cannot
    /// tear the geometry mid-comparison. On background-reset cycles the
    /// crop becomes the new baseline and the motion state is forced false.
    pub fn process_frame(&mut self, frame: &Frame) -> bool {
        let zone = self.zone.snapshot();
        let cropped = crop_to_zone(frame, &zone);

        let reset = self.cycle % self.config.background_reset_frames == 0;
        self.cycle = self.cycle.wrapping_add(1);

        if reset {
            self.detector.set_background_frame(&cropped);
            self.motion = false;
        } else {
            self.detector.set_compare_frame(&cropped);
            self.motion = self.detector.movement_detected();
        }
        self.motion
    }

    /// One full cycle: detect, publish, and fire the capture seam on a
    /// false-to-true transition. Returns the published motion state.
    pub fn tick(&mut self, frame: &Frame, observer: &mut dyn MonitorObserver) -> bool {
        let was_motion = self.motion;
        let motion = self.process_frame(frame);
        observer.frame_processed(frame, motion);
        if motion && !was_motion {
            if let Some(ratio) = self.detector.changed_ratio() {
                log::info!("motion started: changed ratio {:.4}", ratio);
            }
            observer.motion_started(frame);
        }
        motion
    }

    /// Drive the loop at the consumer cadence until `running` clears.
    pub fn run(&mut self, observer: &mut dyn MonitorObserver, running: &AtomicBool) -> Result<()> {
        self.wait_until_ready()?;
        let mut last_health_log = Instant::now();

        while running.load(Ordering::Relaxed) {
            let Some(frame) = self.camera.latest_frame() else {
                // The slot never empties once filled; this only guards the
                // unreachable-in-practice case of a consumer outpacing a
                // restarted warm-up.
                thread::sleep(WARMUP_BACKOFF);
                continue;
            };

            let motion = self.tick(&frame, observer);

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = self.camera.stats();
                log::debug!(
                    "camera {}: frames={} failures={} motion={}",
                    self.camera.uri(),
                    stats.frames_captured,
                    stats.capture_failures,
                    motion
                );
                last_health_log = Instant::now();
            }

            thread::sleep(self.config.poll_interval);
        }
        Ok(())
    }
}
