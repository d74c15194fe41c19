//! Synthetic frame source.
//!
//! Backs `stub://` URIs with generated frames so the pipeline can run
//! end-to-end without a camera: tests, the demo binary, and dry runs of
//! the daemon.

use anyhow::{anyhow, Result};
use rand::Rng;

use super::FrameCapture;
use crate::frame::Frame;

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Source URI, echoed in logs and stats.
    pub uri: String,
    pub width: u32,
    pub height: u32,
    /// Every n-th frame shifts the scene, simulating object entry.
    /// 0 keeps the scene static.
    pub scene_shift_period: u64,
    /// Per-pixel random jitter amplitude simulating sensor noise. Kept
    /// well under the detector's intensity cutoff so a static scene never
    /// reads as motion. 0 makes frames fully deterministic.
    pub noise_amplitude: u8,
    /// Fail the first n capture attempts, simulating a stream that needs
    /// time to settle.
    pub fail_first_frames: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            uri: "stub://camera".to_string(),
            width: 640,
            height: 480,
            scene_shift_period: 50,
            noise_amplitude: 2,
            fail_first_frames: 0,
        }
    }
}

/// Synthetic frame source.
pub struct SyntheticSource {
    config: SyntheticConfig,
    attempt_count: u64,
    frame_count: u64,
    /// Simulated "scene" state; each shift moves the whole pattern.
    scene_state: u8,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            attempt_count: 0,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (self.config.width * self.config.height * 3) as usize;

        if self.config.scene_shift_period != 0
            && self.frame_count % self.config.scene_shift_period == 0
        {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut rng = rand::thread_rng();
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            let base = ((i as u64 + self.scene_state as u64 * 48) % 256) as u8;
            let noise = if self.config.noise_amplitude > 0 {
                rng.gen_range(0..=self.config.noise_amplitude)
            } else {
                0
            };
            *pixel = base.wrapping_add(noise);
        }
        pixels
    }
}

impl FrameCapture for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.config.uri);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.attempt_count += 1;
        if self.attempt_count <= self.config.fail_first_frames {
            return Err(anyhow!(
                "synthetic stream not settled (attempt {}/{})",
                self.attempt_count,
                self.config.fail_first_frames
            ));
        }

        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Frame::new(pixels, self.config.width, self.config.height)
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn source_uri(&self) -> &str {
        &self.config.uri
    }
}
