//! Background differencing.

use crate::detect::prepare::prepare;
use crate::detect::sensitivity::Sensitivity;
use crate::frame::{Frame, GrayFrame};

/// Intensity cut applied to the dilated difference: only pixels that
/// changed by more than this much count as changed.
pub const DIFF_INTENSITY_CUTOFF: u8 = 20;

// 5x5 structuring element, applied as two separable radius-2 max passes.
const DILATE_RADIUS: usize = 2;

/// Compares a candidate frame against a background snapshot and decides
/// whether enough of the zone changed to call it motion.
///
/// Both frames are normalized through `prepare` on the way in. The decision
/// pipeline is: absolute difference, morphological dilation (merging small
/// adjacent differences into contiguous regions), binary threshold at
/// `DIFF_INTENSITY_CUTOFF`, then a changed-pixel ratio compared against the
/// shared sensitivity.
pub struct MotionDetector {
    sensitivity: Sensitivity,
    background: Option<GrayFrame>,
    compare: Option<GrayFrame>,
}

impl MotionDetector {
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity,
            background: None,
            compare: None,
        }
    }

    /// Install a new comparison baseline. Any stale candidate is dropped
    /// with it, so the next decision after a reset is always "no motion".
    pub fn set_background_frame(&mut self, frame: &Frame) {
        self.background = Some(prepare(frame));
        self.compare = None;
    }

    pub fn set_compare_frame(&mut self, frame: &Frame) {
        self.compare = Some(prepare(frame));
    }

    /// Handle to the shared sensitivity threshold.
    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity.clone()
    }

    /// Fraction of zone pixels that changed, or `None` when no comparison
    /// is possible: missing baseline or candidate, mismatched dimensions
    /// (typically right after a zone resize), or a zero-area candidate.
    pub fn changed_ratio(&self) -> Option<f64> {
        let background = self.background.as_ref()?;
        let compare = self.compare.as_ref()?;

        if background.width() != compare.width() || background.height() != compare.height() {
            log::debug!(
                "skipping comparison: background {}x{} vs compare {}x{}",
                background.width(),
                background.height(),
                compare.width(),
                compare.height()
            );
            return None;
        }
        let total = compare.pixel_count();
        if total == 0 {
            return None;
        }

        let diff: Vec<u8> = background
            .data()
            .iter()
            .zip(compare.data())
            .map(|(&a, &b)| a.abs_diff(b))
            .collect();
        let dilated = dilate(&diff, compare.width() as usize, compare.height() as usize);

        let changed = dilated
            .iter()
            .filter(|&&p| p > DIFF_INTENSITY_CUTOFF)
            .count();
        Some(changed as f64 / total as f64)
    }

    /// Decide motion. Reads the sensitivity at decision time, so runtime
    /// updates take effect on the next call. Never errors: every
    /// no-comparison case yields `false`.
    pub fn movement_detected(&self) -> bool {
        match self.changed_ratio() {
            Some(ratio) => ratio > self.sensitivity.get(),
            None => false,
        }
    }
}

/// Square max filter grown from two separable passes.
fn dilate(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut tmp = vec![0u8; src.len()];
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let lo = x.saturating_sub(DILATE_RADIUS);
            let hi = (x + DILATE_RADIUS).min(width - 1);
            tmp[row + x] = src[row + lo..=row + hi].iter().copied().max().unwrap_or(0);
        }
    }

    let mut out = vec![0u8; src.len()];
    for y in 0..height {
        let lo = y.saturating_sub(DILATE_RADIUS);
        let hi = (y + DILATE_RADIUS).min(height - 1);
        for x in 0..width {
            let mut peak = 0u8;
            for sy in lo..=hi {
                peak = peak.max(tmp[sy * width + x]);
            }
            out[y * width + x] = peak;
        }
    }
    out
}
