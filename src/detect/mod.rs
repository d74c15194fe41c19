//! Motion detection.
//!
//! - `prepare`: grayscale + blur normalization ahead of differencing
//! - `Sensitivity`: shared runtime-adjustable changed-pixel threshold
//! - `MotionDetector`: background differencing with dilation and a binary
//!   intensity cut

mod motion;
mod prepare;
mod sensitivity;

pub use motion::{MotionDetector, DIFF_INTENSITY_CUTOFF};
pub use prepare::prepare;
pub use sensitivity::{validate_sensitivity, Sensitivity};
