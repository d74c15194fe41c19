//! preylock - motion-triggered camera monitor for pet prey deterrence.
//!
//! The monitor continuously pulls frames from a camera, compares them
//! against a periodically refreshed background snapshot inside a
//! user-configurable detection zone, and raises a motion event when the
//! fraction of changed pixels exceeds the configured sensitivity.
//!
//! # Architecture
//!
//! Two independent cadences, deliberately not lock-stepped:
//!
//! 1. **Acquisition**: a dedicated thread pulls frames from the capture
//!    device at the camera rate and overwrites a single latest-frame slot.
//! 2. **Detection**: the monitor polls that slot at its own rate, crops to
//!    the active zone, refreshes the comparison background on a fixed
//!    frame interval, and publishes the motion state to observers.
//!
//! The consumer may observe a repeated frame or skip one; neither side
//! ever waits on the other.
//!
//! # Module Structure
//!
//! - `ingest`: frame sources and the background acquisition loop
//! - `detect`: frame preparation and background differencing
//! - `zone`: detection-zone geometry, gestures and cropping
//! - `monitor`: the detection loop state machine and its observer seam
//! - `collector`: disk capture sink invoked on motion onset
//! - `config`: persisted configuration

pub mod collector;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod monitor;
pub mod zone;

pub use collector::DiskCollector;
pub use config::{CameraSettings, CaptureSettings, PreylockConfig, ZoneSettings};
pub use detect::{prepare, validate_sensitivity, MotionDetector, Sensitivity};
pub use frame::{Frame, GrayFrame};
pub use ingest::{open_source, Camera, CameraStats, FrameCapture, DEFAULT_TARGET_FPS};
pub use monitor::{Monitor, MonitorConfig, MonitorObserver, MonitorState};
pub use zone::{
    crop_to_zone, parse_gesture, DetectionZone, Edge, PixelRect, SharedZone, ZoneFractions,
    ZoneGesture, MIN_ZONE_HEIGHT_PX, MIN_ZONE_WIDTH_PX,
};
