//! Gesture dispatch, decoupled from any rendering surface.
//!
//! Surfaces deliver gestures as pixel deltas; the dispatch table maps them
//! onto zone operations. The monitor never sees gestures, only consistent
//! snapshots of the zone they produced.

use anyhow::{Context, Result};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::geometry::{DetectionZone, Edge};

/// A zone mutation issued by the interactive surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneGesture {
    Move { dx: i64, dy: i64 },
    Resize { edge: Edge, delta: i64 },
}

impl ZoneGesture {
    pub fn apply(self, zone: &mut DetectionZone) {
        match self {
            ZoneGesture::Move { dx, dy } => zone.translate(dx, dy),
            ZoneGesture::Resize { edge, delta } => zone.resize(edge, delta),
        }
    }
}

/// Resolve a textual gesture identifier: "move" consumes both deltas, an
/// edge name consumes the first as the resize delta. An unknown identifier
/// is a programming error in the surface wiring and fails loudly, never a
/// silent no-op.
pub fn parse_gesture(kind: &str, dx: i64, dy: i64) -> Result<ZoneGesture> {
    match kind {
        "move" => Ok(ZoneGesture::Move { dx, dy }),
        edge => {
            let edge = Edge::from_str(edge)
                .with_context(|| format!("unknown zone gesture '{}'", kind))?;
            Ok(ZoneGesture::Resize { edge, delta: dx })
        }
    }
}

/// Zone handle shared between the interactive surface and the monitor.
///
/// Gestures mutate under the lock; the monitor reads a single consistent
/// `snapshot` per detection cycle, so a concurrent drag can never tear one
/// cycle's geometry.
#[derive(Clone)]
pub struct SharedZone {
    inner: Arc<Mutex<DetectionZone>>,
}

impl SharedZone {
    pub fn new(zone: DetectionZone) -> Self {
        Self {
            inner: Arc::new(Mutex::new(zone)),
        }
    }

    pub fn apply(&self, gesture: ZoneGesture) {
        gesture.apply(&mut self.lock());
    }

    pub fn canvas_resized(&self, canvas_width: u32, canvas_height: u32) -> Result<()> {
        self.lock().on_canvas_resized(canvas_width, canvas_height)
    }

    /// One consistent copy of the current geometry.
    pub fn snapshot(&self) -> DetectionZone {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, DetectionZone> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
