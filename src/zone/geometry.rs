//! Detection-zone rectangle in canvas-fraction coordinates.
//!
//! The fractional geometry is the ground truth; the pixel rectangle is a
//! cache derived for the current canvas size. Mutations operate on pixels
//! (that is what drag gestures deliver) and immediately recompute the
//! fractions from the accepted change, so the fractional form never
//! drifts behind the absolute one.

use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Smallest zone extent per axis, in pixels, on canvases at least that
/// large. Smaller canvases reduce the minimum to their own extent.
pub const MIN_ZONE_WIDTH_PX: i64 = 50;
pub const MIN_ZONE_HEIGHT_PX: i64 = 50;

/// An edge a resize gesture grabs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Left,
    Top,
    Right,
    Bottom,
}

impl Edge {
    pub fn name(self) -> &'static str {
        match self {
            Edge::Left => "left",
            Edge::Top => "top",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
        }
    }
}

impl FromStr for Edge {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Edge::Left),
            "top" => Ok(Edge::Top),
            "right" => Ok(Edge::Right),
            "bottom" => Ok(Edge::Bottom),
            other => Err(anyhow!(
                "invalid resize edge '{}'; expected left, top, right or bottom",
                other
            )),
        }
    }
}

/// Zone geometry relative to the canvas, each component in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneFractions {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ZoneFractions {
    /// Project onto a canvas, rounding to the nearest pixel.
    pub fn to_pixels(&self, canvas_width: u32, canvas_height: u32) -> PixelRect {
        let w = canvas_width as f64;
        let h = canvas_height as f64;
        PixelRect {
            x: (self.left * w).round() as i64,
            y: (self.top * h).round() as i64,
            width: (self.width * w).round() as i64,
            height: (self.height * h).round() as i64,
        }
    }
}

/// Absolute zone geometry for a specific canvas size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    pub fn right(&self) -> i64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i64 {
        self.y + self.height
    }

    /// Convert back to fractions. Each component is defensively clamped to
    /// [0, 1]: an in-progress drag may transiently exceed range.
    pub fn to_fractions(&self, canvas_width: u32, canvas_height: u32) -> ZoneFractions {
        let w = canvas_width.max(1) as f64;
        let h = canvas_height.max(1) as f64;
        ZoneFractions {
            left: clamp_fraction(self.x as f64 / w),
            top: clamp_fraction(self.y as f64 / h),
            width: clamp_fraction(self.width as f64 / w),
            height: clamp_fraction(self.height as f64 / h),
        }
    }
}

fn clamp_fraction(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// User-configurable region of interest within the camera frame.
///
/// Invariants, established at construction and preserved by every
/// mutation: the pixel rectangle lies within the canvas, and its extent
/// per axis is at least the minimum (or the full canvas when the canvas
/// is smaller than the minimum).
#[derive(Clone, Debug)]
pub struct DetectionZone {
    fractions: ZoneFractions,
    canvas_width: i64,
    canvas_height: i64,
    rect: PixelRect,
}

impl DetectionZone {
    pub fn new(fractions: ZoneFractions, canvas_width: u32, canvas_height: u32) -> Result<Self> {
        if canvas_width == 0 || canvas_height == 0 {
            return Err(anyhow!(
                "canvas must have a non-zero extent, got {}x{}",
                canvas_width,
                canvas_height
            ));
        }
        for (name, v) in [
            ("left", fractions.left),
            ("top", fractions.top),
            ("width", fractions.width),
            ("height", fractions.height),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(anyhow!("zone {} fraction {} is outside [0, 1]", name, v));
            }
        }
        if fractions.width <= 0.0 || fractions.height <= 0.0 {
            return Err(anyhow!("zone must have a positive extent"));
        }

        let mut zone = Self {
            fractions,
            canvas_width: canvas_width as i64,
            canvas_height: canvas_height as i64,
            rect: PixelRect {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
        };
        zone.reproject();
        zone.recompute_derived();
        Ok(zone)
    }

    fn min_width(&self) -> i64 {
        MIN_ZONE_WIDTH_PX.min(self.canvas_width)
    }

    fn min_height(&self) -> i64 {
        MIN_ZONE_HEIGHT_PX.min(self.canvas_height)
    }

    /// Rebuild the pixel rectangle from the fractional ground truth:
    /// round, truncate the extent at the canvas edge, then enforce the
    /// minimum size (shifting the origin back when the minimum pushes the
    /// rectangle past the boundary).
    fn reproject(&mut self) {
        let projected = self.fractions.to_pixels(self.canvas_width as u32, self.canvas_height as u32);
        let min_w = self.min_width();
        let min_h = self.min_height();

        let mut x = projected.x.clamp(0, self.canvas_width);
        let mut width = projected.width.min(self.canvas_width - x);
        if width < min_w {
            width = min_w;
            x = self.canvas_width - width;
        }

        let mut y = projected.y.clamp(0, self.canvas_height);
        let mut height = projected.height.min(self.canvas_height - y);
        if height < min_h {
            height = min_h;
            y = self.canvas_height - height;
        }

        self.rect = PixelRect {
            x,
            y,
            width,
            height,
        };
    }

    /// Recompute the fractional ground truth from the accepted pixel
    /// geometry. Called at the end of every mutating operation.
    fn recompute_derived(&mut self) {
        self.fractions = self
            .rect
            .to_fractions(self.canvas_width as u32, self.canvas_height as u32);
    }

    /// Move one edge by a pixel delta (positive = right/down). The edge is
    /// clamped so the zone never crosses the canvas boundary nor shrinks
    /// below the minimum extent.
    pub fn resize(&mut self, edge: Edge, delta: i64) {
        let min_w = self.min_width();
        let min_h = self.min_height();
        let mut r = self.rect;

        match edge {
            Edge::Left => {
                let right = r.right();
                let new_x = (r.x + delta).clamp(0, right - min_w);
                r.x = new_x;
                r.width = right - new_x;
            }
            Edge::Top => {
                let bottom = r.bottom();
                let new_y = (r.y + delta).clamp(0, bottom - min_h);
                r.y = new_y;
                r.height = bottom - new_y;
            }
            Edge::Right => {
                let new_right = (r.right() + delta).clamp(r.x + min_w, self.canvas_width);
                r.width = new_right - r.x;
            }
            Edge::Bottom => {
                let new_bottom = (r.bottom() + delta).clamp(r.y + min_h, self.canvas_height);
                r.height = new_bottom - r.y;
            }
        }

        self.rect = r;
        self.recompute_derived();
    }

    /// Translate the zone. Each axis delta is clamped so the zone lands
    /// exactly touching the nearest boundary; an out-of-range drag is
    /// never rejected outright.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        let r = self.rect;
        let dx = dx.clamp(-r.x, self.canvas_width - r.right());
        let dy = dy.clamp(-r.y, self.canvas_height - r.bottom());
        self.rect.x += dx;
        self.rect.y += dy;
        self.recompute_derived();
    }

    /// Recompute the absolute geometry for a new canvas size from the
    /// fractional ground truth. Idempotent: repeated notifications with
    /// the same size produce the same rectangle, with no drift.
    pub fn on_canvas_resized(&mut self, canvas_width: u32, canvas_height: u32) -> Result<()> {
        if canvas_width == 0 || canvas_height == 0 {
            return Err(anyhow!(
                "canvas must have a non-zero extent, got {}x{}",
                canvas_width,
                canvas_height
            ));
        }
        self.canvas_width = canvas_width as i64;
        self.canvas_height = canvas_height as i64;
        self.reproject();
        Ok(())
    }

    pub fn relative(&self) -> ZoneFractions {
        self.fractions
    }

    pub fn pixel_rect(&self) -> PixelRect {
        self.rect
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width as u32, self.canvas_height as u32)
    }
}
