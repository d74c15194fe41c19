//! Zone-relative sub-frame extraction.

use crate::frame::Frame;
use crate::zone::geometry::DetectionZone;

/// Extract the zone's sub-rectangle from a full frame.
///
/// The zone's pixel cache tracks the *display* canvas, which is typically
/// a scaled preview; the frame has its own native dimensions. The
/// fractions are therefore projected onto the frame itself, truncated at
/// its extent. A degenerate intersection yields an empty frame, which the
/// detector reads as "no motion".
pub fn crop_to_zone(frame: &Frame, zone: &DetectionZone) -> Frame {
    let fractions = zone.relative();
    let frame_w = frame.width() as f64;
    let frame_h = frame.height() as f64;

    let x1 = (fractions.left * frame_w).round() as i64;
    let y1 = (fractions.top * frame_h).round() as i64;
    let x2 = ((fractions.left + fractions.width) * frame_w).round() as i64;
    let y2 = ((fractions.top + fractions.height) * frame_h).round() as i64;

    let x1 = x1.clamp(0, frame.width() as i64);
    let y1 = y1.clamp(0, frame.height() as i64);
    let x2 = x2.clamp(x1, frame.width() as i64);
    let y2 = y2.clamp(y1, frame.height() as i64);

    if x1 == x2 || y1 == y2 {
        return Frame::empty();
    }
    frame.sub_rect(x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::geometry::ZoneFractions;

    fn zone(fractions: ZoneFractions) -> DetectionZone {
        DetectionZone::new(fractions, 400, 300).expect("zone")
    }

    #[test]
    fn full_zone_returns_the_whole_frame() {
        let frame = Frame::filled(64, 48, [10, 20, 30]);
        let zone = zone(ZoneFractions {
            left: 0.0,
            top: 0.0,
            width: 1.0,
            height: 1.0,
        });

        let cropped = crop_to_zone(&frame, &zone);
        assert_eq!(cropped.width(), 64);
        assert_eq!(cropped.height(), 48);
    }

    #[test]
    fn crop_uses_frame_native_dimensions_not_the_canvas() {
        // Zone lives on a 400x300 display canvas; the frame is larger.
        let frame = Frame::filled(200, 100, [0, 0, 0]);
        let zone = zone(ZoneFractions {
            left: 0.25,
            top: 0.5,
            width: 0.5,
            height: 0.5,
        });

        let cropped = crop_to_zone(&frame, &zone);
        assert_eq!(cropped.width(), 100);
        assert_eq!(cropped.height(), 50);
    }

    #[test]
    fn crop_extracts_the_expected_region() {
        let mut frame = Frame::filled(100, 100, [0, 0, 0]);
        // Paint the bottom-right quadrant white.
        let width = frame.width();
        let data = frame.data_mut();
        for y in 50..100u32 {
            for x in 50..100u32 {
                let i = ((y * width + x) * 3) as usize;
                data[i..i + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let zone = zone(ZoneFractions {
            left: 0.5,
            top: 0.5,
            width: 0.5,
            height: 0.5,
        });

        let cropped = crop_to_zone(&frame, &zone);
        assert_eq!(cropped.width(), 50);
        assert!(cropped.data().iter().all(|&p| p == 255));
    }

    #[test]
    fn degenerate_intersection_yields_an_empty_frame() {
        let zone = zone(ZoneFractions {
            left: 0.5,
            top: 0.5,
            width: 0.4,
            height: 0.4,
        });
        let cropped = crop_to_zone(&Frame::empty(), &zone);
        assert!(cropped.is_empty());
    }
}
