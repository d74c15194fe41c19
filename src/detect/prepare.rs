//! Frame normalization ahead of differencing.

use crate::frame::{Frame, GrayFrame};

// 5x5 binomial blur, applied as two separable [1,4,6,4,1] passes.
const BLUR_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];
const BLUR_KERNEL_SUM: u32 = 16;

/// Convert to single-channel luminance and smooth, suppressing sensor
/// noise and compression artifacts before differencing.
///
/// Deterministic and side-effect free; safe to call concurrently on
/// distinct frames.
pub fn prepare(frame: &Frame) -> GrayFrame {
    blur(&to_luma(frame))
}

/// Rec.601 integer luminance.
fn to_luma(frame: &Frame) -> GrayFrame {
    let mut data = Vec::with_capacity(frame.width() as usize * frame.height() as usize);
    for px in frame.data().chunks_exact(3) {
        let y = (77 * px[0] as u32 + 150 * px[1] as u32 + 29 * px[2] as u32) >> 8;
        data.push(y as u8);
    }
    GrayFrame::from_parts(data, frame.width(), frame.height())
}

fn blur(src: &GrayFrame) -> GrayFrame {
    let width = src.width() as usize;
    let height = src.height() as usize;
    if width == 0 || height == 0 {
        return src.clone();
    }

    let input = src.data();
    let mut tmp = vec![0u8; input.len()];
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let mut acc = 0u32;
            for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                // Replicate the border pixel past the edge.
                let sx = (x as isize + k as isize - 2).clamp(0, width as isize - 1) as usize;
                acc += weight * input[row + sx] as u32;
            }
            tmp[row + x] = (acc / BLUR_KERNEL_SUM) as u8;
        }
    }

    let mut out = vec![0u8; input.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u32;
            for (k, weight) in BLUR_KERNEL.iter().enumerate() {
                let sy = (y as isize + k as isize - 2).clamp(0, height as isize - 1) as usize;
                acc += weight * tmp[sy * width + x] as u32;
            }
            out[y * width + x] = (acc / BLUR_KERNEL_SUM) as u8;
        }
    }

    GrayFrame::from_parts(out, src.width(), src.height())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_frame_stays_uniform() {
        let frame = Frame::filled(16, 12, [120, 120, 120]);
        let prepared = prepare(&frame);
        assert_eq!(prepared.width(), 16);
        assert_eq!(prepared.height(), 12);

        let first = prepared.data()[0];
        assert!(prepared.data().iter().all(|&p| p == first));
    }

    #[test]
    fn luminance_weights_green_over_blue() {
        let green = prepare(&Frame::filled(8, 8, [0, 200, 0]));
        let blue = prepare(&Frame::filled(8, 8, [0, 0, 200]));
        assert!(green.data()[0] > blue.data()[0]);
    }

    #[test]
    fn empty_frame_prepares_to_empty() {
        let prepared = prepare(&Frame::empty());
        assert_eq!(prepared.pixel_count(), 0);
    }
}
