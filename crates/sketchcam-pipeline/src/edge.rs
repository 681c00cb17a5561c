//! Canny edge detection on an already-smoothed frame.
//!
//! Unlike [`imageproc::edges::canny`], this does **not** blur its input:
//! the blur stage runs first, so the gradient is taken directly from its
//! output. The steps are:
//!
//! 1. 3×3 Sobel gradients (`imageproc::gradients`), border replicated.
//! 2. L1 magnitude `|gx| + |gy|`.
//! 3. Non-maximum suppression along the gradient direction, quantized
//!    to horizontal, vertical or one of the two diagonals.
//! 4. Hysteresis: pixels above `high` seed an edge, which then grows
//!    through 8-connected pixels above `low`.
//!
//! Returns a binary frame where white pixels (255) are edges and black
//! pixels (0) are background.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::types::{Frame, PipelineError};

/// Stage name used in error messages and diagnostics.
pub const STAGE: &str = "canny";

/// `tan(22.5°)`: below this slope the gradient counts as horizontal.
const TAN_22_5: f32 = 0.414_213_57;

/// `tan(67.5°)`: above this slope the gradient counts as vertical.
const TAN_67_5: f32 = 2.414_213_6;

/// Detect edges using the Canny algorithm.
///
/// Pixels whose thinned gradient magnitude is above `high_threshold`
/// are definite edges; those above `low_threshold` are edges only if
/// connected to a definite edge. If `low_threshold` exceeds
/// `high_threshold` it is lowered to match.
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `frame` is not a
/// single-channel frame.
pub fn canny(frame: &Frame, low_threshold: f32, high_threshold: f32) -> Result<Frame, PipelineError> {
    let gray = frame.require_gray(STAGE)?;
    let low = low_threshold.min(high_threshold);

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let thinned = non_maximum_suppression(&Magnitude::l1(&gx, &gy), &gx, &gy, low);
    Ok(Frame::Gray(hysteresis(&thinned, low, high_threshold)))
}

/// Gradient magnitude per pixel, zero outside the frame.
struct Magnitude {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Magnitude {
    fn l1(gx: &Image<Luma<i16>>, gy: &Image<Luma<i16>>) -> Self {
        let values = gx
            .pixels()
            .zip(gy.pixels())
            .map(|(h, v)| f32::from(h.0[0]).abs() + f32::from(v.0[0]).abs())
            .collect();
        Self {
            width: gx.width(),
            height: gx.height(),
            values,
        }
    }

    fn zeroed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn get(&self, x: u32, y: u32) -> f32 {
        self.values[self.index(x, y)]
    }

    /// Value at `(x + dx, y + dy)`, or zero when that falls outside.
    fn neighbor(&self, x: u32, y: u32, dx: i32, dy: i32) -> f32 {
        match (x.checked_add_signed(dx), y.checked_add_signed(dy)) {
            (Some(nx), Some(ny)) if nx < self.width && ny < self.height => self.get(nx, ny),
            _ => 0.0,
        }
    }
}

/// Keep only pixels that are a local maximum across the edge. Pixels at
/// or below `low` are dropped outright since hysteresis never uses them.
///
/// Along each direction the pixel must beat the "before" neighbor
/// strictly and at least tie the "after" one, so a plateau two pixels
/// wide yields a one-pixel line.
fn non_maximum_suppression(
    magnitude: &Magnitude,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
    low: f32,
) -> Magnitude {
    let mut out = Magnitude::zeroed(magnitude.width, magnitude.height);
    for y in 0..magnitude.height {
        for x in 0..magnitude.width {
            let m = magnitude.get(x, y);
            if m <= low {
                continue;
            }
            let h = f32::from(gx.get_pixel(x, y).0[0]);
            let v = f32::from(gy.get_pixel(x, y).0[0]);
            let (ah, av) = (h.abs(), v.abs());

            let local_max = if av <= ah * TAN_22_5 {
                m > magnitude.neighbor(x, y, -1, 0) && m >= magnitude.neighbor(x, y, 1, 0)
            } else if av > ah * TAN_67_5 {
                m > magnitude.neighbor(x, y, 0, -1) && m >= magnitude.neighbor(x, y, 0, 1)
            } else {
                // Same signs: gradient runs down-right, compare along
                // the main diagonal; otherwise the anti-diagonal.
                let s = if (h < 0.0) == (v < 0.0) { 1 } else { -1 };
                m > magnitude.neighbor(x, y, -s, -1) && m > magnitude.neighbor(x, y, s, 1)
            };

            if local_max {
                let i = out.index(x, y);
                out.values[i] = m;
            }
        }
    }
    out
}

/// Grow edges from strong seeds through weak pixels (8-connected).
fn hysteresis(thinned: &Magnitude, low: f32, high: f32) -> GrayImage {
    let (w, h) = (thinned.width, thinned.height);
    let mut out = GrayImage::new(w, h);
    let mut stack = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if thinned.get(x, y) <= high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma([255]));
            stack.push((x, y));

            while let Some((px, py)) = stack.pop() {
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let (Some(nx), Some(ny)) =
                            (px.checked_add_signed(dx), py.checked_add_signed(dy))
                        else {
                            continue;
                        };
                        if nx >= w || ny >= h || out.get_pixel(nx, ny).0[0] != 0 {
                            continue;
                        }
                        if thinned.get(nx, ny) > low {
                            out.put_pixel(nx, ny, Luma([255]));
                            stack.push((nx, ny));
                        }
                    }
                }
            }
        }
    }
    out
}
