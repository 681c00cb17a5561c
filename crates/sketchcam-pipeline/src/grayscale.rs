//! Grayscale conversion.
//!
//! First stage of both variants: a three-channel color frame in, a
//! single-channel intensity frame out.
//!
//! Uses BT.601 luma weights (0.299 R + 0.587 G + 0.114 B) in 14-bit
//! fixed point with rounding, not the Rec.709 weights of
//! `image::imageops::grayscale`.

use image::{GrayImage, Luma};

use crate::types::{Frame, PipelineError};

/// Stage name used in error messages and diagnostics.
pub const STAGE: &str = "grayscale";

/// Fixed-point shift for [`WEIGHTS`].
const SHIFT: u32 = 14;

/// BT.601 weights for R, G, B scaled by `1 << SHIFT`. They sum to
/// exactly `1 << SHIFT`, so white maps to 255.
const WEIGHTS: [u32; 3] = [4899, 9617, 1868];
const _: () = assert!(WEIGHTS[0] + WEIGHTS[1] + WEIGHTS[2] == 1 << SHIFT);

/// Convert a color frame to single-channel intensity.
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `frame` is not a
/// three-channel color frame.
pub fn grayscale(frame: &Frame) -> Result<Frame, PipelineError> {
    let color = frame.require_color(STAGE)?;
    let gray = GrayImage::from_fn(color.width(), color.height(), |x, y| {
        Luma([luma(color.get_pixel(x, y).0)])
    });
    Ok(Frame::Gray(gray))
}

/// Weighted, rounded luma of one RGB pixel.
fn luma(rgb: [u8; 3]) -> u8 {
    let sum: u32 = rgb
        .iter()
        .zip(WEIGHTS)
        .map(|(&c, w)| u32::from(c) * w)
        .sum();
    // Weights sum to 1 << SHIFT, so the result is at most 255.
    #[allow(clippy::cast_possible_truncation)]
    let value = ((sum + (1 << (SHIFT - 1))) >> SHIFT) as u8;
    value
}
