//! Gaussian blur for noise reduction before thresholding and edge
//! detection.
//!
//! The kernel is a fixed 5×5 Gaussian whose sigma is derived from the
//! kernel size (`0.3 × ((k − 1) × 0.5 − 1) + 0.8 = 1.1` for `k = 5`).
//! At this size the sampled kernel is the binomial row `[1, 4, 6, 4, 1]
//! / 16`, which keeps the convolution in exact integer arithmetic.
//!
//! Pixels outside the frame are treated as zero (constant border), so
//! edge pixels darken slightly. `imageproc::filter::gaussian_blur_f32`
//! clamps at the border instead, which is why the convolution is done
//! here directly.

use image::GrayImage;

use crate::types::{Frame, PipelineError};

/// Stage name used in error messages and diagnostics.
pub const STAGE: &str = "gaussian_blur";

/// Kernel width and height in pixels.
pub const KERNEL_SIZE: usize = 5;

/// One row of the separable kernel. Sums to 16.
const KERNEL: [u32; KERNEL_SIZE] = [1, 4, 6, 4, 1];

/// Denominator of the full 2D kernel (16 × 16).
const KERNEL_NORM: u32 = 256;

/// Blur a single-channel frame with the fixed 5×5 Gaussian kernel and a
/// zero border.
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `frame` is not a
/// single-channel frame.
pub fn gaussian_blur(frame: &Frame) -> Result<Frame, PipelineError> {
    let gray = frame.require_gray(STAGE)?;
    Ok(Frame::Gray(blur_zero_border(gray)))
}

/// Separable convolution: a horizontal pass into `u32` sums, then a
/// vertical pass with rounding back to `u8`.
fn blur_zero_border(image: &GrayImage) -> GrayImage {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let src = image.as_raw();
    let radius = KERNEL_SIZE / 2;

    let mut horizontal = vec![0u32; w * h];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            horizontal[y * w + x] = KERNEL
                .iter()
                .enumerate()
                .filter_map(|(k, &weight)| {
                    (x + k)
                        .checked_sub(radius)
                        .and_then(|sx| row.get(sx))
                        .map(|&v| weight * u32::from(v))
                })
                .sum();
        }
    }

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        let sum: u32 = KERNEL
            .iter()
            .enumerate()
            .filter_map(|(k, &weight)| {
                (y + k)
                    .checked_sub(radius)
                    .filter(|&sy| sy < h)
                    .map(|sy| weight * horizontal[sy * w + x])
            })
            .sum();
        // Max sum is 255 × 256, so the rounded quotient fits in a u8.
        #[allow(clippy::cast_possible_truncation)]
        let value = ((sum + KERNEL_NORM / 2) / KERNEL_NORM) as u8;
        image::Luma([value])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::RgbImage;

    fn blurred(image: GrayImage) -> GrayImage {
        match gaussian_blur(&Frame::Gray(image)).unwrap() {
            Frame::Gray(img) => img,
            Frame::Color(_) => panic!("blur must return a gray frame"),
        }
    }

    /// Create a test image with a sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn kernel_is_normalized() {
        let row: u32 = KERNEL.iter().sum();
        assert_eq!(row * row, KERNEL_NORM);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = blurred(GrayImage::new(17, 31));
        assert_eq!(img.width(), 17);
        assert_eq!(img.height(), 31);
    }

    #[test]
    fn uniform_interior_is_unchanged() {
        let img = blurred(GrayImage::from_pixel(12, 12, image::Luma([200])));
        // Pixels at least two away from every border see only the
        // uniform value under the kernel.
        for y in 2..10 {
            for x in 2..10 {
                assert_eq!(img.get_pixel(x, y).0[0], 200);
            }
        }
    }

    #[test]
    fn zero_border_darkens_corners() {
        let img = blurred(GrayImage::from_pixel(12, 12, image::Luma([255])));
        // Corner keeps (11/16)² of the kernel mass: 255 × 121/256 ≈ 121.
        assert_eq!(img.get_pixel(0, 0).0[0], 121);
        assert!(img.get_pixel(1, 0).0[0] < 255);
        assert_eq!(img.get_pixel(6, 6).0[0], 255);
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let img = blurred(sharp_edge_image());
        let left_of_edge = img.get_pixel(4, 5).0[0];
        let right_of_edge = img.get_pixel(5, 5).0[0];
        assert!(left_of_edge > 0, "expected left side to brighten");
        assert!(right_of_edge < 255, "expected right side to darken");
    }

    #[test]
    fn single_pixel_impulse_spreads_as_kernel() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, image::Luma([255]));
        let out = blurred(img);
        // Center weight is 36/256.
        assert_eq!(out.get_pixel(4, 4).0[0], 36);
        // Symmetric response.
        assert_eq!(out.get_pixel(3, 4), out.get_pixel(5, 4));
        assert_eq!(out.get_pixel(4, 3), out.get_pixel(4, 5));
        // Nothing beyond the kernel radius.
        assert_eq!(out.get_pixel(1, 4).0[0], 0);
    }

    #[test]
    fn color_input_is_rejected() {
        let result = gaussian_blur(&Frame::Color(RgbImage::new(3, 3)));
        assert!(matches!(
            result,
            Err(PipelineError::ChannelMismatch { stage: STAGE, .. })
        ));
    }
}
