//! Contour extraction: trace every closed boundary in a binary frame.
//!
//! Border following is delegated to `imageproc::contours::find_contours`
//! (Suzuki-Abe), which already returns outer borders and hole borders as
//! a flat list. The parent/child links it reports are dropped; callers
//! only ever see an unordered list of [`Contour`]s.
//!
//! The traced borders contain every boundary pixel. [`compress_chain`]
//! then drops points that lie in the middle of a straight horizontal,
//! vertical or diagonal run, keeping only the run endpoints.

use tracing::debug;

use crate::types::{Contour, Frame, PipelineError, Point};

/// Stage name used in error messages and diagnostics.
pub const STAGE: &str = "find_contours";

/// Trace all contours in a binary frame. Any non-zero pixel counts as
/// foreground.
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `frame` is not a
/// single-channel frame.
pub fn find_contours(frame: &Frame) -> Result<Vec<Contour>, PipelineError> {
    let binary = frame.require_gray(STAGE)?;
    let traced: Vec<imageproc::contours::Contour<i32>> =
        imageproc::contours::find_contours(binary);

    let contours: Vec<Contour> = traced
        .into_iter()
        .filter_map(|c| {
            let points = c.points.into_iter().map(|p| Point::new(p.x, p.y)).collect();
            Contour::new(compress_chain(points))
        })
        .collect();

    debug!(count = contours.len(), "traced contours");
    Ok(contours)
}

/// Remove points that continue the direction of the previous step.
///
/// The sequence is treated as closed, so the first and last points are
/// judged against their wrap-around neighbors. Sequences of two points
/// or fewer are returned unchanged.
#[must_use = "returns the compressed point sequence"]
pub fn compress_chain(points: Vec<Point>) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points;
    }

    let step = |from: Point, to: Point| ((to.x - from.x).signum(), (to.y - from.y).signum());

    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let here = points[i];
            let next = points[(i + 1) % n];
            step(prev, here) != step(here, next)
        })
        .map(|i| points[i])
        .collect();

    // A closed chain always turns somewhere; an empty result means the
    // input was degenerate (every point identical), so keep one point.
    if kept.is_empty() {
        points.into_iter().take(1).collect()
    } else {
        kept
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{GrayImage, RgbImage};

    fn filled_rect(x0: u32, y0: u32, x1: u32, y1: u32) -> Frame {
        Frame::Gray(GrayImage::from_fn(20, 20, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        }))
    }

    #[test]
    fn empty_image_produces_no_contours() {
        let frame = Frame::Gray(GrayImage::new(10, 10));
        assert!(find_contours(&frame).unwrap().is_empty());
    }

    #[test]
    fn rectangle_compresses_to_corners() {
        let contours = find_contours(&filled_rect(5, 5, 15, 15)).unwrap();
        assert_eq!(contours.len(), 1);
        let mut corners = contours[0].points().to_vec();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            corners,
            vec![
                Point::new(5, 5),
                Point::new(14, 5),
                Point::new(5, 14),
                Point::new(14, 14),
            ]
        );
    }

    #[test]
    fn ring_produces_outer_and_hole_contours() {
        let mut img = GrayImage::new(20, 20);
        for y in 3..17 {
            for x in 3..17 {
                let border = !(6..14).contains(&x) || !(6..14).contains(&y);
                if border {
                    img.put_pixel(x, y, image::Luma([255]));
                }
            }
        }
        let contours = find_contours(&Frame::Gray(img)).unwrap();
        assert_eq!(contours.len(), 2, "expected outer border and hole border");
    }

    #[test]
    fn single_pixel_yields_single_point_contour() {
        let mut img = GrayImage::new(10, 10);
        img.put_pixel(5, 5, image::Luma([255]));
        let contours = find_contours(&Frame::Gray(img)).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points(), &[Point::new(5, 5)]);
    }

    #[test]
    fn color_input_is_rejected() {
        let result = find_contours(&Frame::Color(RgbImage::new(4, 4)));
        assert!(matches!(
            result,
            Err(PipelineError::ChannelMismatch { stage: STAGE, .. })
        ));
    }

    #[test]
    fn compress_keeps_turns_only() {
        let square = vec![
            Point::new(0, 0),
            Point::new(1, 0),
            Point::new(2, 0),
            Point::new(2, 1),
            Point::new(2, 2),
            Point::new(1, 2),
            Point::new(0, 2),
            Point::new(0, 1),
        ];
        assert_eq!(
            compress_chain(square),
            vec![
                Point::new(0, 0),
                Point::new(2, 0),
                Point::new(2, 2),
                Point::new(0, 2),
            ]
        );
    }

    #[test]
    fn compress_keeps_diagonal_endpoints() {
        let triangle = vec![
            Point::new(0, 0),
            Point::new(1, 1),
            Point::new(2, 2),
            Point::new(1, 2),
            Point::new(0, 2),
            Point::new(0, 1),
        ];
        assert_eq!(
            compress_chain(triangle),
            vec![Point::new(0, 0), Point::new(2, 2), Point::new(0, 2)]
        );
    }

    #[test]
    fn compress_leaves_short_chains_alone() {
        let pair = vec![Point::new(0, 0), Point::new(3, 0)];
        assert_eq!(compress_chain(pair.clone()), pair);
    }
}
