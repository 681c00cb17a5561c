//! Shape classification and overlay drawing.
//!
//! Polygons are classified purely by vertex count. Only triangles are
//! recognized; everything else is [`Shape::Unclassified`] and is never
//! drawn.
//!
//! Triangles are filled onto a copy of the original color frame in
//! input order. Every fill uses the same color, so overlapping
//! triangles produce the same raster regardless of order.

use imageproc::drawing::draw_polygon_mut;
use tracing::debug;

use crate::types::{Frame, PipelineError, Polygon};

/// Stage name for [`keep_triangles`] in error messages and diagnostics.
pub const CLASSIFY_STAGE: &str = "keep_triangles";

/// Stage name for [`draw_filled`] in error messages and diagnostics.
pub const DRAW_STAGE: &str = "overlay_on_original";

/// Fill color for detected triangles (pure red, RGB).
pub const HIGHLIGHT: [u8; 3] = [255, 0, 0];

/// The shape a polygon was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Exactly three vertices.
    Triangle,
    /// Any other vertex count.
    Unclassified(usize),
}

/// Classify a polygon by its vertex count.
#[must_use]
pub const fn classify(polygon: &Polygon) -> Shape {
    match polygon.vertex_count() {
        3 => Shape::Triangle,
        n => Shape::Unclassified(n),
    }
}

/// Keep only the polygons classified as triangles, preserving order.
#[must_use = "returns the triangles"]
pub fn keep_triangles(polygons: &[Polygon]) -> Vec<Polygon> {
    let triangles: Vec<Polygon> = polygons
        .iter()
        .filter(|p| classify(p) == Shape::Triangle)
        .cloned()
        .collect();
    debug!(
        polygons = polygons.len(),
        triangles = triangles.len(),
        "classified polygons"
    );
    triangles
}

/// Draw each polygon filled with `color` onto a copy of `original`.
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `original` is not a
/// three-channel color frame.
pub fn draw_filled(
    original: &Frame,
    polygons: &[Polygon],
    color: [u8; 3],
) -> Result<Frame, PipelineError> {
    let mut canvas = original.require_color(DRAW_STAGE)?.clone();
    for polygon in polygons {
        let vertices: Vec<imageproc::point::Point<i32>> = polygon
            .vertices()
            .iter()
            .map(|v| imageproc::point::Point::new(v.x, v.y))
            .collect();
        draw_polygon_mut(&mut canvas, &vertices, image::Rgb(color));
    }
    Ok(Frame::Color(canvas))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{GrayImage, Point, RgbImage};

    fn polygon(points: &[(i32, i32)]) -> Polygon {
        Polygon::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    fn canvas(frame: &Frame) -> &RgbImage {
        match frame {
            Frame::Color(img) => img,
            Frame::Gray(_) => panic!("overlay must return a color frame"),
        }
    }

    #[test]
    fn classifies_by_vertex_count() {
        assert_eq!(classify(&polygon(&[(0, 0), (4, 0), (0, 4)])), Shape::Triangle);
        assert_eq!(
            classify(&polygon(&[(0, 0), (4, 0), (4, 4), (0, 4)])),
            Shape::Unclassified(4)
        );
    }

    #[test]
    fn keep_triangles_filters_and_preserves_order() {
        let a = polygon(&[(0, 0), (4, 0), (0, 4)]);
        let square = polygon(&[(0, 0), (4, 0), (4, 4), (0, 4)]);
        let b = polygon(&[(10, 10), (14, 10), (10, 14)]);
        let kept = keep_triangles(&[a.clone(), square, b.clone()]);
        assert_eq!(kept, vec![a, b]);
    }

    #[test]
    fn fills_triangle_interior_and_nothing_else() {
        let original = Frame::Color(RgbImage::new(20, 20));
        let tri = polygon(&[(2, 2), (12, 2), (2, 12)]);
        let out = draw_filled(&original, &[tri], HIGHLIGHT).unwrap();
        let img = canvas(&out);

        assert_eq!(img.get_pixel(4, 4).0, HIGHLIGHT);
        assert_eq!(img.get_pixel(15, 15).0, [0, 0, 0]);
        for (x, y, p) in img.enumerate_pixels() {
            if p.0 == HIGHLIGHT {
                assert!(
                    (2..=12).contains(&x) && (2..=12).contains(&y),
                    "highlight outside triangle bounds at ({x}, {y})",
                );
            }
        }
    }

    #[test]
    fn no_polygons_leaves_copy_unchanged() {
        let original = Frame::Color(RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30])));
        let out = draw_filled(&original, &[], HIGHLIGHT).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn original_is_not_mutated() {
        let original = Frame::Color(RgbImage::new(10, 10));
        let tri = polygon(&[(1, 1), (8, 1), (1, 8)]);
        let _ = draw_filled(&original, &[tri], HIGHLIGHT).unwrap();
        assert!(canvas(&original).pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn overlapping_fills_are_order_independent() {
        let original = Frame::Color(RgbImage::new(20, 20));
        let a = polygon(&[(1, 1), (15, 1), (1, 15)]);
        let b = polygon(&[(5, 5), (18, 5), (5, 18)]);
        let ab = draw_filled(&original, &[a.clone(), b.clone()], HIGHLIGHT).unwrap();
        let ba = draw_filled(&original, &[b, a], HIGHLIGHT).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn gray_original_is_rejected() {
        let result = draw_filled(&Frame::Gray(GrayImage::new(4, 4)), &[], HIGHLIGHT);
        assert!(matches!(
            result,
            Err(PipelineError::ChannelMismatch {
                stage: DRAW_STAGE,
                ..
            })
        ));
    }
}
