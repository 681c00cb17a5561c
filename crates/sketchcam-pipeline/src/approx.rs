//! Polygon approximation of closed contours using the
//! Ramer-Douglas-Peucker algorithm.
//!
//! A closed contour has no natural endpoints, so it is first split into
//! two open chains at a pair of far-apart anchor points: `a` is the
//! point farthest from the contour's first point, and `b` is the point
//! farthest from `a`. On convex shapes both anchors land on corners,
//! which keeps them from showing up as spurious extra vertices. Each
//! chain is then simplified independently and the results are joined.

use crate::types::{Contour, Polygon};

/// Stage name used in error messages and diagnostics.
pub const STAGE: &str = "approximate_polygons";

/// A contour point in floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Approximate a closed contour with a polygon whose edges stay within
/// `epsilon` pixels of the original boundary.
///
/// Returns `None` when the simplified outline has fewer than three
/// distinct vertices (single pixels, thin lines).
#[must_use = "returns the approximated polygon"]
pub fn approximate(contour: &Contour, epsilon: f64) -> Option<Polygon> {
    let points = contour.points();
    let n = points.len();
    if n < 3 {
        return None;
    }

    let coords: Vec<Vec2> = points
        .iter()
        .map(|p| Vec2 {
            x: f64::from(p.x),
            y: f64::from(p.y),
        })
        .collect();

    let a = farthest_from(&coords, coords[0]);
    let b = farthest_from(&coords, coords[a]);
    if a == b {
        return None;
    }

    // Rotate so the chain starts at `a`; `b` then sits at index `split`.
    // The ring is closed by repeating `a` at index `n`.
    let ring: Vec<usize> = (0..=n).map(|i| (a + i) % n).collect();
    let closed: Vec<Vec2> = ring.iter().map(|&i| coords[i]).collect();
    let split = (b + n - a) % n;

    let mut kept = vec![false; n + 1];
    kept[0] = true;
    kept[split] = true;

    rdp_recurse(&closed, 0, split, epsilon, &mut kept);
    rdp_recurse(&closed, split, n, epsilon, &mut kept);

    let vertices = ring[..n]
        .iter()
        .zip(&kept[..n])
        .filter(|&(_, k)| *k)
        .map(|(&i, _)| points[i])
        .collect();

    Polygon::new(vertices)
}

/// Approximate every contour with `epsilon = epsilon_fraction ×
/// perimeter`, dropping contours that collapse below three vertices.
#[must_use = "returns the approximated polygons"]
pub fn approximate_all(contours: &[Contour], epsilon_fraction: f64) -> Vec<Polygon> {
    contours
        .iter()
        .filter_map(|c| approximate(c, epsilon_fraction * c.perimeter()))
        .collect()
}

/// Index of the point in `points` farthest from `origin`. Ties resolve
/// to the lowest index.
fn farthest_from(points: &[Vec2], origin: Vec2) -> usize {
    let mut best = 0;
    let mut best_dist = 0.0;
    for (i, &p) in points.iter().enumerate() {
        let d = p.distance(origin);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Vec2], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn contour(points: &[(i32, i32)]) -> Contour {
        Contour::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    #[test]
    fn too_few_points_yield_nothing() {
        assert!(approximate(&contour(&[(0, 0), (5, 0)]), 1.0).is_none());
    }

    #[test]
    fn thin_line_yields_nothing() {
        let line = contour(&[(0, 0), (10, 0), (5, 0)]);
        assert!(approximate(&line, 0.5).is_none());
    }

    #[test]
    fn dense_square_reduces_to_four_corners() {
        let mut pts = Vec::new();
        for x in 0..10 {
            pts.push((x, 0));
        }
        for y in 0..10 {
            pts.push((10, y));
        }
        for x in (1..=10).rev() {
            pts.push((x, 10));
        }
        for y in (1..=10).rev() {
            pts.push((0, y));
        }
        let square = contour(&pts);
        let polygon = approximate(&square, 0.03 * square.perimeter());
        assert_eq!(polygon.map(|p| p.vertex_count()), Some(4));
    }

    #[test]
    fn noisy_triangle_reduces_to_three_vertices() {
        // Corners at (0, 0), (20, 0), (10, 16) with a small bump on
        // one edge that lies well within tolerance.
        let tri = contour(&[
            (0, 0),
            (10, 1),
            (20, 0),
            (15, 8),
            (10, 16),
            (5, 8),
        ]);
        let polygon = approximate(&tri, 0.03 * tri.perimeter());
        let polygon = polygon.map(|p| {
            let mut v = p.vertices().to_vec();
            v.sort_by_key(|p| (p.x, p.y));
            v
        });
        assert_eq!(
            polygon,
            Some(vec![Point::new(0, 0), Point::new(10, 16), Point::new(20, 0)])
        );
    }

    #[test]
    fn zero_tolerance_keeps_every_corner() {
        let zigzag = contour(&[(0, 0), (4, 2), (8, 0), (8, 8), (4, 6), (0, 8)]);
        let polygon = approximate(&zigzag, 0.0);
        assert_eq!(polygon.map(|p| p.vertex_count()), Some(6));
    }

    #[test]
    fn approximate_all_drops_degenerate_contours() {
        let contours = vec![
            contour(&[(3, 3)]),
            contour(&[(0, 0), (20, 0), (10, 16)]),
        ];
        let polygons = approximate_all(&contours, 0.03);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].vertex_count(), 3);
    }

    #[test]
    fn perpendicular_distance_on_axis() {
        let d = perpendicular_distance(
            Vec2 { x: 1.0, y: 3.0 },
            Vec2 { x: 0.0, y: 0.0 },
            Vec2 { x: 2.0, y: 0.0 },
        );
        assert!((d - 3.0).abs() < 1e-10);
    }

    #[test]
    fn perpendicular_distance_coincident_endpoints() {
        let d = perpendicular_distance(
            Vec2 { x: 3.0, y: 4.0 },
            Vec2 { x: 0.0, y: 0.0 },
            Vec2 { x: 0.0, y: 0.0 },
        );
        assert!((d - 5.0).abs() < 1e-10);
    }
}
