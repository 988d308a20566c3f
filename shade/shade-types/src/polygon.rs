//! Polygon math: Newell normals, areas, centroids, corner angles.

use crate::{Point3, Vector3};

/// Compute the (unnormalized) Newell normal of a polygon.
///
/// For a planar CCW polygon the direction follows the right-hand rule and
/// the magnitude equals twice the polygon's area. Robust for mildly
/// non-planar polygons, which bevels produce.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Vector3 {
    let mut normal = Vector3::zeros();
    let n = points.len();
    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal
}

/// Compute the unit normal of a polygon.
///
/// Returns `None` for degenerate polygons (fewer than three points or
/// near-zero area).
///
/// # Example
///
/// ```
/// use shade_types::{polygon_normal, Point3};
///
/// let square = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let n = polygon_normal(&square).unwrap();
/// assert!((n.z - 1.0).abs() < 1e-10);
/// ```
#[must_use]
pub fn polygon_normal(points: &[Point3]) -> Option<Vector3> {
    if points.len() < 3 {
        return None;
    }
    let normal = newell_normal(points);
    let len_sq = normal.norm_squared();
    if len_sq > f64::EPSILON {
        Some(normal / len_sq.sqrt())
    } else {
        None
    }
}

/// Compute the area of a polygon.
#[inline]
#[must_use]
pub fn polygon_area(points: &[Point3]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    newell_normal(points).norm() * 0.5
}

/// Compute the centroid of a polygon's vertices.
#[must_use]
pub fn polygon_centroid(points: &[Point3]) -> Point3 {
    let mut sum = Vector3::zeros();
    for point in points {
        sum += point.coords;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len().max(1) as f64;
    Point3::from(sum / n)
}

/// Interior angle at `at`, between the directions toward `prev` and `next`.
///
/// Returns a value in `[0, π]`; degenerate corners (a coincident neighbor)
/// yield `0`.
#[must_use]
pub fn interior_angle(prev: &Point3, at: &Point3, next: &Point3) -> f64 {
    let u = prev - at;
    let v = next - at;
    let lengths = u.norm() * v.norm();
    if lengths < f64::EPSILON {
        return 0.0;
    }
    (u.dot(&v) / lengths).clamp(-1.0, 1.0).acos()
}
