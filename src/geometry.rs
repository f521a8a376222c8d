//! Point-in-polygon geometry for parking spaces.
//!
//! Coordinates are integer frame pixels. Regions are closed: a point lying
//! exactly on an edge or a vertex counts as inside. Polygons need not be
//! convex. Anything with fewer than three vertices never contains a point.

use serde::{Deserialize, Serialize};

/// A pixel coordinate. Serialized as an `[x, y]` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by `(dx, dy)`, saturating at the i32 range.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Inclusive axis-aligned bounds of a vertex list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn of(vertices: &[Point]) -> Option<Self> {
        let first = vertices.first()?;
        let mut bounds = Bounds {
            min: *first,
            max: *first,
        };
        for v in &vertices[1..] {
            bounds.min.x = bounds.min.x.min(v.x);
            bounds.min.y = bounds.min.y.min(v.y);
            bounds.max.x = bounds.max.x.max(v.x);
            bounds.max.y = bounds.max.y.max(v.y);
        }
        Some(bounds)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Returns true iff `point` lies inside or on the boundary of the polygon
/// described by `vertices` (implicitly closed).
pub fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    match Bounds::of(vertices) {
        Some(bounds) if bounds.contains(point) => {}
        _ => return false,
    }

    let n = vertices.len();
    let mut j = n - 1;
    for i in 0..n {
        if on_segment(point, vertices[j], vertices[i]) {
            return true;
        }
        j = i;
    }

    // Even-odd crossing count on a ray towards +x.
    let px = point.x as f64;
    let py = point.y as f64;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = vertices[i];
        let vj = vertices[j];
        if (vi.y > point.y) != (vj.y > point.y) {
            let (xi, yi) = (vi.x as f64, vi.y as f64);
            let (xj, yj) = (vj.x as f64, vj.y as f64);
            let cross_x = (xj - xi) * (py - yi) / (yj - yi) + xi;
            if px < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let cross = (b.x as i64 - a.x as i64) * (p.y as i64 - a.y as i64)
        - (b.y as i64 - a.y as i64) * (p.x as i64 - a.x as i64);
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point> {
        raw.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn triangle_contains_interior_point() {
        let tri = pts(&[(0, 0), (10, 0), (5, 10)]);
        assert!(point_in_polygon(Point::new(5, 5), &tri));
        assert!(!point_in_polygon(Point::new(100, 100), &tri));
        assert!(!point_in_polygon(Point::new(-1, 5), &tri));
    }

    #[test]
    fn boundary_and_vertices_count_as_inside() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert!(point_in_polygon(Point::new(0, 0), &square));
        assert!(point_in_polygon(Point::new(10, 10), &square));
        assert!(point_in_polygon(Point::new(5, 0), &square));
        assert!(point_in_polygon(Point::new(10, 7), &square));
        assert!(point_in_polygon(Point::new(0, 3), &square));
        assert!(!point_in_polygon(Point::new(11, 7), &square));
    }

    #[test]
    fn concave_polygon_excludes_notch() {
        // U shape: notch between x=4..6 above y=4.
        let u = pts(&[(0, 0), (10, 0), (10, 10), (6, 10), (6, 4), (4, 4), (4, 10), (0, 10)]);
        assert!(point_in_polygon(Point::new(2, 8), &u));
        assert!(point_in_polygon(Point::new(8, 8), &u));
        assert!(point_in_polygon(Point::new(5, 2), &u));
        assert!(!point_in_polygon(Point::new(5, 8), &u));
        assert!(point_in_polygon(Point::new(5, 4), &u));
    }

    #[test]
    fn degenerate_polygons_never_contain() {
        assert!(!point_in_polygon(Point::new(0, 0), &[]));
        assert!(!point_in_polygon(Point::new(0, 0), &pts(&[(0, 0)])));
        assert!(!point_in_polygon(Point::new(1, 1), &pts(&[(0, 0), (2, 2)])));
    }

    #[test]
    fn collinear_polygon_only_contains_its_segment() {
        let flat = pts(&[(0, 0), (5, 0), (10, 0)]);
        assert!(point_in_polygon(Point::new(3, 0), &flat));
        assert!(!point_in_polygon(Point::new(3, 1), &flat));
    }

    #[test]
    fn vertex_order_does_not_matter() {
        let cw = pts(&[(0, 0), (0, 10), (10, 10), (10, 0)]);
        let ccw = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        for p in [Point::new(3, 3), Point::new(12, 3), Point::new(10, 5)] {
            assert_eq!(point_in_polygon(p, &cw), point_in_polygon(p, &ccw));
        }
    }

    #[test]
    fn point_serializes_as_pair() {
        let json = serde_json::to_string(&Point::new(3, -4)).unwrap();
        assert_eq!(json, "[3,-4]");
        let back: Point = serde_json::from_str("[7,8]").unwrap();
        assert_eq!(back, Point::new(7, 8));
    }
}
