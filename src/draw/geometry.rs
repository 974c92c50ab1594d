//! Points, bounding boxes and rotated quads used for hit testing and stacking.

use serde::{Deserialize, Serialize};

/// A point in canvas or object-local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotates the point around the origin by `degrees`.
    pub fn rotate(self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Axis-aligned bounding box stored as origin plus extent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn from_min_max(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.min_x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.min_y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.min_x + self.width / 2.0, self.min_y + self.height / 2.0)
    }

    /// True when the boxes share any area or touch along an edge.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x()
            && other.min_x <= self.max_x()
            && self.min_y <= other.max_y()
            && other.min_y <= self.max_y()
    }
}

/// Computes the bounding box covering every point of every segment.
///
/// Returns `None` when there are no points at all.
pub fn bounding_box_of_segments(segments: &[Vec<Point>]) -> Option<BoundingBox> {
    let mut points = segments.iter().flatten();
    let first = points.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for p in points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    Some(BoundingBox::from_min_max(min_x, min_y, max_x, max_y))
}

/// The four transformed corners of an object's box, in canvas coordinates.
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left in the
/// object's local frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Quad {
    pub corners: [Point; 4],
}

impl Quad {
    /// Builds the quad for a box of `width`×`height` centred on `center`,
    /// scaled and then rotated by `angle` degrees around its center.
    pub fn from_center(
        center: Point,
        width: f64,
        height: f64,
        scale_x: f64,
        scale_y: f64,
        angle: f64,
    ) -> Self {
        let hw = width * scale_x / 2.0;
        let hh = height * scale_y / 2.0;
        let local = [
            Point::new(-hw, -hh),
            Point::new(hw, -hh),
            Point::new(hw, hh),
            Point::new(-hw, hh),
        ];
        Self {
            corners: local.map(|p| p.rotate(angle).offset(center.x, center.y)),
        }
    }

    /// Axis-aligned box enclosing the quad.
    pub fn bounding_box(&self) -> BoundingBox {
        let segments = [self.corners.to_vec()];
        // Four corners always yield a box.
        bounding_box_of_segments(&segments).unwrap_or_default()
    }

    fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..4).map(move |i| (self.corners[i], self.corners[(i + 1) % 4]))
    }

    /// True when any edge of `self` crosses any edge of `other`.
    ///
    /// Pure containment without crossing edges is not an intersection; see
    /// [`Quad::contains`].
    pub fn intersects(&self, other: &Quad) -> bool {
        self.edges()
            .any(|(a1, a2)| other.edges().any(|(b1, b2)| segments_intersect(a1, a2, b1, b2)))
    }

    /// True when the point lies inside or on the boundary of the quad.
    ///
    /// A quad collapsed to a segment or a single point contains only the
    /// points on that segment or that point.
    pub fn contains_point(&self, p: Point) -> bool {
        let mut sign = 0.0_f64;
        for (a, b) in self.edges() {
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            if cross.abs() < f64::EPSILON {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        if sign == 0.0 {
            // Every edge is degenerate or collinear with `p`.
            return self.edges().any(|(a, b)| on_segment(a, b, p));
        }
        true
    }

    /// True when every corner of `other` lies inside `self`.
    pub fn contains(&self, other: &Quad) -> bool {
        other.corners.iter().all(|&p| self.contains_point(p))
    }
}

/// Symmetric overlap test: crossing edges, or either quad containing the other.
pub fn quads_overlap(a: &Quad, b: &Quad) -> bool {
    a.intersects(b) || a.contains(b) || b.contains(a)
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Segment/segment intersection including collinear overlap and touching endpoints.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f64, cy: f64, size: f64) -> Quad {
        Quad::from_center(Point::new(cx, cy), size, size, 1.0, 1.0, 0.0)
    }

    #[test]
    fn bounding_box_scans_all_segments() {
        let segments = vec![
            vec![Point::new(10.0, 20.0), Point::new(30.0, 5.0)],
            vec![Point::new(-4.0, 40.0)],
        ];
        let bbox = bounding_box_of_segments(&segments).unwrap();
        assert_eq!(bbox, BoundingBox::from_min_max(-4.0, 5.0, 30.0, 40.0));
        assert!(bounding_box_of_segments(&[]).is_none());
    }

    #[test]
    fn crossing_quads_intersect_both_ways() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(6.0, 6.0, 10.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn nested_quad_is_contained_not_intersecting() {
        let outer = square(0.0, 0.0, 100.0);
        let inner = square(5.0, 5.0, 10.0);
        assert!(!outer.intersects(&inner));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(quads_overlap(&inner, &outer));
        assert!(quads_overlap(&outer, &inner));
    }

    #[test]
    fn disjoint_quads_do_not_overlap() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(50.0, 0.0, 10.0);
        assert!(!quads_overlap(&a, &b));
    }

    #[test]
    fn zero_size_quad_contains_only_its_point() {
        let dot = square(5.0, 5.0, 0.0);
        assert!(dot.contains_point(Point::new(5.0, 5.0)));
        assert!(!dot.contains_point(Point::new(400.0, 400.0)));
        assert!(!quads_overlap(&dot, &square(310.0, 310.0, 10.0)));
        assert!(quads_overlap(&dot, &square(0.0, 0.0, 20.0)));
    }

    #[test]
    fn flat_quad_contains_only_its_segment() {
        let flat = Quad::from_center(Point::new(10.0, 10.0), 20.0, 0.0, 1.0, 1.0, 0.0);
        assert!(flat.contains_point(Point::new(15.0, 10.0)));
        assert!(!flat.contains_point(Point::new(50.0, 10.0)));
        assert!(!flat.contains_point(Point::new(15.0, 12.0)));
    }

    #[test]
    fn rotated_quad_bounding_box_grows() {
        let q = Quad::from_center(Point::new(0.0, 0.0), 10.0, 10.0, 1.0, 1.0, 45.0);
        let bbox = q.bounding_box();
        let diagonal = 10.0 * std::f64::consts::SQRT_2;
        assert!((bbox.width - diagonal).abs() < 1e-9);
        assert!((bbox.height - diagonal).abs() < 1e-9);
    }
}
