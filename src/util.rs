//! Geometry helpers shared by shapes and the canvas.

use crate::draw::geometry::Point;

// ============================================================================
// Arrowhead Geometry
// ============================================================================

/// Calculates the two barb points of an arrowhead.
///
/// Creates a V-shaped arrowhead at `tip` pointing in the direction from
/// `tail` to `tip`. The arrowhead length is capped at 30% of the line length
/// so short arrows keep a sensible shape.
///
/// # Arguments
/// * `tip` - Arrowhead tip
/// * `tail` - Other end of the line
/// * `length` - Desired arrowhead length in pixels
/// * `angle_degrees` - Angle between each barb and the main line
///
/// # Returns
/// `[left, right]` barb endpoints. If the line is shorter than one pixel both
/// points equal `tip`.
pub fn calculate_arrowhead(tip: Point, tail: Point, length: f64, angle_degrees: f64) -> [Point; 2] {
    let dx = tip.x - tail.x;
    let dy = tip.y - tail.y;
    let line_length = (dx * dx + dy * dy).sqrt();

    if line_length < 1.0 {
        return [tip, tip];
    }

    let ux = dx / line_length;
    let uy = dy / line_length;
    let arrow_length = length.min(line_length * 0.3);
    let (sin_a, cos_a) = angle_degrees.to_radians().sin_cos();

    let left = Point::new(
        tip.x - arrow_length * (ux * cos_a - uy * sin_a),
        tip.y - arrow_length * (uy * cos_a + ux * sin_a),
    );
    let right = Point::new(
        tip.x - arrow_length * (ux * cos_a + uy * sin_a),
        tip.y - arrow_length * (uy * cos_a - ux * sin_a),
    );

    [left, right]
}

// ============================================================================
// Rotation Geometry
// ============================================================================

/// Absolute angle in degrees produced by dragging from `start` to `current`
/// around `pivot`, for an object that was at `start_angle` when the drag began.
///
/// The result is not normalised; callers route it through the angle property
/// setter, which wraps it into `[0, 360)`.
pub fn drag_rotation_angle(pivot: Point, start: Point, current: Point, start_angle: f64) -> f64 {
    let last = (start.y - pivot.y).atan2(start.x - pivot.x);
    let now = (current.y - pivot.y).atan2(current.x - pivot.x);
    (now - last).to_degrees() + start_angle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrowhead_caps_at_thirty_percent_of_line_length() {
        let [left, _] = calculate_arrowhead(
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            100.0,
            30.0,
        );
        let distance = ((10.0 - left.x).powi(2) + (10.0 - left.y).powi(2)).sqrt();
        assert!((distance - 3.0).abs() < 1e-9);
    }

    #[test]
    fn arrowhead_handles_degenerate_lines() {
        let tip = Point::new(5.0, 5.0);
        let [left, right] = calculate_arrowhead(tip, tip, 15.0, 45.0);
        assert_eq!(left, tip);
        assert_eq!(right, tip);
    }

    #[test]
    fn drag_rotation_follows_pointer() {
        let pivot = Point::new(0.0, 0.0);
        let angle = drag_rotation_angle(pivot, Point::new(10.0, 0.0), Point::new(0.0, 10.0), 0.0);
        assert!((angle - 90.0).abs() < 1e-9);

        let angle = drag_rotation_angle(
            pivot,
            Point::new(10.0, 0.0),
            Point::new(10.0, -10.0),
            15.0,
        );
        assert!((angle - -30.0).abs() < 1e-9);
    }
}
