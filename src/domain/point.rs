// Point domain model - timestamped samples and crosshair lookup helpers

/// A single chart sample. Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub timestamp: f64,
    pub value: f64,
}

impl Point {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }

    pub fn x(&self) -> f64 {
        self.timestamp
    }

    pub fn y(&self) -> f64 {
        self.value
    }

    /// Copy this point's value to a later timestamp so an idle sensor still
    /// draws a flat line up to "now".
    pub fn carry_forward(&self, timestamp: f64) -> Self {
        Self::new(timestamp, self.value)
    }
}

/// Find the point nearest to `x` in a slice sorted ascending by timestamp.
///
/// Bisects for the insertion point, then picks whichever bracketing point is
/// closer. Ties go to the earlier point. Queries outside the covered range
/// resolve to the first or last point; nothing is extrapolated.
pub fn find_point_for_x(points: &[Point], x: f64) -> Option<Point> {
    let i = points.partition_point(|p| p.timestamp < x);
    if points.is_empty() {
        return None;
    }
    if i == 0 {
        return points.first().copied();
    }
    if i >= points.len() {
        return points.last().copied();
    }

    let before = points[i - 1];
    let after = points[i];
    if x - before.timestamp > after.timestamp - x {
        Some(after)
    } else {
        Some(before)
    }
}

/// Readout text for the value nearest to `x`, or `"-"` when there is none.
pub fn display_y_for_x(points: &[Point], x: f64, unit: &str) -> String {
    match find_point_for_x(points, x) {
        Some(point) => format!("{}{}", round2(point.y()), unit),
        None => "-".to_string(),
    }
}

/// Round to two decimals. Negative zero is folded into zero so tiny negative
/// readings print as `0`.
fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<Point> {
        vec![
            Point::new(10.0, 1.0),
            Point::new(20.0, 2.0),
            Point::new(40.0, 4.0),
        ]
    }

    #[test]
    fn test_carry_forward_keeps_value() {
        let point = Point::new(10.0, 21.5);
        let carried = point.carry_forward(99.0);
        assert_eq!(carried, Point::new(99.0, 21.5));
        assert_eq!(point.x(), 10.0);
    }

    #[test]
    fn test_find_point_for_x_picks_nearest_bracket() {
        let points = points();
        assert_eq!(find_point_for_x(&points, 24.0), Some(Point::new(20.0, 2.0)));
        assert_eq!(find_point_for_x(&points, 36.0), Some(Point::new(40.0, 4.0)));
        // Exactly between 20 and 40 resolves to the earlier point.
        assert_eq!(find_point_for_x(&points, 30.0), Some(Point::new(20.0, 2.0)));
        assert_eq!(find_point_for_x(&points, 20.0), Some(Point::new(20.0, 2.0)));
    }

    #[test]
    fn test_find_point_for_x_outside_range() {
        let points = points();
        assert_eq!(find_point_for_x(&points, -5.0), Some(Point::new(10.0, 1.0)));
        assert_eq!(find_point_for_x(&points, 500.0), Some(Point::new(40.0, 4.0)));
        assert_eq!(find_point_for_x(&[], 5.0), None);
    }

    #[test]
    fn test_display_y_for_x() {
        let points = vec![Point::new(0.0, 20.0), Point::new(10.0, 21.456)];
        assert_eq!(display_y_for_x(&points, 1.0, "°"), "20°");
        assert_eq!(display_y_for_x(&points, 9.0, "°"), "21.46°");
        assert_eq!(display_y_for_x(&[], 9.0, "°"), "-");
    }

    #[test]
    fn test_display_y_for_x_tiny_negative_is_zero() {
        assert_eq!(display_y_for_x(&[Point::new(0.0, -0.004)], 0.0, "°"), "0°");
        assert_eq!(display_y_for_x(&[Point::new(0.0, -0.0)], 0.0, ""), "0");
        assert_eq!(display_y_for_x(&[Point::new(0.0, -0.006)], 0.0, ""), "-0.01");
    }
}
