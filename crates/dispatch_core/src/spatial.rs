//! Plane geometry for the dispatch grid.
//!
//! Positions are abstract (x, y) coordinates; one plane unit is read as one
//! kilometer when converting distance to travel time and fares.

use serde::{Deserialize, Serialize};

/// A position on the coordinate plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two optional endpoints.
///
/// Returns `f64::INFINITY` when either endpoint is absent, so callers can
/// rank candidates without special-casing unknown positions.
pub fn distance(a: Option<Point>, b: Option<Point>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => distance_between(a, b),
        _ => f64::INFINITY,
    }
}

/// Euclidean distance between two points.
pub fn distance_between(a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Rounds to two decimal places (fares, distances, scores).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(distance_between(a, b), 5.0);
    }

    #[test]
    fn missing_endpoint_is_infinitely_far() {
        let a = Point::new(1.0, 1.0);
        assert_eq!(distance(Some(a), None), f64::INFINITY);
        assert_eq!(distance(None, Some(a)), f64::INFINITY);
        assert_eq!(distance(Some(a), Some(a)), 0.0);
    }

    #[test]
    fn round2_rounds_to_cents() {
        assert_eq!(round2(5.499), 5.5);
        assert_eq!(round2(8.505), 8.51);
        assert_eq!(round2(1.0), 1.0);
    }
}
