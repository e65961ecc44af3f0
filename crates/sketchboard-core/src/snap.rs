//! Grid snapping.

use kurbo::Point;

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Snap only when `grid` is set.
pub fn snap_if(point: Point, grid: Option<f64>) -> Point {
    match grid {
        Some(size) => snap_to_grid(point, size),
        None => point,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        let snapped = snap_to_grid(Point::new(23.0, 37.0), GRID_SIZE);
        assert!((snapped.x - 20.0).abs() < f64::EPSILON);
        assert!((snapped.y - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_negative() {
        let snapped = snap_to_grid(Point::new(-11.0, -9.0), GRID_SIZE);
        assert!((snapped.x + 20.0).abs() < f64::EPSILON);
        assert!(snapped.y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_snap_disabled() {
        let p = Point::new(3.3, 4.4);
        assert_eq!(snap_if(p, None), p);
        assert_eq!(snap_to_grid(p, 0.0), p);
    }
}
