//! Hand-drawn ("sketchy") path effect and hachure fill.
//!
//! All randomness comes from the element's persisted seed, so a shape looks
//! the same on every redraw and only changes when its seed does.

use kurbo::{BezPath, PathEl, Point};
use sketchboard_core::elements::splitmix32;

/// Hachure line angle, radians (about -41 degrees).
pub const HACHURE_ANGLE: f64 = -0.7156;

/// Simple xorshift32 generator for deterministic jitter.
struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Random float in range [-1, 1]
    fn next_f64(&mut self) -> f64 {
        (self.next_u32() as f64 / u32::MAX as f64) * 2.0 - 1.0
    }

    fn offset(&mut self, amount: f64) -> f64 {
        self.next_f64() * amount
    }

    fn jitter(&mut self, p: Point, amount: f64) -> Point {
        Point::new(p.x + self.offset(amount), p.y + self.offset(amount))
    }
}

/// Seed for one pass over an element's outline.
pub fn pass_seed(seed: u32, pass: u32) -> u32 {
    splitmix32(seed ^ pass.wrapping_mul(0x9E3779B9))
}

/// Apply the hand-drawn effect to a path.
///
/// Endpoints are randomly offset so lines overshoot at corners, and straight
/// segments bow slightly in the middle. `roughness` 0 returns the path
/// unchanged; the effect is scaled down as `zoom` grows so it reads the same
/// on screen at every zoom level.
pub fn hand_drawn(path: &BezPath, roughness: f64, zoom: f64, seed: u32, pass: u32) -> BezPath {
    if roughness <= 0.0 {
        return path.clone();
    }

    let scale = 1.0 / zoom.max(f64::EPSILON).sqrt();
    let max_offset = roughness * 2.0 * scale;
    let bowing = roughness;
    let mut rng = SimpleRng::new(pass_seed(seed, pass));

    let mut result = BezPath::new();
    let mut last = Point::ZERO;

    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                result.move_to(rng.jitter(p, max_offset));
                last = p;
            }
            PathEl::LineTo(p) => {
                let d = p - last;
                let len = d.hypot();
                let bow = rng.offset(bowing * roughness * len / 200.0) * scale;
                let perp = if len > 0.001 {
                    kurbo::Vec2::new(-d.y / len, d.x / len)
                } else {
                    kurbo::Vec2::ZERO
                };
                let control = last.midpoint(p) + perp * bow;
                result.quad_to(control, rng.jitter(p, max_offset));
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                result.quad_to(rng.jitter(p1, max_offset * 0.7), rng.jitter(p2, max_offset));
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                result.curve_to(
                    rng.jitter(p1, max_offset * 0.5),
                    rng.jitter(p2, max_offset * 0.5),
                    rng.jitter(p3, max_offset),
                );
                last = p3;
            }
            PathEl::ClosePath => result.close_path(),
        }
    }

    result
}

/// Parallel hachure lines clipped to a closed polygon, spaced `gap` apart.
pub fn hachure_lines(polygon: &[Point], gap: f64, angle: f64) -> BezPath {
    let mut path = BezPath::new();
    if polygon.len() < 3 || gap <= 0.0 {
        return path;
    }

    // Rotate so the hachure lines are horizontal, scan, rotate back.
    let (sin, cos) = angle.sin_cos();
    let to_scan = |p: Point| Point::new(p.x * cos + p.y * sin, -p.x * sin + p.y * cos);
    let from_scan = |p: Point| Point::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);

    let rotated: Vec<Point> = polygon.iter().map(|p| to_scan(*p)).collect();
    let (y_min, y_max) = rotated
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });

    let mut y = y_min + gap / 2.0;
    while y < y_max {
        let mut xs: Vec<f64> = Vec::new();
        for i in 0..rotated.len() {
            let a = rotated[i];
            let b = rotated[(i + 1) % rotated.len()];
            if (a.y <= y && b.y > y) || (b.y <= y && a.y > y) {
                xs.push(a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            path.move_to(from_scan(Point::new(pair[0], y)));
            path.line_to(from_scan(Point::new(pair[1], y)));
        }
        y += gap;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape};

    fn square() -> BezPath {
        Rect::new(0.0, 0.0, 100.0, 100.0).to_path(0.1)
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = hand_drawn(&square(), 1.0, 1.0, 42, 0);
        let b = hand_drawn(&square(), 1.0, 1.0, 42, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_passes_differ() {
        let a = hand_drawn(&square(), 1.0, 1.0, 42, 0);
        let b = hand_drawn(&square(), 1.0, 1.0, 42, 1);
        assert_ne!(a, b);
        assert_ne!(pass_seed(42, 0), pass_seed(42, 1));
    }

    #[test]
    fn test_zero_roughness_is_identity() {
        assert_eq!(hand_drawn(&square(), 0.0, 1.0, 7, 0), square());
    }

    #[test]
    fn test_jitter_is_bounded() {
        let rough = hand_drawn(&square(), 1.0, 1.0, 3, 0);
        let bounds = rough.bounding_box();
        assert!(bounds.x0 > -5.0 && bounds.y0 > -5.0);
        assert!(bounds.x1 < 105.0 && bounds.y1 < 105.0);
    }

    #[test]
    fn test_hachure_fills_square() {
        let polygon = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        let lines = hachure_lines(&polygon, 10.0, 0.0);
        let segments = lines
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count();
        assert_eq!(segments, 10);
        let bounds = lines.bounding_box();
        assert!(bounds.x0 >= -1e-9 && bounds.x1 <= 100.0 + 1e-9);

        let angled = hachure_lines(&polygon, 10.0, HACHURE_ANGLE);
        assert!(angled.bounding_box().x0 >= -1e-6);
        assert!(angled.bounding_box().y1 <= 100.0 + 1e-6);
    }

    #[test]
    fn test_hachure_degenerate() {
        assert!(hachure_lines(&[Point::ZERO, Point::new(1.0, 1.0)], 4.0, 0.0).is_empty());
    }
}
