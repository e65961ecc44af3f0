//! Geometry kernel: bounds, hit-testing, anchors and text layout.

use crate::elements::{Anchor, Element, ElementId, ElementKind, FontFamily, TextShape};
use kurbo::{Point, Rect, Size, Vec2};

/// Minimum pointer distance that counts as a hit on a stroke.
pub const MIN_HIT_DISTANCE: f64 = 8.0;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;
/// Estimated glyph width as a multiple of the font size, used when no metrics are available.
pub const FALLBACK_CHAR_WIDTH: f64 = 0.6;

/// Measures rendered text width.
///
/// Returning `None` means measurement failed and the caller falls back to
/// [`FALLBACK_CHAR_WIDTH`] per character.
pub trait TextMeasurer {
    fn line_width(&self, line: &str, font_size: f64, family: FontFamily) -> Option<f64>;
}

/// Measurer for contexts without font metrics (headless, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMetrics;

impl TextMeasurer for EstimatedMetrics {
    fn line_width(&self, _line: &str, _font_size: f64, _family: FontFamily) -> Option<f64> {
        None
    }
}

/// Width of a single line, with the heuristic fallback applied.
pub fn measure_line(
    measurer: &dyn TextMeasurer,
    line: &str,
    font_size: f64,
    family: FontFamily,
) -> f64 {
    measurer
        .line_width(line, font_size, family)
        .filter(|w| w.is_finite())
        .unwrap_or_else(|| line.chars().count() as f64 * font_size * FALLBACK_CHAR_WIDTH)
}

pub fn line_height(font_size: f64) -> f64 {
    font_size * LINE_HEIGHT_FACTOR
}

/// Laid-out text block.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub line_height: f64,
    pub size: Size,
}

/// Greedy word wrap. Explicit newlines always break; a word wider than
/// `max_width` gets a line of its own.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    font_size: f64,
    family: FontFamily,
    measurer: &dyn TextMeasurer,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if current.is_empty()
                || measure_line(measurer, &candidate, font_size, family) <= max_width
            {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        lines.push(current);
    }
    lines
}

/// Lay out a text element: lines, per-line height and block size.
pub fn layout_text(text: &TextShape, measurer: &dyn TextMeasurer) -> TextLayout {
    let lines: Vec<String> = match text.width {
        Some(wrap) if wrap > 0.0 => {
            wrap_text(&text.text, wrap, text.font_size, text.font_family, measurer)
        }
        _ => text.text.split('\n').map(str::to_string).collect(),
    };
    let widest = lines
        .iter()
        .map(|line| measure_line(measurer, line, text.font_size, text.font_family))
        .fold(0.0, f64::max);
    let width = text.width.filter(|w| *w > 0.0).unwrap_or(widest);
    let line_height = line_height(text.font_size);
    let height = lines.len() as f64 * line_height;
    TextLayout {
        lines,
        line_height,
        size: Size::new(width, height),
    }
}

/// Axis-aligned bounds in canvas coordinates.
pub fn bounds_of(element: &Element, measurer: &dyn TextMeasurer) -> Rect {
    let origin = element.origin();
    match &element.kind {
        ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
            Rect::from_origin_size(origin, Size::new(b.width, b.height))
        }
        ElementKind::Line(_)
        | ElementKind::Arrow(_)
        | ElementKind::Draw(_)
        | ElementKind::Connector(_) => {
            points_bounds(&element.absolute_points())
                .unwrap_or_else(|| Rect::from_origin_size(origin, Size::ZERO))
        }
        ElementKind::Text(t) => Rect::from_origin_size(origin, layout_text(t, measurer).size),
    }
}

/// Bounds of a point list, `None` when empty.
pub fn points_bounds(points: &[Point]) -> Option<Rect> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .fold(Rect::from_points(first, first), |acc, p| acc.union_pt(*p)),
    )
}

/// Inclusive containment: points on the edge count as inside.
pub fn contains_inclusive(rect: Rect, point: Point) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Whether `point` (canvas space) hits the element.
pub fn hit_test(point: Point, element: &Element, measurer: &dyn TextMeasurer) -> bool {
    match &element.kind {
        ElementKind::Rectangle(_)
        | ElementKind::Diamond(_)
        | ElementKind::Ellipse(_)
        | ElementKind::Text(_) => contains_inclusive(bounds_of(element, measurer), point),
        ElementKind::Line(_)
        | ElementKind::Arrow(_)
        | ElementKind::Draw(_)
        | ElementKind::Connector(_) => {
            let threshold = MIN_HIT_DISTANCE.max(element.style.stroke_width);
            let points = element.absolute_points();
            match points.as_slice() {
                [] => false,
                [only] => (point - *only).hypot() <= threshold,
                _ => point_to_polyline_distance(point, &points) <= threshold,
            }
        }
    }
}

/// Distance from a point to the segment `a -> b`.
pub fn point_to_segment_distance(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let projection = a + seg * t;
    (point - projection).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_distance(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_distance(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Rectangle used for anchoring: box geometry, committed text size, or point bounds.
fn anchor_rect(element: &Element) -> Rect {
    match &element.kind {
        ElementKind::Text(t) if t.height > 0.0 => {
            let width = t
                .width
                .unwrap_or_else(|| layout_text(t, &EstimatedMetrics).size.width);
            Rect::from_origin_size(element.origin(), Size::new(width, t.height))
        }
        _ => bounds_of(element, &EstimatedMetrics),
    }
}

/// Canvas position of one of the five anchors of an element.
pub fn anchor_point(element: &Element, anchor: Anchor) -> Point {
    let rect = anchor_rect(element);
    let center = rect.center();
    match anchor {
        Anchor::Top => Point::new(center.x, rect.y0),
        Anchor::Bottom => Point::new(center.x, rect.y1),
        Anchor::Left => Point::new(rect.x0, center.y),
        Anchor::Right => Point::new(rect.x1, center.y),
        Anchor::Center => center,
    }
}

/// Rectangle overlap test; touching edges count as intersecting.
pub fn rect_intersects(a: Rect, b: Rect) -> bool {
    !(a.x1 < b.x0 || a.x0 > b.x1 || a.y1 < b.y0 || a.y0 > b.y1)
}

/// Union of the bounds of the elements whose ids are in `ids`.
/// `None` when no element matches.
pub fn group_bounds<'a>(
    ids: impl IntoIterator<Item = &'a ElementId>,
    elements: &[Element],
    measurer: &dyn TextMeasurer,
) -> Option<Rect> {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for id in ids {
        let Some(element) = elements.iter().find(|e| e.id == *id) else {
            continue;
        };
        let b = bounds_of(element, measurer);
        min = Point::new(min.x.min(b.x0), min.y.min(b.y0));
        max = Point::new(max.x.max(b.x1), max.y.max(b.y1));
    }
    if min.x.is_finite() && max.x.is_finite() {
        Some(Rect::from_points(min, max))
    } else {
        None
    }
}

/// Ramer-Douglas-Peucker polyline simplification. First and last points are kept.
pub fn simplify_polyline(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = simplify_polyline(&points[..=max_index], tolerance);
        let right = simplify_polyline(&points[max_index..], tolerance);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Distance from `point` to the infinite line through `start` and `end`.
fn perpendicular_distance(point: Point, start: Point, end: Point) -> f64 {
    let line: Vec2 = end - start;
    let len = line.hypot();
    if len < f64::EPSILON {
        return (point - start).hypot();
    }
    (point - start).cross(line).abs() / len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{BoxShape, ElementStyle, PathShape};

    fn rect_element(x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::new(
            ElementKind::Rectangle(BoxShape {
                width: w,
                height: h,
                label: None,
            }),
            Point::new(x, y),
            ElementStyle::default(),
        )
    }

    fn line_element(origin: Point, points: Vec<Point>) -> Element {
        Element::new(
            ElementKind::Line(PathShape { points }),
            origin,
            ElementStyle::default(),
        )
    }

    fn text_element(text: &str, width: Option<f64>) -> Element {
        Element::new(
            ElementKind::Text(TextShape {
                text: text.to_string(),
                font_size: 10.0,
                width,
                ..Default::default()
            }),
            Point::new(0.0, 0.0),
            ElementStyle::default(),
        )
    }

    /// Fixed-width metrics for predictable layouts.
    struct Monospace(f64);

    impl TextMeasurer for Monospace {
        fn line_width(&self, line: &str, _font_size: f64, _family: FontFamily) -> Option<f64> {
            Some(line.chars().count() as f64 * self.0)
        }
    }

    #[test]
    fn test_box_bounds() {
        let b = bounds_of(&rect_element(10.0, 20.0, 30.0, 40.0), &EstimatedMetrics);
        assert_eq!(b, Rect::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_point_bounds_include_origin() {
        let line = line_element(
            Point::new(100.0, 100.0),
            vec![Point::ZERO, Point::new(-20.0, 30.0)],
        );
        assert_eq!(
            bounds_of(&line, &EstimatedMetrics),
            Rect::new(80.0, 100.0, 100.0, 130.0)
        );
    }

    #[test]
    fn test_empty_points_bounds() {
        let line = line_element(Point::new(5.0, 6.0), vec![]);
        let b = bounds_of(&line, &EstimatedMetrics);
        assert!(b.width().abs() < f64::EPSILON);
        assert_eq!(b.origin(), Point::new(5.0, 6.0));
    }

    #[test]
    fn test_text_bounds_fallback_metrics() {
        let b = bounds_of(&text_element("abcd\nab", None), &EstimatedMetrics);
        // 4 chars * 10 * 0.6, two lines of 12
        assert!((b.width() - 24.0).abs() < 1e-9);
        assert!((b.height() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_wrap() {
        let lines = wrap_text("one two three", 7.0, 10.0, FontFamily::Virgil, &Monospace(1.0));
        assert_eq!(lines, vec!["one two", "three"]);

        let lines = wrap_text("a\n\nb", 100.0, 10.0, FontFamily::Virgil, &Monospace(1.0));
        assert_eq!(lines, vec!["a", "", "b"]);

        let layout = layout_text(
            text_element("one two three", Some(7.0)).as_text().unwrap(),
            &Monospace(1.0),
        );
        assert_eq!(layout.lines.len(), 2);
        assert!((layout.size.width - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_box_hit_inclusive() {
        let rect = rect_element(0.0, 0.0, 100.0, 50.0);
        assert!(hit_test(Point::new(100.0, 50.0), &rect, &EstimatedMetrics));
        assert!(hit_test(Point::new(0.0, 0.0), &rect, &EstimatedMetrics));
        assert!(!hit_test(Point::new(100.1, 25.0), &rect, &EstimatedMetrics));
    }

    #[test]
    fn test_box_center_always_hits() {
        let sizes = [(100.0, 50.0), (3.0, 400.0), (0.0, 0.0), (-40.0, 20.0)];
        for (w, h) in sizes {
            let shape = BoxShape {
                width: w,
                height: h,
                label: None,
            };
            let kinds = [
                ElementKind::Rectangle(shape.clone()),
                ElementKind::Ellipse(shape.clone()),
                ElementKind::Diamond(shape),
            ];
            for kind in kinds {
                let element = Element::new(kind, Point::new(-30.0, 12.5), ElementStyle::default());
                let center = Point::new(-30.0 + w / 2.0, 12.5 + h / 2.0);
                assert!(
                    hit_test(center, &element, &EstimatedMetrics),
                    "{} {w}x{h} missed its center",
                    element.type_name()
                );
            }
        }
    }

    #[test]
    fn test_stroke_hit_threshold() {
        let line = line_element(Point::ZERO, vec![Point::ZERO, Point::new(100.0, 0.0)]);
        assert!(hit_test(Point::new(50.0, 8.0), &line, &EstimatedMetrics));
        assert!(!hit_test(Point::new(50.0, 8.5), &line, &EstimatedMetrics));

        let mut thick = line.clone();
        thick.style.stroke_width = 12.0;
        assert!(hit_test(Point::new(50.0, 11.0), &thick, &EstimatedMetrics));
    }

    #[test]
    fn test_single_point_hit() {
        let dot = line_element(Point::new(10.0, 10.0), vec![Point::ZERO]);
        assert!(hit_test(Point::new(14.0, 10.0), &dot, &EstimatedMetrics));
        assert!(!hit_test(Point::new(30.0, 10.0), &dot, &EstimatedMetrics));
    }

    #[test]
    fn test_segment_distance_clamps_projection() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((point_to_segment_distance(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        assert!((point_to_segment_distance(Point::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        assert!((point_to_segment_distance(Point::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_anchor_points() {
        let rect = rect_element(0.0, 0.0, 100.0, 50.0);
        assert_eq!(anchor_point(&rect, Anchor::Top), Point::new(50.0, 0.0));
        assert_eq!(anchor_point(&rect, Anchor::Bottom), Point::new(50.0, 50.0));
        assert_eq!(anchor_point(&rect, Anchor::Left), Point::new(0.0, 25.0));
        assert_eq!(anchor_point(&rect, Anchor::Right), Point::new(100.0, 25.0));
        assert_eq!(anchor_point(&rect, Anchor::Center), Point::new(50.0, 25.0));
    }

    #[test]
    fn test_rect_intersects_touching() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect_intersects(a, Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(rect_intersects(a, Rect::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!rect_intersects(a, Rect::new(10.5, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_group_bounds() {
        let a = rect_element(0.0, 0.0, 10.0, 10.0);
        let b = rect_element(50.0, 20.0, 10.0, 30.0);
        let ids = [a.id, b.id];
        let elements = vec![a, b];
        assert_eq!(
            group_bounds(&ids, &elements, &EstimatedMetrics),
            Some(Rect::new(0.0, 0.0, 60.0, 50.0))
        );
        assert_eq!(group_bounds(&[] as &[ElementId], &elements, &EstimatedMetrics), None);
    }

    #[test]
    fn test_simplify_removes_collinear() {
        let points: Vec<Point> = (0..=10).map(|i| Point::new(i as f64, 0.0)).collect();
        let simplified = simplify_polyline(&points, 0.5);
        assert_eq!(simplified, vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);

        let corner = vec![Point::ZERO, Point::new(5.0, 0.0), Point::new(5.0, 5.0)];
        assert_eq!(simplify_polyline(&corner, 0.5).len(), 3);
    }
}
