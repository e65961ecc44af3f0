//! Selection handles and resize mutators.

use crate::elements::{Element, ElementKind};
use crate::geometry::{TextMeasurer, bounds_of, layout_text};
use crate::tools::set_point;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 6.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;
/// Smallest width/height a resize can produce.
pub const MIN_SIZE: f64 = 10.0;
/// Smallest font size a proportional text resize can produce.
pub const MIN_FONT_SIZE: f64 = 8.0;

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Vertex of a line, arrow or connector.
    Point(usize),
    /// Corner of the bounding box.
    Corner(Corner),
    /// Edge midpoint of the bounding box.
    Edge(Edge),
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Which sides of the bounding box a handle moves: (left, right, top, bottom).
fn moved_sides(handle: HandleKind) -> (bool, bool, bool, bool) {
    match handle {
        HandleKind::Corner(Corner::TopLeft) => (true, false, true, false),
        HandleKind::Corner(Corner::TopRight) => (false, true, true, false),
        HandleKind::Corner(Corner::BottomLeft) => (true, false, false, true),
        HandleKind::Corner(Corner::BottomRight) => (false, true, false, true),
        HandleKind::Edge(Edge::Top) => (false, false, true, false),
        HandleKind::Edge(Edge::Right) => (false, true, false, false),
        HandleKind::Edge(Edge::Bottom) => (false, false, false, true),
        HandleKind::Edge(Edge::Left) => (true, false, false, false),
        HandleKind::Point(_) => (false, false, false, false),
    }
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in canvas coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a canvas point hits this handle.
    /// `tolerance` should already be divided by the zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

fn corner_handles(bounds: Rect) -> Vec<Handle> {
    vec![
        Handle::new(Point::new(bounds.x0, bounds.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(bounds.x0, bounds.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(bounds.x1, bounds.y1), HandleKind::Corner(Corner::BottomRight)),
    ]
}

/// Handles of a single selected element.
pub fn handles_for(element: &Element, measurer: &dyn TextMeasurer) -> Vec<Handle> {
    let bounds = bounds_of(element, measurer);
    let center = bounds.center();
    match &element.kind {
        ElementKind::Rectangle(_) | ElementKind::Diamond(_) | ElementKind::Ellipse(_) => {
            let mut handles = corner_handles(bounds);
            handles.extend([
                Handle::new(Point::new(center.x, bounds.y0), HandleKind::Edge(Edge::Top)),
                Handle::new(Point::new(bounds.x1, center.y), HandleKind::Edge(Edge::Right)),
                Handle::new(Point::new(center.x, bounds.y1), HandleKind::Edge(Edge::Bottom)),
                Handle::new(Point::new(bounds.x0, center.y), HandleKind::Edge(Edge::Left)),
            ]);
            handles
        }
        ElementKind::Text(_) => {
            let mut handles = corner_handles(bounds);
            handles.extend([
                Handle::new(Point::new(bounds.x1, center.y), HandleKind::Edge(Edge::Right)),
                Handle::new(Point::new(bounds.x0, center.y), HandleKind::Edge(Edge::Left)),
            ]);
            handles
        }
        ElementKind::Line(_) | ElementKind::Arrow(_) | ElementKind::Connector(_) => element
            .absolute_points()
            .into_iter()
            .enumerate()
            .map(|(i, p)| Handle::new(p, HandleKind::Point(i)))
            .collect(),
        ElementKind::Draw(_) => corner_handles(bounds),
    }
}

/// Corner handles around a multi-selection.
pub fn group_handles(bounds: Rect) -> Vec<Handle> {
    corner_handles(bounds)
}

/// First handle under `point`.
pub fn hit_test_handles(handles: &[Handle], point: Point, tolerance: f64) -> Option<HandleKind> {
    handles
        .iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// The corner that stays put while `corner` is dragged.
fn opposite_corner(rect: Rect, corner: Corner) -> Point {
    match corner {
        Corner::TopLeft => Point::new(rect.x1, rect.y1),
        Corner::TopRight => Point::new(rect.x0, rect.y1),
        Corner::BottomLeft => Point::new(rect.x1, rect.y0),
        Corner::BottomRight => Point::new(rect.x0, rect.y0),
    }
}

/// Move the sides a handle controls, never letting the box shrink below `min`
/// or invert. The opposite sides stay fixed.
fn moved_rect(rect: Rect, handle: HandleKind, delta: Vec2, min: f64) -> Rect {
    let (left, right, top, bottom) = moved_sides(handle);
    let mut out = rect;
    if left {
        out.x0 = (rect.x0 + delta.x).min(rect.x1 - min);
    }
    if right {
        out.x1 = (rect.x1 + delta.x).max(rect.x0 + min);
    }
    if top {
        out.y0 = (rect.y0 + delta.y).min(rect.y1 - min);
    }
    if bottom {
        out.y1 = (rect.y1 + delta.y).max(rect.y0 + min);
    }
    out
}

/// Scale factor along one axis, 1 for degenerate extents.
fn axis_scale(new: f64, old: f64) -> f64 {
    if old.abs() < f64::EPSILON { 1.0 } else { new / old }
}

/// The factor that deviates most from 1.
fn dominant(sx: f64, sy: f64) -> f64 {
    if (sx - 1.0).abs() >= (sy - 1.0).abs() { sx } else { sy }
}

/// Rect scaled by `scale` about the fixed corner opposite `corner`.
fn scaled_about(rect: Rect, corner: Corner, scale: f64) -> Rect {
    let fixed = opposite_corner(rect, corner);
    let far = fixed + (Point::new(rect.x0, rect.y0) - fixed) * scale;
    let near = fixed + (Point::new(rect.x1, rect.y1) - fixed) * scale;
    Rect::from_points(far, near)
}

/// Scale an element about `pivot`. Point-based elements are rescaled point by point.
pub fn scale_element(element: &mut Element, pivot: Point, sx: f64, sy: f64) {
    let origin = element.origin();
    element.x = pivot.x + (origin.x - pivot.x) * sx;
    element.y = pivot.y + (origin.y - pivot.y) * sy;
    match &mut element.kind {
        ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
            b.width *= sx;
            b.height *= sy;
        }
        ElementKind::Line(p) | ElementKind::Arrow(p) | ElementKind::Draw(p) => {
            for point in &mut p.points {
                point.x *= sx;
                point.y *= sy;
            }
        }
        ElementKind::Connector(c) => {
            for point in &mut c.points {
                point.x *= sx;
                point.y *= sy;
            }
        }
        ElementKind::Text(t) => {
            t.font_size = (t.font_size * (sx + sy) / 2.0).max(MIN_FONT_SIZE);
            t.width = t.width.map(|w| w * sx);
            t.height *= sy;
        }
    }
}

/// Resize `original` by dragging `handle` by `delta` (canvas units, measured
/// from the gesture start). `proportional` is the shift modifier.
pub fn resize_element(
    original: &Element,
    handle: HandleKind,
    delta: Vec2,
    proportional: bool,
    measurer: &dyn TextMeasurer,
) -> Element {
    let mut element = original.clone();

    if let HandleKind::Point(index) = handle {
        let absolute = original.absolute_points();
        if let Some(start) = absolute.get(index) {
            set_point(&mut element, index, *start + delta);
        }
        return element;
    }

    let bounds = bounds_of(original, measurer);
    let moved = moved_rect(bounds, handle, delta, MIN_SIZE);

    match &mut element.kind {
        ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
            let target = match handle {
                HandleKind::Corner(corner) if proportional => {
                    let scale = dominant(
                        axis_scale(moved.width(), bounds.width()),
                        axis_scale(moved.height(), bounds.height()),
                    );
                    scaled_about(bounds, corner, scale)
                }
                _ => moved,
            };
            b.width = target.width().max(MIN_SIZE);
            b.height = target.height().max(MIN_SIZE);
            element.x = target.x0;
            element.y = target.y0;
        }
        ElementKind::Text(t) => match handle {
            HandleKind::Corner(corner) if proportional => {
                let scale = dominant(
                    axis_scale(moved.width(), bounds.width()),
                    axis_scale(moved.height(), bounds.height()),
                );
                let font_size = (t.font_size * scale).max(MIN_FONT_SIZE);
                let applied = font_size / t.font_size;
                let target = scaled_about(bounds, corner, applied);
                t.font_size = font_size;
                t.width = t.width.map(|w| w * applied);
                t.height = bounds.height() * applied;
                element.x = target.x0;
                element.y = target.y0;
            }
            _ => {
                // Horizontal drags set the wrap width; height follows the layout.
                if (moved.width() - bounds.width()).abs() > f64::EPSILON {
                    t.width = Some(moved.width());
                    element.x = moved.x0;
                }
                t.height = layout_text(t, measurer).size.height;
            }
        },
        ElementKind::Line(_)
        | ElementKind::Arrow(_)
        | ElementKind::Draw(_)
        | ElementKind::Connector(_) => {
            let (sx, sy) = match handle {
                HandleKind::Corner(_) if proportional => {
                    let s = dominant(
                        axis_scale(moved.width(), bounds.width()),
                        axis_scale(moved.height(), bounds.height()),
                    );
                    (s, s)
                }
                _ => (
                    axis_scale(moved.width(), bounds.width()),
                    axis_scale(moved.height(), bounds.height()),
                ),
            };
            let pivot = match handle {
                HandleKind::Corner(corner) => opposite_corner(bounds, corner),
                _ => Point::new(
                    if moved_sides(handle).0 { bounds.x1 } else { bounds.x0 },
                    if moved_sides(handle).2 { bounds.y1 } else { bounds.y0 },
                ),
            };
            scale_element(&mut element, pivot, sx, sy);
        }
    }
    element
}

/// Resize a multi-selection by dragging a corner of its bounding box.
///
/// Every element is scaled about the fixed opposite corner; with `uniform`
/// both axes use `max(scale_x, scale_y)`.
pub fn group_resize(
    originals: &[Element],
    bounds: Rect,
    corner: Corner,
    delta: Vec2,
    uniform: bool,
) -> Vec<Element> {
    let moved = moved_rect(bounds, HandleKind::Corner(corner), delta, MIN_SIZE);
    let mut sx = axis_scale(moved.width(), bounds.width());
    let mut sy = axis_scale(moved.height(), bounds.height());
    if uniform {
        let s = sx.max(sy);
        sx = s;
        sy = s;
    }
    let pivot = opposite_corner(bounds, corner);

    originals
        .iter()
        .map(|original| {
            let mut element = original.clone();
            scale_element(&mut element, pivot, sx, sy);
            element
        })
        .collect()
}
