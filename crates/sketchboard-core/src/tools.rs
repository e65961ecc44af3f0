//! Tools, the element factory and the gesture mutators.

use crate::elements::{
    BoxShape, ConnectorShape, ConnectorType, Element, ElementKind, ElementStyle, FontFamily,
    PathShape, SerializableColor, StrokeStyle, TextAlign, TextShape, generate_seed,
};
use crate::geometry::simplify_polyline;
use crate::snap::snap_if;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Tolerance used to simplify freehand strokes on commit.
pub const DRAW_SIMPLIFY_TOLERANCE: f64 = 0.5;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rectangle,
    Diamond,
    Ellipse,
    Line,
    Arrow,
    Connector,
    Draw,
    Text,
    Eraser,
}

impl ToolKind {
    /// Tools that produce an element by press-drag-release.
    pub fn draws_by_drag(self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle
                | ToolKind::Diamond
                | ToolKind::Ellipse
                | ToolKind::Line
                | ToolKind::Arrow
                | ToolKind::Draw
        )
    }

    pub fn creates_elements(self) -> bool {
        self.draws_by_drag() || matches!(self, ToolKind::Connector | ToolKind::Text)
    }
}

/// Style applied to newly created elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolOptions {
    pub stroke_color: SerializableColor,
    pub fill_color: SerializableColor,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub opacity: f64,
    pub sketchy: bool,
    pub sketchy_fill: bool,
    pub roughness: f64,
    pub font_size: f64,
    pub font_family: FontFamily,
    pub align: TextAlign,
    pub text_color: SerializableColor,
    pub connector_type: ConnectorType,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            fill_color: SerializableColor::transparent(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            opacity: 1.0,
            sketchy: true,
            sketchy_fill: false,
            roughness: 1.0,
            font_size: 16.0,
            font_family: FontFamily::Virgil,
            align: TextAlign::Left,
            text_color: SerializableColor::black(),
            connector_type: ConnectorType::Straight,
        }
    }
}

impl ToolOptions {
    /// Element style with a fresh seed.
    pub fn style(&self) -> ElementStyle {
        ElementStyle {
            stroke_color: self.stroke_color,
            fill_color: self.fill_color,
            stroke_width: self.stroke_width,
            stroke_style: self.stroke_style,
            opacity: self.opacity,
            sketchy: self.sketchy,
            sketchy_fill: self.sketchy_fill,
            roughness: self.roughness,
            seed: generate_seed(),
        }
    }
}

/// Create the element a tool starts at `start`. `None` for tools that do not create.
pub fn create_element(tool: ToolKind, start: Point, options: &ToolOptions) -> Option<Element> {
    let empty_box = || BoxShape::default();
    let two_points = || vec![Point::ZERO, Point::ZERO];
    let kind = match tool {
        ToolKind::Rectangle => ElementKind::Rectangle(empty_box()),
        ToolKind::Diamond => ElementKind::Diamond(empty_box()),
        ToolKind::Ellipse => ElementKind::Ellipse(empty_box()),
        ToolKind::Line => ElementKind::Line(PathShape {
            points: two_points(),
        }),
        ToolKind::Arrow => ElementKind::Arrow(PathShape {
            points: two_points(),
        }),
        ToolKind::Connector => ElementKind::Connector(ConnectorShape {
            points: two_points(),
            start_binding: None,
            end_binding: None,
            connector_type: options.connector_type,
            end_arrowhead: true,
        }),
        ToolKind::Draw => ElementKind::Draw(PathShape {
            points: vec![Point::ZERO],
        }),
        ToolKind::Text => ElementKind::Text(TextShape {
            text: String::new(),
            font_size: options.font_size,
            font_family: options.font_family,
            align: options.align,
            color: options.text_color,
            width: None,
            height: 0.0,
        }),
        ToolKind::Select | ToolKind::Pan | ToolKind::Eraser => return None,
    };
    Some(Element::new(kind, start, options.style()))
}

/// Update the element being drawn with the current pointer position.
///
/// `anchor` is the pointer-down position of the gesture.
pub fn update_with_point(element: &mut Element, current: Point, anchor: Point) {
    match &mut element.kind {
        ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
            b.width = (current.x - anchor.x).abs();
            b.height = (current.y - anchor.y).abs();
            element.x = anchor.x.min(current.x);
            element.y = anchor.y.min(current.y);
        }
        ElementKind::Line(_) | ElementKind::Arrow(_) | ElementKind::Connector(_) => {
            element.set_absolute_points(&[anchor, current]);
        }
        ElementKind::Draw(p) => {
            let origin = Point::new(element.x, element.y);
            p.points.push((current - origin).to_point());
        }
        ElementKind::Text(_) => {}
    }
}

/// Commit a drag-drawn element: apply the (optionally grid-snapped) final
/// pointer position and simplify freehand strokes.
pub fn finalize_element(element: &mut Element, last: Point, anchor: Point, grid: Option<f64>) {
    let last = snap_if(last, grid);
    match &element.kind {
        ElementKind::Draw(_) => {
            update_with_point(element, last, anchor);
            if let Some(points) = element.points_mut() {
                *points = simplify_polyline(points, DRAW_SIMPLIFY_TOLERANCE);
            }
        }
        ElementKind::Text(_) => {}
        _ => {
            let anchor = snap_if(anchor, grid);
            update_with_point(element, last, anchor);
        }
    }
}

/// Move the point at `index` to a canvas position.
///
/// Lines, arrows and connectors are re-based so the origin stays at the
/// points' minimum; freehand strokes keep their origin.
pub fn set_point(element: &mut Element, index: usize, canvas_point: Point) -> bool {
    let mut absolute = element.absolute_points();
    let Some(slot) = absolute.get_mut(index) else {
        return false;
    };
    *slot = canvas_point;

    if matches!(element.kind, ElementKind::Draw(_)) {
        let origin = element.origin();
        if let Some(points) = element.points_mut() {
            points[index] = (canvas_point - origin).to_point();
        }
    } else {
        element.set_absolute_points(&absolute);
    }
    true
}

/// Pin the floating point of an in-progress connector and start a new one.
pub fn append_bend_point(element: &mut Element, canvas_point: Point) {
    let mut absolute = element.absolute_points();
    if let Some(last) = absolute.last_mut() {
        *last = canvas_point;
    }
    absolute.push(canvas_point);
    element.set_absolute_points(&absolute);
}

/// Move the floating point of an in-progress connector.
pub fn preview_last_point(element: &mut Element, canvas_point: Point) {
    let mut absolute = element.absolute_points();
    let Some(last) = absolute.last_mut() else {
        return;
    };
    *last = canvas_point;
    element.set_absolute_points(&absolute);
}

/// Finish a multi-click connector: drop trailing duplicate points, keeping at least two.
pub fn finish_connector(element: &mut Element) {
    let mut absolute = element.absolute_points();
    while absolute.len() > 2 {
        let n = absolute.len();
        if (absolute[n - 1] - absolute[n - 2]).hypot() < f64::EPSILON {
            absolute.pop();
        } else {
            break;
        }
    }
    element.set_absolute_points(&absolute);
}
