//! Element definitions for the board.

mod patch;
mod style;

pub use patch::ElementPatch;
pub use style::{ElementStyle, SerializableColor, StrokeStyle, generate_seed, splitmix32};

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Canonical attachment points on an element's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Bottom,
    Left,
    Right,
    Center,
}

impl Anchor {
    pub const ALL: [Anchor; 5] = [
        Anchor::Top,
        Anchor::Bottom,
        Anchor::Left,
        Anchor::Right,
        Anchor::Center,
    ];
}

/// Attachment of a connector endpoint to another element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub element_id: ElementId,
    pub anchor: Anchor,
}

/// Routing of a connector between its points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorType {
    #[default]
    Straight,
    Curved,
    Orthogonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font families available for text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Hand-drawn style font.
    #[default]
    Virgil,
    Helvetica,
    Cascadia,
}

impl FontFamily {
    /// CSS font stack for this family.
    pub fn css_name(&self) -> &'static str {
        match self {
            FontFamily::Virgil => "Virgil, Segoe UI Emoji, cursive",
            FontFamily::Helvetica => "Helvetica, Arial, sans-serif",
            FontFamily::Cascadia => "Cascadia, Consolas, monospace",
        }
    }
}

/// Geometry of rectangles, diamonds and ellipses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxShape {
    pub width: f64,
    pub height: f64,
    /// Label drawn centered inside the shape.
    #[serde(rename = "text", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Geometry of lines, arrows and freehand strokes. Points are relative to the element origin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathShape {
    pub points: Vec<Point>,
}

/// A polyline whose endpoints can be attached to other elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorShape {
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_binding: Option<Binding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_binding: Option<Binding>,
    #[serde(default)]
    pub connector_type: ConnectorType,
    /// Draw an arrowhead at the last point. Off renders a plain line.
    #[serde(default = "default_arrowhead")]
    pub end_arrowhead: bool,
}

fn default_arrowhead() -> bool {
    true
}

impl Default for ConnectorShape {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            start_binding: None,
            end_binding: None,
            connector_type: ConnectorType::default(),
            end_arrowhead: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShape {
    pub text: String,
    pub font_size: f64,
    #[serde(default)]
    pub font_family: FontFamily,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default = "SerializableColor::black")]
    pub color: SerializableColor,
    /// Wrap width. When set, text is greedily word-wrapped to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Height measured when the last edit was committed.
    #[serde(default)]
    pub height: f64,
}

impl Default for TextShape {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 16.0,
            font_family: FontFamily::Virgil,
            align: TextAlign::Left,
            color: SerializableColor::black(),
            width: None,
            height: 0.0,
        }
    }
}

/// Variant-specific part of an element, tagged by `"type"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle(BoxShape),
    Diamond(BoxShape),
    Ellipse(BoxShape),
    Line(PathShape),
    Arrow(PathShape),
    Connector(ConnectorShape),
    Draw(PathShape),
    Text(TextShape),
}

impl ElementKind {
    /// Wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Rectangle(_) => "rectangle",
            ElementKind::Diamond(_) => "diamond",
            ElementKind::Ellipse(_) => "ellipse",
            ElementKind::Line(_) => "line",
            ElementKind::Arrow(_) => "arrow",
            ElementKind::Connector(_) => "connector",
            ElementKind::Draw(_) => "draw",
            ElementKind::Text(_) => "text",
        }
    }
}

/// A drawable item on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    /// Top-left for box shapes and text, translation offset for point-based shapes.
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub style: ElementStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl Element {
    /// Create an element with a fresh id.
    pub fn new(kind: ElementKind, origin: Point, style: ElementStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: origin.x,
            y: origin.y,
            style,
            group_id: None,
            kind,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.x = origin.x;
        self.y = origin.y;
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Rectangle, diamond or ellipse.
    pub fn is_box(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Rectangle(_) | ElementKind::Diamond(_) | ElementKind::Ellipse(_)
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.kind, ElementKind::Connector(_))
    }

    pub fn as_box(&self) -> Option<&BoxShape> {
        match &self.kind {
            ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
                Some(b)
            }
            _ => None,
        }
    }

    pub fn as_box_mut(&mut self) -> Option<&mut BoxShape> {
        match &mut self.kind {
            ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
                Some(b)
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextShape> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextShape> {
        match &mut self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_connector(&self) -> Option<&ConnectorShape> {
        match &self.kind {
            ElementKind::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_connector_mut(&mut self) -> Option<&mut ConnectorShape> {
        match &mut self.kind {
            ElementKind::Connector(c) => Some(c),
            _ => None,
        }
    }

    /// Relative points of point-based elements.
    pub fn points(&self) -> Option<&[Point]> {
        match &self.kind {
            ElementKind::Line(p) | ElementKind::Arrow(p) | ElementKind::Draw(p) => {
                Some(&p.points)
            }
            ElementKind::Connector(c) => Some(&c.points),
            ElementKind::Rectangle(_)
            | ElementKind::Diamond(_)
            | ElementKind::Ellipse(_)
            | ElementKind::Text(_) => None,
        }
    }

    pub fn points_mut(&mut self) -> Option<&mut Vec<Point>> {
        match &mut self.kind {
            ElementKind::Line(p) | ElementKind::Arrow(p) | ElementKind::Draw(p) => {
                Some(&mut p.points)
            }
            ElementKind::Connector(c) => Some(&mut c.points),
            ElementKind::Rectangle(_)
            | ElementKind::Diamond(_)
            | ElementKind::Ellipse(_)
            | ElementKind::Text(_) => None,
        }
    }

    /// Points in canvas coordinates. Empty for box shapes and text.
    pub fn absolute_points(&self) -> Vec<Point> {
        let offset = self.origin().to_vec2();
        self.points()
            .map(|points| points.iter().map(|p| *p + offset).collect())
            .unwrap_or_default()
    }

    /// Replace the points from canvas coordinates, moving the origin to their minimum.
    pub fn set_absolute_points(&mut self, absolute: &[Point]) {
        let Some(min) = min_point(absolute) else {
            return;
        };
        self.set_origin(min);
        if let Some(points) = self.points_mut() {
            *points = absolute.iter().map(|p| *p - min.to_vec2()).collect();
        }
    }

    /// Move the element. Relative points are untouched.
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Text carried by the element: text content or a box label.
    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text(t) => Some(&t.text),
            ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
                b.label.as_deref()
            }
            _ => None,
        }
    }

    /// Whether any binding end of this connector targets `id`.
    pub fn is_bound_to(&self, id: ElementId) -> bool {
        self.as_connector().is_some_and(|c| {
            c.start_binding.is_some_and(|b| b.element_id == id)
                || c.end_binding.is_some_and(|b| b.element_id == id)
        })
    }
}

/// Component-wise minimum of a point list.
pub(crate) fn min_point(points: &[Point]) -> Option<Point> {
    let first = *points.first()?;
    Some(points.iter().fold(first, |acc, p| {
        Point::new(acc.x.min(p.x), acc.y.min(p.y))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle() -> Element {
        Element::new(
            ElementKind::Rectangle(BoxShape {
                width: 100.0,
                height: 50.0,
                label: None,
            }),
            Point::new(10.0, 20.0),
            ElementStyle::default(),
        )
    }

    #[test]
    fn test_serializes_flat_with_type_tag() {
        let element = rectangle();
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["type"], "rectangle");
        assert_eq!(value["width"], 100.0);
        assert_eq!(value["strokeColor"], "#000000");
        assert_eq!(value["fillColor"], "transparent");
        assert!(value.get("text").is_none());
        assert!(value.get("groupId").is_none());
    }

    #[test]
    fn test_connector_json_roundtrip() {
        let target = Uuid::new_v4();
        let element = Element::new(
            ElementKind::Connector(ConnectorShape {
                points: vec![Point::new(0.0, 0.0), Point::new(40.5, 12.25)],
                start_binding: Some(Binding {
                    element_id: target,
                    anchor: Anchor::Right,
                }),
                end_binding: None,
                connector_type: ConnectorType::Orthogonal,
                end_arrowhead: false,
            }),
            Point::new(5.0, 5.0),
            ElementStyle::default(),
        );

        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains("\"startBinding\""));
        assert!(json.contains("\"connectorType\":\"orthogonal\""));
        assert!(json.contains("\"endArrowhead\":false"));

        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_parse_minimal_text() {
        let json = r##"{
            "id": "6f1c1c1e-8a3e-4d7e-9c1a-2b9f4b1d5e10",
            "type": "text",
            "x": 1, "y": 2,
            "strokeColor": "#000000",
            "strokeWidth": 2,
            "text": "hello",
            "fontSize": 20
        }"##;
        let element: Element = serde_json::from_str(json).unwrap();
        let text = element.as_text().unwrap();
        assert_eq!(text.text, "hello");
        assert_eq!(text.font_family, FontFamily::Virgil);
        assert!(text.width.is_none());
    }

    #[test]
    fn test_absolute_points() {
        let mut element = Element::new(
            ElementKind::Line(PathShape {
                points: vec![Point::ZERO, Point::new(30.0, 40.0)],
            }),
            Point::new(100.0, 100.0),
            ElementStyle::default(),
        );
        assert_eq!(
            element.absolute_points(),
            vec![Point::new(100.0, 100.0), Point::new(130.0, 140.0)]
        );

        element.translate(Vec2::new(-10.0, 5.0));
        assert_eq!(element.points().unwrap()[0], Point::ZERO);
        assert_eq!(element.absolute_points()[1], Point::new(120.0, 145.0));
    }

    #[test]
    fn test_set_absolute_points_rebases() {
        let mut element = Element::new(
            ElementKind::Arrow(PathShape::default()),
            Point::ZERO,
            ElementStyle::default(),
        );
        element.set_absolute_points(&[Point::new(50.0, 10.0), Point::new(20.0, 30.0)]);
        assert_eq!(element.origin(), Point::new(20.0, 10.0));
        assert_eq!(
            element.points().unwrap(),
            &[Point::new(30.0, 0.0), Point::new(0.0, 20.0)]
        );
    }

    #[test]
    fn test_box_accessors() {
        let element = rectangle();
        assert!(element.is_box());
        assert!(element.points().is_none());
        assert!(element.absolute_points().is_empty());
        assert_eq!(element.type_name(), "rectangle");
    }
}
