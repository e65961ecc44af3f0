//! Partial element updates.

use super::{
    Binding, ConnectorType, Element, ElementKind, FontFamily, SerializableColor, StrokeStyle,
    TextAlign,
};
use kurbo::Point;
use serde::{Deserialize, Deserializer, Serialize};

/// Partial update of an element. `None` fields are left untouched.
///
/// Fields that do not apply to the target's kind are ignored, so a single
/// patch can be applied to a mixed selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<StrokeStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketchy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sketchy_fill: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_type: Option<ConnectorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_arrowhead: Option<bool>,
    /// `Some(None)` clears the binding.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub start_binding: Option<Option<Binding>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub end_binding: Option<Option<Binding>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub group_id: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from a missing field.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ElementPatch {
    /// Patch carrying the element's full geometry: position, size, points,
    /// text metrics and bindings.
    pub fn geometry_of(element: &Element) -> Self {
        let mut patch = Self {
            x: Some(element.x),
            y: Some(element.y),
            ..Default::default()
        };
        match &element.kind {
            ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
                patch.width = Some(b.width);
                patch.height = Some(b.height);
                patch.text = Some(b.label.clone().unwrap_or_default());
            }
            ElementKind::Line(p) | ElementKind::Arrow(p) | ElementKind::Draw(p) => {
                patch.points = Some(p.points.clone());
            }
            ElementKind::Connector(c) => {
                patch.points = Some(c.points.clone());
                patch.start_binding = Some(c.start_binding);
                patch.end_binding = Some(c.end_binding);
            }
            ElementKind::Text(t) => {
                patch.text = Some(t.text.clone());
                patch.font_size = Some(t.font_size);
                patch.width = t.width;
                patch.height = Some(t.height);
            }
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch into `element`.
    pub fn apply(&self, element: &mut Element) {
        if let Some(x) = self.x {
            element.x = x;
        }
        if let Some(y) = self.y {
            element.y = y;
        }

        let style = &mut element.style;
        if let Some(color) = self.stroke_color {
            style.stroke_color = color;
        }
        if let Some(color) = self.fill_color {
            style.fill_color = color;
        }
        if let Some(width) = self.stroke_width {
            style.stroke_width = width.max(0.0);
        }
        if let Some(stroke_style) = self.stroke_style {
            style.stroke_style = stroke_style;
        }
        if let Some(opacity) = self.opacity {
            style.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(sketchy) = self.sketchy {
            style.sketchy = sketchy;
        }
        if let Some(sketchy_fill) = self.sketchy_fill {
            style.sketchy_fill = sketchy_fill;
        }
        if let Some(roughness) = self.roughness {
            style.roughness = roughness.max(0.0);
        }
        if let Some(group_id) = &self.group_id {
            element.group_id = group_id.clone();
        }

        match &mut element.kind {
            ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
                if let Some(width) = self.width {
                    b.width = width.max(0.0);
                }
                if let Some(height) = self.height {
                    b.height = height.max(0.0);
                }
                if let Some(text) = &self.text {
                    b.label = (!text.is_empty()).then(|| text.clone());
                }
            }
            ElementKind::Line(p) | ElementKind::Arrow(p) | ElementKind::Draw(p) => {
                if let Some(points) = &self.points {
                    p.points = points.clone();
                }
            }
            ElementKind::Connector(c) => {
                if let Some(points) = &self.points {
                    c.points = points.clone();
                }
                if let Some(binding) = self.start_binding {
                    c.start_binding = binding;
                }
                if let Some(binding) = self.end_binding {
                    c.end_binding = binding;
                }
                if let Some(connector_type) = self.connector_type {
                    c.connector_type = connector_type;
                }
                if let Some(end_arrowhead) = self.end_arrowhead {
                    c.end_arrowhead = end_arrowhead;
                }
            }
            ElementKind::Text(t) => {
                if let Some(text) = &self.text {
                    t.text = text.clone();
                }
                if let Some(font_size) = self.font_size {
                    t.font_size = font_size.max(1.0);
                }
                if let Some(font_family) = self.font_family {
                    t.font_family = font_family;
                }
                if let Some(align) = self.align {
                    t.align = align;
                }
                if let Some(color) = self.color {
                    t.color = color;
                }
                if let Some(width) = self.width {
                    t.width = Some(width.max(0.0));
                }
                if let Some(height) = self.height {
                    t.height = height.max(0.0);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Anchor, BoxShape, ConnectorShape, ElementStyle, PathShape};
    use uuid::Uuid;

    #[test]
    fn test_apply_style_and_size() {
        let mut element = Element::new(
            ElementKind::Ellipse(BoxShape {
                width: 10.0,
                height: 10.0,
                label: None,
            }),
            Point::ZERO,
            ElementStyle::default(),
        );
        let patch = ElementPatch {
            width: Some(40.0),
            fill_color: Some(SerializableColor::rgb(255, 0, 0)),
            opacity: Some(3.0),
            ..Default::default()
        };
        patch.apply(&mut element);

        let b = element.as_box().unwrap();
        assert!((b.width - 40.0).abs() < f64::EPSILON);
        assert!((b.height - 10.0).abs() < f64::EPSILON);
        assert!(element.style.has_fill());
        assert!((element.style.opacity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mismatched_fields_ignored() {
        let mut element = Element::new(
            ElementKind::Line(PathShape {
                points: vec![Point::ZERO, Point::new(5.0, 5.0)],
            }),
            Point::ZERO,
            ElementStyle::default(),
        );
        let before = element.clone();
        ElementPatch {
            font_size: Some(30.0),
            width: Some(99.0),
            ..Default::default()
        }
        .apply(&mut element);
        assert_eq!(element, before);
    }

    #[test]
    fn test_null_clears_binding() {
        let mut element = Element::new(
            ElementKind::Connector(ConnectorShape {
                points: vec![Point::ZERO, Point::new(1.0, 1.0)],
                start_binding: Some(Binding {
                    element_id: Uuid::new_v4(),
                    anchor: Anchor::Top,
                }),
                ..Default::default()
            }),
            Point::ZERO,
            ElementStyle::default(),
        );

        let patch: ElementPatch = serde_json::from_str(r#"{"startBinding": null}"#).unwrap();
        assert_eq!(patch.start_binding, Some(None));
        assert_eq!(patch.end_binding, None);

        patch.apply(&mut element);
        assert!(element.as_connector().unwrap().start_binding.is_none());
    }

    #[test]
    fn test_geometry_of_roundtrip() {
        let mut original = Element::new(
            ElementKind::Rectangle(BoxShape {
                width: 30.0,
                height: 20.0,
                label: Some("hi".into()),
            }),
            Point::new(3.0, 4.0),
            ElementStyle::default(),
        );
        let patch = ElementPatch::geometry_of(&original);

        let mut target = original.clone();
        target.x = 0.0;
        target.as_box_mut().unwrap().width = 1.0;
        patch.apply(&mut target);
        original.style.seed = target.style.seed;
        assert_eq!(target, original);
    }

    #[test]
    fn test_empty_patch() {
        assert!(ElementPatch::default().is_empty());
        assert!(!ElementPatch {
            x: Some(1.0),
            ..Default::default()
        }
        .is_empty());
    }
}
