//! Connector binding: attaching connector endpoints to element anchors and
//! keeping them attached when the targets move.

use crate::elements::{Anchor, Binding, Element, ElementId};
use crate::geometry::anchor_point;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Maximum distance (canvas units) from an endpoint to an anchor for a binding to form.
pub const BINDING_THRESHOLD: f64 = 20.0;

/// What happens to bindings whose target is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrphanBindingPolicy {
    /// Leave the reference in place; the resolver skips it.
    #[default]
    KeepStale,
    /// Remove the reference from the connector.
    Clear,
}

/// Nearest anchor of any box shape within `threshold` of `point`.
pub fn nearest_anchor(
    point: Point,
    elements: &[Element],
    exclude: Option<ElementId>,
    threshold: f64,
) -> Option<Binding> {
    let mut best: Option<(f64, Binding)> = None;
    for element in elements.iter().filter(|e| e.is_box()) {
        if Some(element.id) == exclude {
            continue;
        }
        for anchor in Anchor::ALL {
            let distance = (anchor_point(element, anchor) - point).hypot();
            if distance > threshold {
                continue;
            }
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((
                    distance,
                    Binding {
                        element_id: element.id,
                        anchor,
                    },
                ));
            }
        }
    }
    best.map(|(_, binding)| binding)
}

/// Bind both endpoints of a connector to the nearest anchors, then snap the
/// endpoints onto them. Endpoints out of range stay unbound.
pub fn bind_connector(connector: &mut Element, elements: &[Element], threshold: f64) {
    let absolute = connector.absolute_points();
    let (Some(first), Some(last)) = (absolute.first().copied(), absolute.last().copied()) else {
        return;
    };
    let own_id = Some(connector.id);
    let start = nearest_anchor(first, elements, own_id, threshold);
    let end = nearest_anchor(last, elements, own_id, threshold);

    if let Some(shape) = connector.as_connector_mut() {
        shape.start_binding = start;
        shape.end_binding = end;
    }
    if start.is_some() || end.is_some() {
        resolve_connector(connector, elements);
    }
}

/// Re-place a connector's bound endpoints on their targets' anchors.
///
/// Missing targets are skipped and their bindings left in place. Returns
/// whether any geometry changed.
pub fn resolve_connector(connector: &mut Element, elements: &[Element]) -> bool {
    let Some(shape) = connector.as_connector() else {
        return false;
    };
    let (start, end) = (shape.start_binding, shape.end_binding);
    let mut absolute = connector.absolute_points();
    if absolute.is_empty() {
        return false;
    }

    let mut changed = false;
    let last = absolute.len() - 1;
    for (binding, index) in [(start, 0), (end, last)] {
        let Some(binding) = binding else {
            continue;
        };
        let Some(target) = elements.iter().find(|e| e.id == binding.element_id) else {
            log::debug!(
                "connector {} bound to missing element {}",
                connector.id,
                binding.element_id
            );
            continue;
        };
        let anchor = anchor_point(target, binding.anchor);
        if absolute[index] != anchor {
            absolute[index] = anchor;
            changed = true;
        }
    }

    if changed {
        connector.set_absolute_points(&absolute);
    }
    changed
}

/// Re-resolve every connector bound to `moved`. Returns the ids of the
/// connectors whose geometry changed.
pub fn resolve_bindings_for(moved: ElementId, elements: &mut [Element]) -> Vec<ElementId> {
    let bound: Vec<usize> = elements
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_bound_to(moved))
        .map(|(i, _)| i)
        .collect();

    let mut updated = Vec::new();
    for index in bound {
        let mut connector = elements[index].clone();
        if resolve_connector(&mut connector, elements) {
            updated.push(connector.id);
            elements[index] = connector;
        }
    }
    updated
}

/// Drop every binding that references `deleted`. Returns the ids of the
/// connectors that changed. Geometry is left where it was.
pub fn clear_bindings_to(deleted: ElementId, elements: &mut [Element]) -> Vec<ElementId> {
    let mut updated = Vec::new();
    for element in elements.iter_mut() {
        let id = element.id;
        let Some(shape) = element.as_connector_mut() else {
            continue;
        };
        let mut touched = false;
        if shape.start_binding.is_some_and(|b| b.element_id == deleted) {
            shape.start_binding = None;
            touched = true;
        }
        if shape.end_binding.is_some_and(|b| b.element_id == deleted) {
            shape.end_binding = None;
            touched = true;
        }
        if touched {
            updated.push(id);
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{BoxShape, ConnectorShape, ElementKind, ElementStyle};
    use kurbo::Vec2;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Element {
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

    fn connector(from: Point, to: Point) -> Element {
        let mut element = Element::new(
            ElementKind::Connector(ConnectorShape::default()),
            Point::ZERO,
            ElementStyle::default(),
        );
        element.set_absolute_points(&[from, to]);
        element
    }

    #[test]
    fn test_nearest_anchor_within_threshold() {
        let target = rect(0.0, 0.0, 100.0, 100.0);
        let elements = vec![target.clone()];

        let binding = nearest_anchor(Point::new(105.0, 52.0), &elements, None, BINDING_THRESHOLD);
        assert_eq!(
            binding,
            Some(Binding {
                element_id: target.id,
                anchor: Anchor::Right
            })
        );
        assert_eq!(
            nearest_anchor(Point::new(150.0, 50.0), &elements, None, BINDING_THRESHOLD),
            None
        );
    }

    #[test]
    fn test_nearest_anchor_ignores_non_boxes() {
        let line = connector(Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(
            nearest_anchor(Point::ZERO, &[line], None, BINDING_THRESHOLD),
            None
        );
    }

    #[test]
    fn test_bind_connector_snaps_endpoints() {
        let a = rect(0.0, 0.0, 100.0, 100.0);
        let b = rect(300.0, 0.0, 100.0, 100.0);
        let elements = vec![a.clone(), b.clone()];
        let mut c = connector(Point::new(110.0, 45.0), Point::new(290.0, 55.0));

        bind_connector(&mut c, &elements, BINDING_THRESHOLD);

        let shape = c.as_connector().unwrap();
        assert_eq!(shape.start_binding.unwrap().element_id, a.id);
        assert_eq!(shape.end_binding.unwrap().anchor, Anchor::Left);
        assert_eq!(
            c.absolute_points(),
            vec![Point::new(100.0, 50.0), Point::new(300.0, 50.0)]
        );
    }

    #[test]
    fn test_resolver_follows_moved_target() {
        let a = rect(0.0, 0.0, 100.0, 100.0);
        let b = rect(300.0, 0.0, 100.0, 100.0);
        let mut c = connector(Point::new(100.0, 50.0), Point::new(300.0, 50.0));
        if let Some(shape) = c.as_connector_mut() {
            shape.start_binding = Some(Binding {
                element_id: a.id,
                anchor: Anchor::Right,
            });
            shape.end_binding = Some(Binding {
                element_id: b.id,
                anchor: Anchor::Left,
            });
        }
        let a_id = a.id;
        let c_id = c.id;
        let mut elements = vec![a, b, c];

        elements[0].translate(Vec2::new(-50.0, 200.0));
        let updated = resolve_bindings_for(a_id, &mut elements);

        assert_eq!(updated, vec![c_id]);
        let connector = &elements[2];
        assert_eq!(
            connector.absolute_points(),
            vec![Point::new(50.0, 250.0), Point::new(300.0, 50.0)]
        );
        // origin sits at the points' minimum, first point relative to it
        assert_eq!(connector.origin(), Point::new(50.0, 50.0));
        assert_eq!(connector.points().unwrap()[0], Point::new(0.0, 200.0));
    }

    #[test]
    fn test_both_ends_on_same_element() {
        let a = rect(0.0, 0.0, 100.0, 100.0);
        let mut c = connector(Point::new(50.0, 0.0), Point::new(50.0, 100.0));
        if let Some(shape) = c.as_connector_mut() {
            shape.start_binding = Some(Binding {
                element_id: a.id,
                anchor: Anchor::Top,
            });
            shape.end_binding = Some(Binding {
                element_id: a.id,
                anchor: Anchor::Bottom,
            });
        }
        let a_id = a.id;
        let mut elements = vec![a, c];
        elements[0].translate(Vec2::new(10.0, 10.0));
        resolve_bindings_for(a_id, &mut elements);
        assert_eq!(
            elements[1].absolute_points(),
            vec![Point::new(60.0, 10.0), Point::new(60.0, 110.0)]
        );
    }

    #[test]
    fn test_missing_target_is_skipped() {
        let mut c = connector(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        if let Some(shape) = c.as_connector_mut() {
            shape.start_binding = Some(Binding {
                element_id: ElementId::new_v4(),
                anchor: Anchor::Top,
            });
        }
        let before = c.clone();
        assert!(!resolve_connector(&mut c, &[]));
        assert_eq!(c, before);
    }

    #[test]
    fn test_clear_bindings_to() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let mut c = connector(Point::ZERO, Point::new(50.0, 0.0));
        if let Some(shape) = c.as_connector_mut() {
            shape.end_binding = Some(Binding {
                element_id: a.id,
                anchor: Anchor::Center,
            });
        }
        let points = c.absolute_points();
        let mut elements = vec![c];
        let updated = clear_bindings_to(a.id, &mut elements);
        assert_eq!(updated, vec![elements[0].id]);
        assert!(elements[0].as_connector().unwrap().end_binding.is_none());
        assert_eq!(elements[0].absolute_points(), points);
    }
}
