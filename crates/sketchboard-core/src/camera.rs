//! Canvas view state and the screen/canvas coordinate transform.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom level.
pub const MAX_ZOOM: f64 = 5.0;
/// Zoom factor applied per wheel notch when zooming out.
pub const WHEEL_ZOOM_OUT: f64 = 0.9;
/// Zoom factor applied per wheel notch when zooming in.
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// Color theme of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Persisted view state of a board.
///
/// `pan_x`/`pan_y` are the screen-space offset of the canvas origin and
/// `zoom` is the canvas-to-screen scale, so a canvas point `p` lands on
/// screen at `p * zoom + pan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    #[serde(deserialize_with = "deserialize_zoom")]
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    #[serde(default = "default_true")]
    pub grid_enabled: bool,
    #[serde(default)]
    pub snap_enabled: bool,
    #[serde(default)]
    pub theme: Theme,
}

fn default_true() -> bool {
    true
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
            grid_enabled: true,
            snap_enabled: false,
            theme: Theme::Light,
        }
    }
}

impl CanvasState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen-space pan offset as a vector.
    pub fn pan_offset(&self) -> Vec2 {
        Vec2::new(self.pan_x, self.pan_y)
    }

    /// Canvas-to-screen transform, for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan_offset()) * Affine::scale(self.zoom)
    }

    /// Screen-to-canvas transform, for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan_offset())
    }

    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.pan_x += delta.x;
        self.pan_y += delta.y;
    }

    /// Set the zoom level, clamped to the allowed range. Pan is left alone.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    /// Zoom by `factor`, keeping the canvas point under `screen_point` fixed on screen.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.zoom_to(screen_point, self.zoom * factor);
    }

    /// Zoom to an absolute level around a screen-space pivot.
    pub fn zoom_to(&mut self, screen_point: Point, zoom: f64) {
        let new_zoom = clamp_zoom(zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let canvas_point = self.screen_to_canvas(screen_point);
        self.zoom = new_zoom;

        // Shift pan so the pivot's canvas point maps back onto the pivot
        let moved = self.canvas_to_screen(canvas_point);
        self.pan(screen_point - moved);
    }

    /// Apply one wheel step at the pointer: positive `delta_y` zooms out.
    pub fn wheel_zoom(&mut self, screen_point: Point, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let factor = if delta_y > 0.0 {
            WHEEL_ZOOM_OUT
        } else {
            WHEEL_ZOOM_IN
        };
        self.zoom_at(screen_point, factor);
    }

    /// Reset pan and zoom, keeping grid, snap and theme settings.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }

    /// Pan and zoom so that `bounds` fills the viewport, minus `padding` on each side.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            self.reset();
            return;
        }

        let available = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = available.width / bounds.width();
        let scale_y = available.height / bounds.height();
        self.zoom = clamp_zoom(scale_x.min(scale_y));

        let center = bounds.center();
        self.pan_x = viewport.width / 2.0 - center.x * self.zoom;
        self.pan_y = viewport.height / 2.0 - center.y * self.zoom;
    }

    /// Canvas-space rectangle currently visible in a viewport of the given size.
    pub fn visible_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_canvas(Point::ZERO),
            self.screen_to_canvas(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Merge a partial update; zoom is clamped.
    pub fn apply(&mut self, patch: &CanvasStatePatch) {
        if let Some(zoom) = patch.zoom {
            self.zoom = clamp_zoom(zoom);
        }
        if let Some(pan_x) = patch.pan_x {
            self.pan_x = pan_x;
        }
        if let Some(pan_y) = patch.pan_y {
            self.pan_y = pan_y;
        }
        if let Some(grid) = patch.grid_enabled {
            self.grid_enabled = grid;
        }
        if let Some(snap) = patch.snap_enabled {
            self.snap_enabled = snap;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
    }
}

/// Partial update of a [`CanvasState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasStatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

pub(crate) fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Stored sessions may carry any zoom; bring it back into range on load.
fn deserialize_zoom<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_zoom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = CanvasState::new();
        assert!((state.zoom - 1.0).abs() < f64::EPSILON);
        assert!(state.grid_enabled);
        assert!(!state.snap_enabled);
        assert_eq!(state.theme, Theme::Light);
    }

    #[test]
    fn test_screen_to_canvas_with_pan_and_zoom() {
        let state = CanvasState {
            zoom: 2.0,
            pan_x: 100.0,
            pan_y: 50.0,
            ..Default::default()
        };
        let canvas = state.screen_to_canvas(Point::new(300.0, 250.0));
        assert!((canvas.x - 100.0).abs() < 1e-10);
        assert!((canvas.y - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip() {
        let state = CanvasState {
            zoom: 1.7,
            pan_x: -40.0,
            pan_y: 12.5,
            ..Default::default()
        };
        let p = Point::new(123.0, -456.0);
        let back = state.screen_to_canvas(state.canvas_to_screen(p));
        assert!((back.x - p.x).abs() < 1e-9);
        assert!((back.y - p.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_pivot_fixed() {
        let mut state = CanvasState {
            zoom: 1.3,
            pan_x: 20.0,
            pan_y: -10.0,
            ..Default::default()
        };
        let pivot = Point::new(400.0, 300.0);
        let before = state.screen_to_canvas(pivot);

        state.zoom_at(pivot, 1.5);

        let after = state.canvas_to_screen(before);
        assert!((after.x - pivot.x).abs() < 1e-9);
        assert!((after.y - pivot.y).abs() < 1e-9);
        assert!((state.zoom - 1.95).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut state = CanvasState::new();
        state.zoom_at(Point::ZERO, 100.0);
        assert!((state.zoom - MAX_ZOOM).abs() < f64::EPSILON);

        state.zoom_at(Point::ZERO, 0.0001);
        assert!((state.zoom - MIN_ZOOM).abs() < f64::EPSILON);

        state.set_zoom(f64::NAN);
        assert!((state.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stored_zoom_clamped_on_load() {
        let state: CanvasState =
            serde_json::from_str(r#"{"zoom":0.0,"panX":0.0,"panY":0.0}"#).unwrap();
        assert!((state.zoom - MIN_ZOOM).abs() < f64::EPSILON);
        let p = state.screen_to_canvas(Point::new(10.0, 10.0));
        assert!(p.x.is_finite() && p.y.is_finite());
        assert!((p.x - 100.0).abs() < 1e-9);

        let state: CanvasState =
            serde_json::from_str(r#"{"zoom":100.0,"panX":5.0,"panY":0.0}"#).unwrap();
        assert!((state.zoom - MAX_ZOOM).abs() < f64::EPSILON);
        assert!((state.pan_x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wheel_zoom_direction() {
        let mut state = CanvasState::new();
        state.wheel_zoom(Point::ZERO, 120.0);
        assert!((state.zoom - 0.9).abs() < 1e-12);

        let mut state = CanvasState::new();
        state.wheel_zoom(Point::ZERO, -120.0);
        assert!((state.zoom - 1.1).abs() < 1e-12);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut state = CanvasState::new();
        let bounds = Rect::new(0.0, 0.0, 200.0, 100.0);
        state.fit_to_bounds(bounds, Size::new(800.0, 600.0), 0.0);

        assert!((state.zoom - 4.0).abs() < 1e-9);
        let center = state.canvas_to_screen(bounds.center());
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_visible_rect() {
        let state = CanvasState {
            zoom: 2.0,
            pan_x: 100.0,
            pan_y: 0.0,
            ..Default::default()
        };
        let rect = state.visible_rect(Size::new(800.0, 600.0));
        assert!((rect.x0 + 50.0).abs() < 1e-9);
        assert!((rect.x1 - 350.0).abs() < 1e-9);
        assert!((rect.y1 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_patch_clamps_zoom() {
        let mut state = CanvasState::new();
        state.apply(&CanvasStatePatch {
            zoom: Some(9.0),
            snap_enabled: Some(true),
            ..Default::default()
        });
        assert!((state.zoom - MAX_ZOOM).abs() < f64::EPSILON);
        assert!(state.snap_enabled);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let json = serde_json::to_string(&CanvasState::new()).unwrap();
        assert!(json.contains("\"panX\""));
        assert!(json.contains("\"gridEnabled\""));
        assert!(json.contains("\"theme\":\"light\""));
    }
}
