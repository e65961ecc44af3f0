//! Element and scene drawing.

use crate::rough::{HACHURE_ANGLE, hachure_lines, hand_drawn};
use crate::surface::{Surface, TextStyle};
use kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect, Shape, Size};
use peniko::Color;
use sketchboard_core::board::Board;
use sketchboard_core::camera::{CanvasState, Theme};
use sketchboard_core::elements::{
    ConnectorShape, ConnectorType, Element, ElementId, ElementKind, ElementStyle, FontFamily,
    SerializableColor, TextAlign,
};
use sketchboard_core::geometry::{bounds_of, layout_text, line_height, measure_line, wrap_text};
use sketchboard_core::interaction::Interaction;
use sketchboard_core::resize::{HANDLE_SIZE, group_handles, handles_for};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Nothing to render")]
    EmptyScene,
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

pub const ARROWHEAD_LENGTH: f64 = 10.0;
/// Angle between an arrowhead stroke and the shaft.
pub const ARROWHEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;
/// Radius of the dot drawn on bound connector endpoints.
pub const BINDING_MARKER_RADIUS: f64 = 4.0;
pub const LABEL_FONT_SIZE: f64 = 16.0;
const LABEL_PADDING: f64 = 5.0;
/// Segments used to approximate an ellipse for hachure filling.
const ELLIPSE_SEGMENTS: usize = 36;

pub const SELECTION_COLOR: Color = Color::from_rgba8(0x00, 0x7B, 0xFF, 0xFF);
const MARQUEE_FILL: Color = Color::from_rgba8(0x00, 0x7B, 0xFF, 0x1A);
/// Selection outline dash, screen pixels.
const SELECTION_DASH: f64 = 5.0;

/// Theme-dependent drawing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleContext {
    pub theme: Theme,
    pub zoom: f64,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            zoom: 1.0,
        }
    }
}

impl StyleContext {
    pub fn for_canvas(canvas: &CanvasState) -> Self {
        Self {
            theme: canvas.theme,
            zoom: canvas.zoom,
        }
    }

    pub fn background(&self) -> Color {
        match self.theme {
            Theme::Light => Color::from_rgba8(250, 250, 250, 255),
            Theme::Dark => Color::from_rgba8(18, 18, 18, 255),
        }
    }

    fn grid_color(&self) -> Color {
        match self.theme {
            Theme::Light => Color::from_rgba8(200, 200, 200, 100),
            Theme::Dark => Color::from_rgba8(80, 80, 80, 100),
        }
    }

    /// Map an element color for the theme. Dark mode swaps black ink for
    /// near-white so default drawings stay visible.
    pub fn ink(&self, color: SerializableColor) -> Color {
        match self.theme {
            Theme::Dark if color.r < 0x20 && color.g < 0x20 && color.b < 0x20 => {
                Color::from_rgba8(0xE9, 0xEC, 0xEF, color.a)
            }
            _ => color.into(),
        }
    }
}

fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}

fn closed_polygon(points: &[Point]) -> BezPath {
    let mut path = polyline(points);
    if !points.is_empty() {
        path.close_path();
    }
    path
}

fn diamond_points(rect: Rect) -> [Point; 4] {
    let c = rect.center();
    [
        Point::new(c.x, rect.y0),
        Point::new(rect.x1, c.y),
        Point::new(c.x, rect.y1),
        Point::new(rect.x0, c.y),
    ]
}

fn ellipse_points(rect: Rect) -> Vec<Point> {
    let c = rect.center();
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = i as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
            Point::new(c.x + rx * t.cos(), c.y + ry * t.sin())
        })
        .collect()
}

/// Quadratic midpoint smoothing for freehand strokes with three or more points.
pub fn smooth_path(points: &[Point]) -> BezPath {
    if points.len() < 3 {
        return polyline(points);
    }
    let mut path = BezPath::new();
    path.move_to(points[0]);
    for pair in points[1..].windows(2) {
        path.quad_to(pair[0], pair[0].midpoint(pair[1]));
    }
    if let Some(last) = points.last() {
        path.line_to(*last);
    }
    path
}

/// Catmull-Rom spline through the points, as cubic segments.
fn catmull_rom(points: &[Point]) -> BezPath {
    if points.len() < 3 {
        return polyline(points);
    }
    let mut path = BezPath::new();
    path.move_to(points[0]);
    let n = points.len();
    for i in 0..n - 1 {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(n - 1)];
        let c1 = p1 + (p2 - p0) / 6.0;
        let c2 = p2 - (p3 - p1) / 6.0;
        path.curve_to(c1, c2, p2);
    }
    path
}

/// Horizontal-then-vertical elbows between consecutive points.
fn orthogonal_points(points: &[Point]) -> Vec<Point> {
    let mut routed = Vec::with_capacity(points.len() * 2);
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            let prev = points[i - 1];
            if prev.x != p.x && prev.y != p.y {
                routed.push(Point::new(p.x, prev.y));
            }
        }
        routed.push(*p);
    }
    routed
}

/// Connector path and the two points defining its final direction.
fn connector_route(shape: &ConnectorShape, points: &[Point]) -> (BezPath, Option<(Point, Point)>) {
    let tail = |pts: &[Point]| match pts {
        [.., a, b] => Some((*a, *b)),
        _ => None,
    };
    match shape.connector_type {
        ConnectorType::Straight => (polyline(points), tail(points)),
        ConnectorType::Curved => (catmull_rom(points), tail(points)),
        ConnectorType::Orthogonal => {
            let routed = orthogonal_points(points);
            let direction = tail(&routed);
            (polyline(&routed), direction)
        }
    }
}

/// Two strokes at ±30 degrees from the shaft, meeting at `tip`.
pub fn arrowhead(from: Point, tip: Point) -> Option<BezPath> {
    let d = tip - from;
    if d.hypot() < f64::EPSILON {
        return None;
    }
    let angle = d.y.atan2(d.x);
    let wing = |a: f64| {
        Point::new(
            tip.x - ARROWHEAD_LENGTH * a.cos(),
            tip.y - ARROWHEAD_LENGTH * a.sin(),
        )
    };
    let mut path = BezPath::new();
    path.move_to(wing(angle - ARROWHEAD_ANGLE));
    path.line_to(tip);
    path.line_to(wing(angle + ARROWHEAD_ANGLE));
    Some(path)
}

/// Stroke a path, twice with independent jitter in sketchy mode.
fn stroke_outline(
    surface: &mut dyn Surface,
    path: &BezPath,
    style: &ElementStyle,
    color: Color,
    ctx: &StyleContext,
) {
    if style.is_rough() {
        for pass in 0..2 {
            let rough = hand_drawn(path, style.roughness, ctx.zoom, style.seed, pass);
            surface.stroke_path(&rough, color, style.stroke_width);
        }
    } else {
        surface.stroke_path(path, color, style.stroke_width);
    }
}

/// Fill a closed shape: solid, or hachure lines when `sketchy_fill` is set.
fn fill_outline(
    surface: &mut dyn Surface,
    outline: &BezPath,
    polygon: &[Point],
    style: &ElementStyle,
    ctx: &StyleContext,
) {
    if !style.has_fill() {
        return;
    }
    let color = ctx.ink(style.fill_color);
    if style.sketchy_fill {
        let gap = (style.stroke_width * 4.0).max(4.0);
        let lines = hachure_lines(polygon, gap, HACHURE_ANGLE);
        let lines = if style.is_rough() {
            hand_drawn(&lines, style.roughness * 0.5, ctx.zoom, style.seed, 2)
        } else {
            lines
        };
        surface.stroke_path(&lines, color, (style.stroke_width / 2.0).max(1.0));
    } else {
        surface.fill_path(outline, color);
    }
}

/// Zero-length geometry still shows up as a dot.
fn draw_dot(surface: &mut dyn Surface, center: Point, style: &ElementStyle, ctx: &StyleContext) {
    let radius = (style.stroke_width / 2.0).max(0.5);
    surface.fill_path(&Circle::new(center, radius).to_path(0.1), ctx.ink(style.stroke_color));
}

fn is_degenerate(points: &[Point]) -> bool {
    points.windows(2).all(|w| w[0] == w[1])
}

fn draw_box_label(surface: &mut dyn Surface, rect: Rect, label: &str, color: Color) {
    let family = FontFamily::Virgil;
    let wrap = (rect.width() - LABEL_PADDING * 2.0).max(LABEL_FONT_SIZE);
    let lines = wrap_text(label, wrap, LABEL_FONT_SIZE, family, &*surface);
    let lh = line_height(LABEL_FONT_SIZE);
    let center = rect.center();
    let top = center.y - lines.len() as f64 * lh / 2.0;
    let style = TextStyle {
        font_size: LABEL_FONT_SIZE,
        family,
        color,
        align: TextAlign::Center,
    };
    for (i, line) in lines.iter().enumerate() {
        let width = measure_line(&*surface, line, LABEL_FONT_SIZE, family);
        let origin = Point::new(center.x - width / 2.0, top + i as f64 * lh);
        surface.fill_text(line, origin, &style);
    }
}

/// Draw one element.
pub fn draw_element(surface: &mut dyn Surface, element: &Element, ctx: &StyleContext) {
    draw_element_inner(surface, element, ctx, true);
}

fn draw_element_inner(
    surface: &mut dyn Surface,
    element: &Element,
    ctx: &StyleContext,
    with_label: bool,
) {
    let style = &element.style;
    let stroke = ctx.ink(style.stroke_color);
    surface.set_alpha(style.opacity.clamp(0.0, 1.0));
    surface.set_dash(&[]);

    match &element.kind {
        ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
            let rect = Rect::from_origin_size(element.origin(), Size::new(b.width, b.height));
            let (outline, polygon) = match &element.kind {
                ElementKind::Diamond(_) => {
                    let corners = diamond_points(rect);
                    (closed_polygon(&corners), corners.to_vec())
                }
                ElementKind::Ellipse(_) => {
                    (Ellipse::from_rect(rect).to_path(0.1), ellipse_points(rect))
                }
                _ => {
                    let corners = vec![
                        Point::new(rect.x0, rect.y0),
                        Point::new(rect.x1, rect.y0),
                        Point::new(rect.x1, rect.y1),
                        Point::new(rect.x0, rect.y1),
                    ];
                    (closed_polygon(&corners), corners)
                }
            };
            fill_outline(surface, &outline, &polygon, style, ctx);
            surface.set_dash(style.stroke_style.dash_pattern());
            stroke_outline(surface, &outline, style, stroke, ctx);
            if with_label {
                if let Some(label) = b.label.as_deref().filter(|l| !l.trim().is_empty()) {
                    surface.set_dash(&[]);
                    draw_box_label(surface, rect, label, stroke);
                }
            }
        }
        ElementKind::Line(_) | ElementKind::Arrow(_) => {
            let points = element.absolute_points();
            if is_degenerate(&points) {
                if let Some(p) = points.first() {
                    draw_dot(surface, *p, style, ctx);
                }
            } else {
                surface.set_dash(style.stroke_style.dash_pattern());
                stroke_outline(surface, &polyline(&points), style, stroke, ctx);
                if matches!(element.kind, ElementKind::Arrow(_)) {
                    if let [.., from, tip] = points[..] {
                        if let Some(head) = arrowhead(from, tip) {
                            surface.set_dash(&[]);
                            stroke_outline(surface, &head, style, stroke, ctx);
                        }
                    }
                }
            }
        }
        ElementKind::Connector(shape) => {
            let points = element.absolute_points();
            if is_degenerate(&points) {
                if let Some(p) = points.first() {
                    draw_dot(surface, *p, style, ctx);
                }
            } else {
                let (path, direction) = connector_route(shape, &points);
                surface.set_dash(style.stroke_style.dash_pattern());
                stroke_outline(surface, &path, style, stroke, ctx);
                surface.set_dash(&[]);
                let head = direction.filter(|_| shape.end_arrowhead);
                if let Some(head) = head.and_then(|(from, tip)| arrowhead(from, tip)) {
                    stroke_outline(surface, &head, style, stroke, ctx);
                }
                let ends = [
                    (shape.start_binding.is_some(), points.first()),
                    (shape.end_binding.is_some(), points.last()),
                ];
                for (bound, point) in ends {
                    if let (true, Some(p)) = (bound, point) {
                        let marker = Circle::new(*p, BINDING_MARKER_RADIUS).to_path(0.1);
                        surface.fill_path(&marker, stroke);
                    }
                }
            }
        }
        ElementKind::Draw(_) => {
            let points = element.absolute_points();
            if is_degenerate(&points) {
                if let Some(p) = points.first() {
                    draw_dot(surface, *p, style, ctx);
                }
            } else {
                surface.set_dash(style.stroke_style.dash_pattern());
                surface.stroke_path(&smooth_path(&points), stroke, style.stroke_width);
            }
        }
        ElementKind::Text(t) => {
            let layout = layout_text(t, &*surface);
            let origin = element.origin();
            let text_style = TextStyle {
                font_size: t.font_size,
                family: t.font_family,
                color: ctx.ink(t.color),
                align: t.align,
            };
            for (i, line) in layout.lines.iter().enumerate() {
                let width = measure_line(&*surface, line, t.font_size, t.font_family);
                let dx = match t.align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => (layout.size.width - width) / 2.0,
                    TextAlign::Right => layout.size.width - width,
                };
                let position = Point::new(origin.x + dx, origin.y + i as f64 * layout.line_height);
                surface.fill_text(line, position, &text_style);
            }
        }
    }

    surface.set_dash(&[]);
    surface.set_alpha(1.0);
}

fn handle_path(center: Point, size: f64) -> BezPath {
    Rect::from_center_size(center, Size::new(size, size)).to_path(0.1)
}

/// Dashed bounds and handles around the selection. Draws nothing for an
/// empty selection.
pub fn draw_selection_overlay(surface: &mut dyn Surface, board: &Board, zoom: f64) {
    let ids = board.selected_ids();
    let (bounds, handles) = match ids.as_slice() {
        [] => return,
        [id] => {
            let Some(element) = board.element(*id) else {
                return;
            };
            (
                bounds_of(element, board.measurer()),
                handles_for(element, board.measurer()),
            )
        }
        _ => {
            let Some(bounds) = board.selection_bounds() else {
                return;
            };
            (bounds, group_handles(bounds))
        }
    };

    let zoom = zoom.max(f64::EPSILON);
    surface.set_alpha(1.0);
    surface.set_dash(&[SELECTION_DASH / zoom, SELECTION_DASH / zoom]);
    surface.stroke_path(&bounds.to_path(0.1), SELECTION_COLOR, 1.0 / zoom);

    surface.set_dash(&[]);
    let size = HANDLE_SIZE / zoom;
    for handle in handles {
        let path = handle_path(handle.position, size);
        surface.fill_path(&path, Color::WHITE);
        surface.stroke_path(&path, SELECTION_COLOR, 1.0 / zoom);
    }
}

/// Marquee rectangle: translucent fill and a dashed outline.
pub fn draw_marquee(surface: &mut dyn Surface, rect: Rect, zoom: f64) {
    let zoom = zoom.max(f64::EPSILON);
    let path = rect.to_path(0.1);
    surface.set_alpha(1.0);
    surface.set_dash(&[]);
    surface.fill_path(&path, MARQUEE_FILL);
    surface.set_dash(&[SELECTION_DASH / zoom, SELECTION_DASH / zoom]);
    surface.stroke_path(&path, SELECTION_COLOR, 1.0 / zoom);
    surface.set_dash(&[]);
}

/// Grid lines covering the visible part of the canvas, batched in one path.
pub fn draw_grid(
    surface: &mut dyn Surface,
    canvas: &CanvasState,
    viewport: Size,
    grid_size: f64,
    ctx: &StyleContext,
) {
    if grid_size <= 0.0 {
        return;
    }
    let visible = canvas.visible_rect(viewport);
    let start_x = (visible.x0 / grid_size).floor() * grid_size;
    let start_y = (visible.y0 / grid_size).floor() * grid_size;
    let end_x = (visible.x1 / grid_size).ceil() * grid_size;
    let end_y = (visible.y1 / grid_size).ceil() * grid_size;

    let mut path = BezPath::new();
    let mut x = start_x;
    while x <= end_x {
        path.move_to(Point::new(x, start_y));
        path.line_to(Point::new(x, end_y));
        x += grid_size;
    }
    let mut y = start_y;
    while y <= end_y {
        path.move_to(Point::new(start_x, y));
        path.line_to(Point::new(end_x, y));
        y += grid_size;
    }

    surface.set_alpha(1.0);
    surface.set_dash(&[]);
    surface.stroke_path(&path, ctx.grid_color(), 0.5 / canvas.zoom.max(f64::EPSILON));
}

/// Everything needed to draw one frame.
pub struct RenderContext<'a> {
    pub board: &'a Board,
    /// Element being drawn but not yet committed.
    pub preview: Option<&'a Element>,
    /// Marquee in canvas coordinates.
    pub selection_rect: Option<Rect>,
    /// Element under a text editor; its text is left to the editor.
    pub editing: Option<ElementId>,
    /// Viewport size in screen pixels.
    pub viewport: Size,
}

impl<'a> RenderContext<'a> {
    pub fn new(board: &'a Board, viewport: Size) -> Self {
        Self {
            board,
            preview: None,
            selection_rect: None,
            editing: None,
            viewport,
        }
    }

    /// Pull the preview, marquee and edited element from the gesture state.
    pub fn with_interaction(mut self, interaction: &'a Interaction) -> Self {
        self.preview = interaction.preview_element();
        self.selection_rect = interaction.selection_rect();
        self.editing = interaction.editing_element();
        self
    }

    pub fn with_preview(mut self, preview: Option<&'a Element>) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_selection_rect(mut self, rect: Option<Rect>) -> Self {
        self.selection_rect = rect;
        self
    }

    pub fn with_editing(mut self, id: Option<ElementId>) -> Self {
        self.editing = id;
        self
    }
}

/// Draw a full frame: grid, elements in z-order, the preview, then the
/// selection overlay and marquee.
pub fn draw_scene(surface: &mut dyn Surface, ctx: &RenderContext) {
    let canvas = &ctx.board.canvas;
    let style = StyleContext::for_canvas(canvas);
    surface.set_transform(canvas.transform());

    if canvas.grid_enabled {
        draw_grid(surface, canvas, ctx.viewport, ctx.board.config.grid_size, &style);
    }

    for element in ctx.board.elements() {
        if ctx.editing == Some(element.id) {
            // The editor draws the text; boxes keep their outline.
            if element.is_box() {
                draw_element_inner(surface, element, &style, false);
            }
            continue;
        }
        draw_element(surface, element, &style);
    }

    if let Some(preview) = ctx.preview {
        draw_element(surface, preview, &style);
    }

    draw_selection_overlay(surface, ctx.board, canvas.zoom);

    if let Some(rect) = ctx.selection_rect {
        draw_marquee(surface, rect, canvas.zoom);
    }
}

/// Transform that maps `bounds` (padded) onto an image of origin zero.
pub fn export_transform(bounds: Rect) -> Affine {
    Affine::translate((-bounds.x0, -bounds.y0))
}
