//! SVG surface and scene export.

use crate::renderer::{RenderResult, RendererError, StyleContext, draw_element, export_transform};
use crate::surface::{Surface, TextStyle};
use kurbo::{Affine, BezPath, Point, Size};
use peniko::Color;
use sketchboard_core::elements::{Element, FontFamily, SerializableColor};
use sketchboard_core::geometry::{TextMeasurer, group_bounds};
use std::fmt::Write;

/// Padding around exported content, canvas units.
pub const EXPORT_PADDING: f64 = 20.0;

/// Surface that writes SVG markup.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    body: String,
    transform: Affine,
    alpha: f64,
    dash: Vec<f64>,
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self {
            body: String::new(),
            transform: Affine::IDENTITY,
            alpha: 1.0,
            dash: Vec::new(),
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn color_attr(color: Color) -> String {
    SerializableColor::from(color).to_hex()
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markup written so far, without the document wrapper.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Uniform scale of the current transform, for stroke widths and font sizes.
    fn scale(&self) -> f64 {
        self.transform.determinant().abs().sqrt()
    }

    fn opacity_attr(&self) -> String {
        if self.alpha < 1.0 {
            format!(r#" opacity="{}""#, self.alpha)
        } else {
            String::new()
        }
    }

    fn dash_attr(&self) -> String {
        if self.dash.is_empty() {
            return String::new();
        }
        let scale = self.scale();
        let values: Vec<String> = self.dash.iter().map(|d| (d * scale).to_string()).collect();
        format!(r#" stroke-dasharray="{}""#, values.join(" "))
    }

    /// Wrap the body in an `<svg>` document of the given size.
    pub fn finish(self, size: Size, background: Option<Color>) -> String {
        let mut doc = String::new();
        let _ = writeln!(
            doc,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = size.width,
            h = size.height
        );
        if let Some(bg) = background {
            let _ = writeln!(
                doc,
                r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
                size.width,
                size.height,
                color_attr(bg)
            );
        }
        doc.push_str(&self.body);
        doc.push_str("</svg>\n");
        doc
    }
}

impl TextMeasurer for SvgSurface {
    fn line_width(&self, _line: &str, _font_size: f64, _family: FontFamily) -> Option<f64> {
        None
    }
}

impl Surface for SvgSurface {
    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    fn set_dash(&mut self, pattern: &[f64]) {
        self.dash = pattern.to_vec();
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        let path = self.transform * path.clone();
        let _ = writeln!(
            self.body,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linecap="round" stroke-linejoin="round"{}{}/>"#,
            path.to_svg(),
            color_attr(color),
            width * self.scale(),
            self.dash_attr(),
            self.opacity_attr()
        );
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        let path = self.transform * path.clone();
        let _ = writeln!(
            self.body,
            r#"<path d="{}" fill="{}"{}/>"#,
            path.to_svg(),
            color_attr(color),
            self.opacity_attr()
        );
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        let origin = self.transform * origin;
        let _ = writeln!(
            self.body,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" dominant-baseline="text-before-edge" xml:space="preserve"{}>{}</text>"#,
            origin.x,
            origin.y,
            escape_xml(style.family.css_name()),
            style.font_size * self.scale(),
            color_attr(style.color),
            self.opacity_attr(),
            escape_xml(text)
        );
    }
}

/// Render elements to a standalone SVG document on a white background,
/// cropped to their bounds plus [`EXPORT_PADDING`].
pub fn export_svg(elements: &[Element]) -> RenderResult<String> {
    let measurer = SvgSurface::new();
    let bounds = group_bounds(elements.iter().map(|e| &e.id), elements, &measurer)
        .ok_or(RendererError::EmptyScene)?
        .inflate(EXPORT_PADDING, EXPORT_PADDING);

    let mut surface = SvgSurface::new();
    surface.set_transform(export_transform(bounds));
    let ctx = StyleContext::default();
    for element in elements {
        draw_element(&mut surface, element, &ctx);
    }
    log::debug!("exported {} elements to svg", elements.len());
    Ok(surface.finish(bounds.size(), Some(Color::WHITE)))
}
