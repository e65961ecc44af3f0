//! SketchBoard Render Library
//!
//! Stateless drawing of a board onto any [`Surface`]: hand-drawn outlines,
//! hachure fills, the selection overlay and SVG export.

pub mod renderer;
pub mod rough;
pub mod surface;
pub mod svg;

pub use renderer::{
    RenderContext, RenderResult, RendererError, StyleContext, draw_element, draw_grid,
    draw_marquee, draw_scene, draw_selection_overlay,
};
pub use surface::{DrawCommand, RecordingSurface, Surface, TextStyle};
pub use svg::{SvgSurface, export_svg};
