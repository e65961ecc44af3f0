//! The drawing-call contract the renderer targets.

use kurbo::{Affine, BezPath, Point};
use peniko::Color;
use sketchboard_core::elements::{FontFamily, TextAlign};
use sketchboard_core::geometry::TextMeasurer;

/// Font parameters for a run of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub family: FontFamily,
    pub color: Color,
    pub align: TextAlign,
}

/// A 2D drawing target.
///
/// Paths are given in canvas coordinates and mapped through the current
/// transform. Text measurement comes from the [`TextMeasurer`] supertrait;
/// a surface that cannot measure returns `None` and layout falls back to
/// the character-count estimate.
pub trait Surface: TextMeasurer {
    fn set_transform(&mut self, transform: Affine);

    /// Global alpha for subsequent draws, 0.0 to 1.0.
    fn set_alpha(&mut self, alpha: f64);

    /// Dash pattern for subsequent strokes. Empty means solid.
    fn set_dash(&mut self, pattern: &[f64]);

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64);

    fn fill_path(&mut self, path: &BezPath, color: Color);

    /// Draw one line of text with its top-left corner at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle);
}

/// A recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    SetTransform(Affine),
    SetAlpha(f64),
    SetDash(Vec<f64>),
    Stroke {
        path: BezPath,
        color: Color,
        width: f64,
    },
    Fill {
        path: BezPath,
        color: Color,
    },
    Text {
        text: String,
        origin: Point,
        style: TextStyle,
    },
}

/// Surface that records calls for later replay (or inspection in tests).
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    /// Fixed advance per character as a fraction of the font size, if set.
    char_width: Option<f64>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recording surface that reports monospace metrics.
    pub fn with_char_width(char_width: f64) -> Self {
        Self {
            commands: Vec::new(),
            char_width: Some(char_width),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Replay the recorded calls onto another surface.
    pub fn replay(&self, target: &mut dyn Surface) {
        for command in &self.commands {
            match command {
                DrawCommand::SetTransform(transform) => target.set_transform(*transform),
                DrawCommand::SetAlpha(alpha) => target.set_alpha(*alpha),
                DrawCommand::SetDash(pattern) => target.set_dash(pattern),
                DrawCommand::Stroke { path, color, width } => target.stroke_path(path, *color, *width),
                DrawCommand::Fill { path, color } => target.fill_path(path, *color),
                DrawCommand::Text {
                    text,
                    origin,
                    style,
                } => target.fill_text(text, *origin, style),
            }
        }
    }

    pub fn stroke_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .count()
    }

    pub fn fill_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { .. }))
            .count()
    }

    pub fn texts(&self) -> Vec<(&str, Point)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, origin, .. } => Some((text.as_str(), *origin)),
                _ => None,
            })
            .collect()
    }
}

impl TextMeasurer for RecordingSurface {
    fn line_width(&self, line: &str, font_size: f64, _family: FontFamily) -> Option<f64> {
        self.char_width
            .map(|w| line.chars().count() as f64 * font_size * w)
    }
}

impl Surface for RecordingSurface {
    fn set_transform(&mut self, transform: Affine) {
        self.commands.push(DrawCommand::SetTransform(transform));
    }

    fn set_alpha(&mut self, alpha: f64) {
        self.commands.push(DrawCommand::SetAlpha(alpha));
    }

    fn set_dash(&mut self, pattern: &[f64]) {
        self.commands.push(DrawCommand::SetDash(pattern.to_vec()));
    }

    fn stroke_path(&mut self, path: &BezPath, color: Color, width: f64) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            color,
            width,
        });
    }

    fn fill_path(&mut self, path: &BezPath, color: Color) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            color,
        });
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            style: style.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_reproduces_calls() {
        let mut source = RecordingSurface::new();
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        source.set_alpha(0.5);
        source.set_dash(&[5.0, 5.0]);
        source.stroke_path(&path, Color::BLACK, 2.0);

        let mut target = RecordingSurface::new();
        source.replay(&mut target);
        assert_eq!(source.commands(), target.commands());
        assert_eq!(target.stroke_count(), 1);
    }

    #[test]
    fn test_measurement() {
        assert_eq!(
            RecordingSurface::new().line_width("abc", 10.0, FontFamily::Virgil),
            None
        );
        let width = RecordingSurface::with_char_width(0.5)
            .line_width("abcd", 10.0, FontFamily::Virgil)
            .unwrap();
        assert!((width - 20.0).abs() < f64::EPSILON);
    }
}
