//! JSON scene export envelope.

use crate::elements::Element;
use crate::tools::ToolOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EXPORT_TYPE: &str = "excalidraw";
pub const EXPORT_VERSION: u32 = 2;
pub const EXPORT_SOURCE: &str = "sketchboard";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported scene type: {0}")]
    UnsupportedType(String),
    #[error("Unsupported scene version: {0}")]
    UnsupportedVersion(u32),
}

/// Editor defaults stored alongside the elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub view_background_color: String,
    pub current_item_stroke_color: String,
    pub current_item_background_color: String,
    pub current_item_fill_style: String,
    pub current_item_stroke_width: f64,
    pub current_item_roughness: f64,
    /// Percent, 0-100.
    pub current_item_opacity: f64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_options(&ToolOptions::default())
    }
}

impl AppState {
    pub fn from_options(options: &ToolOptions) -> Self {
        Self {
            view_background_color: "#ffffff".to_string(),
            current_item_stroke_color: options.stroke_color.to_hex(),
            current_item_background_color: options.fill_color.to_hex(),
            current_item_fill_style: if options.sketchy_fill { "hachure" } else { "solid" }
                .to_string(),
            current_item_stroke_width: options.stroke_width,
            current_item_roughness: options.roughness,
            current_item_opacity: options.opacity * 100.0,
        }
    }
}

/// A full scene as written to and read from `.json` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    #[serde(default)]
    pub source: String,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub app_state: AppState,
}

impl SceneFile {
    pub fn new(elements: Vec<Element>, options: &ToolOptions) -> Self {
        Self {
            kind: EXPORT_TYPE.to_string(),
            version: EXPORT_VERSION,
            source: EXPORT_SOURCE.to_string(),
            elements,
            app_state: AppState::from_options(options),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a scene.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let scene: SceneFile = serde_json::from_str(json)?;
        if scene.kind != EXPORT_TYPE {
            return Err(ExportError::UnsupportedType(scene.kind));
        }
        if scene.version > EXPORT_VERSION {
            return Err(ExportError::UnsupportedVersion(scene.version));
        }
        Ok(scene)
    }
}
