//! Board configuration.

use crate::binding::{BINDING_THRESHOLD, OrphanBindingPolicy};
use crate::snap::GRID_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Maximum number of undo snapshots to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for a board. Every field has a default, so a partial JSON
/// object (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    /// Grid spacing used for snapping and the grid pass.
    pub grid_size: f64,
    /// Keep the current tool after an element is created.
    pub tool_lock: bool,
    pub orphan_policy: OrphanBindingPolicy,
    /// Distance from an endpoint to an anchor within which connectors bind.
    pub binding_threshold: f64,
    /// Handle hit radius in screen pixels.
    pub handle_tolerance: f64,
    pub undo_depth: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            tool_lock: false,
            orphan_policy: OrphanBindingPolicy::KeepStale,
            binding_threshold: BINDING_THRESHOLD,
            handle_tolerance: crate::resize::HANDLE_HIT_TOLERANCE,
            undo_depth: MAX_UNDO_HISTORY,
        }
    }
}

impl BoardConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = BoardConfig::from_json("{}").unwrap();
        assert_eq!(config, BoardConfig::default());
        assert!((config.grid_size - 20.0).abs() < f64::EPSILON);
        assert_eq!(config.undo_depth, 50);
    }

    #[test]
    fn test_partial_override() {
        let config =
            BoardConfig::from_json(r#"{"toolLock": true, "orphanPolicy": "clear"}"#).unwrap();
        assert!(config.tool_lock);
        assert_eq!(config.orphan_policy, OrphanBindingPolicy::Clear);
        assert!((config.binding_threshold - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            BoardConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
