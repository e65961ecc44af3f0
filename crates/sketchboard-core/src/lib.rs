//! Sketchboard Core Library
//!
//! Scene model, geometry and gesture handling for the Sketchboard drawing canvas.
//! Nothing here draws pixels; see `sketchboard-render` for that.

pub mod binding;
pub mod board;
pub mod camera;
pub mod config;
pub mod elements;
pub mod export;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod resize;
pub mod snap;
pub mod storage;
pub mod tools;

pub use binding::{OrphanBindingPolicy, bind_connector, resolve_bindings_for};
pub use board::Board;
pub use camera::{CanvasState, CanvasStatePatch, Theme};
pub use config::{BoardConfig, ConfigError};
pub use elements::{
    Anchor, Binding, Element, ElementId, ElementKind, ElementPatch, ElementStyle,
    SerializableColor, StrokeStyle,
};
pub use export::{ExportError, SceneFile};
pub use geometry::{EstimatedMetrics, TextMeasurer};
pub use input::{InteractionEvent, Key, Modifiers, MouseButton};
pub use interaction::{Effect, Interaction, InteractionState};
pub use snap::{GRID_SIZE, snap_to_grid};
pub use storage::{ElementStore, MemoryStore, StorageError, StoreOp};
pub use tools::{ToolKind, ToolOptions};
