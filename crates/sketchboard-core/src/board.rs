//! The board: element list, selection, view state, undo history and the
//! persistence outbox.

use crate::binding::{OrphanBindingPolicy, clear_bindings_to, resolve_bindings_for};
use crate::camera::{CanvasState, CanvasStatePatch, clamp_zoom};
use crate::config::BoardConfig;
use crate::elements::{Element, ElementId, ElementPatch};
use crate::export::{ExportError, SceneFile};
use crate::geometry::{
    EstimatedMetrics, TextMeasurer, bounds_of, group_bounds, hit_test, rect_intersects,
};
use crate::storage::StoreOp;
use crate::tools::{ToolKind, ToolOptions};
use kurbo::{Point, Rect};
use std::collections::HashSet;

/// A drawing session.
///
/// Elements are kept back-to-front. Every public mutation records an undo
/// snapshot and queues the matching [`StoreOp`]s.
pub struct Board {
    pub session_id: String,
    elements: Vec<Element>,
    selection: HashSet<ElementId>,
    pub canvas: CanvasState,
    pub config: BoardConfig,
    tool: ToolKind,
    pub tool_options: ToolOptions,
    undo_stack: Vec<Vec<Element>>,
    redo_stack: Vec<Vec<Element>>,
    /// Snapshot dropped off the bottom by the latest push, kept until the
    /// next history change so a discarded push can put it back.
    evicted: Option<Vec<Element>>,
    outbox: Vec<StoreOp>,
    measurer: Box<dyn TextMeasurer>,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("session_id", &self.session_id)
            .field("elements", &self.elements.len())
            .field("selection", &self.selection.len())
            .field("tool", &self.tool)
            .field("pending_ops", &self.outbox.len())
            .finish()
    }
}

impl Board {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self::with_config(session_id, BoardConfig::default())
    }

    pub fn with_config(session_id: impl Into<String>, config: BoardConfig) -> Self {
        Self {
            session_id: session_id.into(),
            elements: Vec::new(),
            selection: HashSet::new(),
            canvas: CanvasState::default(),
            config,
            tool: ToolKind::Select,
            tool_options: ToolOptions::default(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            evicted: None,
            outbox: Vec::new(),
            measurer: Box::new(EstimatedMetrics),
        }
    }

    /// Replace the text measurer (a host with font metrics installs its own).
    pub fn set_measurer(&mut self, measurer: Box<dyn TextMeasurer>) {
        self.measurer = measurer;
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    /// Replace the board contents with loaded data. Clears history and selection
    /// without queueing writes.
    pub fn load(&mut self, elements: Vec<Element>, mut canvas: CanvasState) {
        canvas.zoom = clamp_zoom(canvas.zoom);
        self.elements = elements;
        self.canvas = canvas;
        self.selection.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.evicted = None;
        log::info!(
            "Loaded session {} with {} elements",
            self.session_id,
            self.elements.len()
        );
    }

    // --- elements ---

    /// Elements back to front.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn add_element(&mut self, element: Element) {
        self.push_undo();
        log::debug!("add {} {}", element.type_name(), element.id);
        self.outbox.push(StoreOp::Create(element.clone()));
        self.elements.push(element);
    }

    /// Merge a patch into an element. Connectors bound to it follow.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        if self.element(id).is_none() {
            return false;
        }
        self.push_undo();
        if let Some(element) = self.element_mut(id) {
            patch.apply(element);
        }
        self.outbox.push(StoreOp::Update {
            id,
            patch: patch.clone(),
        });
        self.resolve_bindings(id);
        true
    }

    /// Remove an element. Bindings to it are cleared or left stale depending
    /// on the orphan policy.
    pub fn delete_element(&mut self, id: ElementId) -> Option<Element> {
        self.element(id)?;
        self.push_undo();
        self.remove_element(id)
    }

    /// Delete every selected element under one undo snapshot.
    pub fn delete_selection(&mut self) -> Vec<ElementId> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return ids;
        }
        self.push_undo();
        for id in &ids {
            self.remove_element(*id);
        }
        ids
    }

    /// Remove without recording an undo snapshot.
    pub(crate) fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id == id)?;
        let removed = self.elements.remove(index);
        self.selection.remove(&id);
        self.outbox.push(StoreOp::Delete(id));
        log::debug!("delete {} {}", removed.type_name(), id);

        if self.config.orphan_policy == OrphanBindingPolicy::Clear {
            for connector in clear_bindings_to(id, &mut self.elements) {
                self.queue_geometry(connector);
            }
        }
        Some(removed)
    }

    /// Drop an element created by a gesture that ended up empty, along with
    /// the undo snapshot its creation recorded.
    pub(crate) fn abandon_element(&mut self, id: ElementId) {
        if let Some(index) = self.elements.iter().position(|e| e.id == id) {
            self.elements.remove(index);
            self.selection.remove(&id);
            self.outbox.push(StoreOp::Delete(id));
            self.discard_undo_snapshot();
        }
    }

    /// Restore an element to an earlier state without touching history.
    pub(crate) fn restore_element(&mut self, element: Element) {
        let id = element.id;
        if let Some(slot) = self.element_mut(id) {
            *slot = element;
            self.queue_geometry(id);
        }
    }

    fn queue_geometry(&mut self, id: ElementId) {
        if let Some(element) = self.element(id) {
            let patch = ElementPatch::geometry_of(element);
            self.outbox.push(StoreOp::Update { id, patch });
        }
    }

    fn resolve_bindings(&mut self, moved: ElementId) -> Vec<ElementId> {
        let updated = resolve_bindings_for(moved, &mut self.elements);
        for connector in &updated {
            self.queue_geometry(*connector);
        }
        updated
    }

    /// Queue the geometry of elements changed in place by a gesture and run the
    /// binding resolver for each. Returns the connectors the resolver moved.
    pub(crate) fn commit_geometry(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let mut moved = Vec::new();
        for id in ids {
            self.queue_geometry(*id);
        }
        for id in ids {
            for connector in self.resolve_bindings(*id) {
                if !moved.contains(&connector) {
                    moved.push(connector);
                }
            }
        }
        moved
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            return false;
        };
        self.push_undo();
        let element = self.elements.remove(index);
        self.elements.push(element);
        self.outbox.push(StoreOp::ReplaceAll(self.elements.clone()));
        true
    }

    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            return false;
        };
        self.push_undo();
        let element = self.elements.remove(index);
        self.elements.insert(0, element);
        self.outbox.push(StoreOp::ReplaceAll(self.elements.clone()));
        true
    }

    // --- queries ---

    pub fn bounds_of(&self, id: ElementId) -> Option<Rect> {
        self.element(id).map(|e| bounds_of(e, self.measurer()))
    }

    /// Elements hit by a canvas point, front to back.
    pub fn elements_at_point(&self, point: Point) -> Vec<ElementId> {
        self.elements
            .iter()
            .rev()
            .filter(|e| hit_test(point, e, self.measurer()))
            .map(|e| e.id)
            .collect()
    }

    pub fn top_element_at(&self, point: Point) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| hit_test(point, e, self.measurer()))
            .map(|e| e.id)
    }

    /// Elements whose bounds intersect `rect`, back to front.
    pub fn elements_in_rect(&self, rect: Rect) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| rect_intersects(bounds_of(e, self.measurer()), rect))
            .map(|e| e.id)
            .collect()
    }

    /// Bounds of all elements.
    pub fn content_bounds(&self) -> Option<Rect> {
        let ids: Vec<ElementId> = self.elements.iter().map(|e| e.id).collect();
        group_bounds(&ids, &self.elements, self.measurer())
    }

    // --- selection ---

    pub fn selection(&self) -> &HashSet<ElementId> {
        &self.selection
    }

    /// Selected ids in stacking order.
    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| self.selection.contains(&e.id))
            .map(|e| e.id)
            .collect()
    }

    pub fn selected_elements(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| self.selection.contains(&e.id))
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }

    /// Replace the selection. Unknown ids are ignored.
    pub fn select_elements(&mut self, ids: &[ElementId]) {
        self.selection = ids
            .iter()
            .copied()
            .filter(|id| self.element(*id).is_some())
            .collect();
    }

    pub fn add_to_selection(&mut self, id: ElementId) {
        if self.element(id).is_some() {
            self.selection.insert(id);
        }
    }

    /// Flip membership of `id`. Returns whether it is now selected.
    pub fn toggle_selection(&mut self, id: ElementId) -> bool {
        if self.selection.remove(&id) {
            false
        } else {
            self.add_to_selection(id);
            self.selection.contains(&id)
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_all(&mut self) {
        self.selection = self.elements.iter().map(|e| e.id).collect();
    }

    /// Bounding box of the selection, `None` when nothing is selected.
    pub fn selection_bounds(&self) -> Option<Rect> {
        group_bounds(&self.selection, &self.elements, self.measurer())
    }

    // --- view and tools ---

    pub fn update_canvas_state(&mut self, patch: &CanvasStatePatch) {
        self.canvas.apply(patch);
        self.note_canvas_changed();
    }

    /// Queue a session write for view changes made directly on `canvas`.
    pub(crate) fn note_canvas_changed(&mut self) {
        // Only the latest view state matters
        self.outbox
            .retain(|op| !matches!(op, StoreOp::UpdateSession(_)));
        self.outbox.push(StoreOp::UpdateSession(self.canvas.clone()));
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools. Returns whether the tool changed.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        if self.tool == tool {
            return false;
        }
        log::debug!("tool {:?} -> {:?}", self.tool, tool);
        self.tool = tool;
        true
    }

    // --- history ---

    /// Record the current element list for undo. Clears redo.
    pub fn push_undo(&mut self) {
        self.undo_stack.push(self.elements.clone());
        self.redo_stack.clear();
        let depth = self.config.undo_depth.max(1);
        self.evicted = None;
        if self.undo_stack.len() > depth {
            let excess = self.undo_stack.len() - depth;
            self.evicted = self.undo_stack.drain(..excess).last();
        }
    }

    /// Forget the most recent snapshot when it matches the current elements
    /// (a gesture that ended up changing nothing). An entry the push evicted
    /// is restored.
    pub(crate) fn discard_undo_snapshot(&mut self) {
        if self.undo_stack.last() != Some(&self.elements) {
            return;
        }
        self.undo_stack.pop();
        if let Some(evicted) = self.evicted.take() {
            self.undo_stack.insert(0, evicted);
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, snapshot);
        self.redo_stack.push(current);
        self.evicted = None;
        self.after_history_change();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.elements, snapshot);
        self.undo_stack.push(current);
        self.evicted = None;
        self.after_history_change();
        true
    }

    fn after_history_change(&mut self) {
        let existing: HashSet<ElementId> = self.elements.iter().map(|e| e.id).collect();
        self.selection.retain(|id| existing.contains(id));
        self.outbox.push(StoreOp::ReplaceAll(self.elements.clone()));
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // --- persistence ---

    /// Drain queued writes for the host to flush.
    pub fn take_outbox(&mut self) -> Vec<StoreOp> {
        std::mem::take(&mut self.outbox)
    }

    pub fn pending_ops(&self) -> usize {
        self.outbox.len()
    }

    pub fn export_json(&self) -> Result<String, ExportError> {
        SceneFile::new(self.elements.clone(), &self.tool_options).to_json()
    }

    /// Replace the board contents with a scene file. Undoable.
    pub fn import_json(&mut self, json: &str) -> Result<usize, ExportError> {
        let scene = SceneFile::from_json(json)?;
        self.push_undo();
        self.elements = scene.elements;
        self.selection.clear();
        self.outbox.push(StoreOp::ReplaceAll(self.elements.clone()));
        log::info!("Imported {} elements", self.elements.len());
        Ok(self.elements.len())
    }
}
