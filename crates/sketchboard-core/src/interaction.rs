//! The gesture state machine.
//!
//! [`Interaction`] owns the transient state of the one active gesture and
//! turns input events into board mutations. Everything goes through
//! [`Interaction::dispatch`], which returns the effects the host should react
//! to (redraw, persist, update toolbars).

use crate::binding::{bind_connector, nearest_anchor, resolve_connector};
use crate::board::Board;
use crate::elements::{Element, ElementId, ElementKind};
use crate::geometry::layout_text;
use crate::input::{InteractionEvent, Key, Modifiers, MouseButton};
use crate::resize::{
    Corner, HandleKind, group_handles, group_resize, handles_for, hit_test_handles,
    resize_element,
};
use crate::snap::snap_if;
use crate::tools::{
    ToolKind, append_bend_point, create_element, finalize_element, finish_connector,
    preview_last_point, set_point, update_with_point,
};
use kurbo::{Point, Rect, Vec2};

/// Something the host should react to after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Created(Element),
    Updated(Element),
    Deleted(ElementId),
    CanvasStateChanged,
    SelectionChanged,
    ToolChanged(ToolKind),
    Redraw,
}

/// Marquee selection in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub start: Point,
    pub current: Point,
}

impl SelectionRect {
    pub fn to_rect(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }
}

/// The active gesture. Exactly one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// A drag-drawn element, not yet on the board.
    Drawing { element: Element, anchor: Point },
    SelectionBox { rect: SelectionRect, additive: bool },
    /// Moving the selection. `moved` turns true on the first non-zero delta.
    Dragging { last: Point, moved: bool },
    Resizing {
        element_id: ElementId,
        handle: HandleKind,
        start: Point,
        original: Element,
        moved: bool,
    },
    GroupResizing {
        corner: Corner,
        start: Point,
        bounds: Rect,
        originals: Vec<Element>,
        moved: bool,
    },
    /// `last_screen` is in screen space.
    Panning { last_screen: Point },
    EditingText {
        element_id: ElementId,
        snapshot: Element,
        created: bool,
    },
    DraggingPoint {
        element_id: ElementId,
        index: usize,
        moved: bool,
    },
    /// Multi-click connector; the last point floats with the pointer.
    DrawingConnector { element: Element },
    /// A text edit was just committed by losing focus. The next event closes
    /// this window; a pointer-down arriving in it is swallowed.
    EditCommitted,
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Drawing { .. } => "drawing",
            InteractionState::SelectionBox { .. } => "selectionBox",
            InteractionState::Dragging { .. } => "dragging",
            InteractionState::Resizing { .. } => "resizing",
            InteractionState::GroupResizing { .. } => "groupResizing",
            InteractionState::Panning { .. } => "panning",
            InteractionState::EditingText { .. } => "editingText",
            InteractionState::DraggingPoint { .. } => "draggingPoint",
            InteractionState::DrawingConnector { .. } => "drawingConnector",
            InteractionState::EditCommitted => "editCommitted",
        }
    }
}

/// Gesture controller for one board.
#[derive(Debug, Default)]
pub struct Interaction {
    state: InteractionState,
    space_held: bool,
}

fn grid_for(board: &Board) -> Option<f64> {
    board.canvas.snap_enabled.then_some(board.config.grid_size)
}

fn set_text_content(element: &mut Element, text: String) {
    match &mut element.kind {
        ElementKind::Text(t) => t.text = text,
        ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b) => {
            b.label = Some(text);
        }
        _ => {}
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    /// Element being drawn, for the renderer.
    pub fn preview_element(&self) -> Option<&Element> {
        match &self.state {
            InteractionState::Drawing { element, .. }
            | InteractionState::DrawingConnector { element } => Some(element),
            _ => None,
        }
    }

    pub fn selection_rect(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::SelectionBox { rect, .. } => Some(rect.to_rect()),
            _ => None,
        }
    }

    pub fn editing_element(&self) -> Option<ElementId> {
        match &self.state {
            InteractionState::EditingText { element_id, .. } => Some(*element_id),
            _ => None,
        }
    }

    fn transition(&mut self, next: InteractionState) {
        if self.state.name() != next.name() {
            log::debug!("interaction {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }

    fn take_state(&mut self) -> InteractionState {
        let previous = std::mem::take(&mut self.state);
        if !matches!(previous, InteractionState::Idle) {
            log::debug!("interaction {} -> idle", previous.name());
        }
        previous
    }

    /// Handle one input event.
    pub fn dispatch(&mut self, board: &mut Board, event: InteractionEvent) -> Vec<Effect> {
        let mut effects = Vec::new();

        if matches!(self.state, InteractionState::EditCommitted) {
            self.transition(InteractionState::Idle);
            if matches!(event, InteractionEvent::PointerDown { .. }) {
                return effects;
            }
        }

        match event {
            InteractionEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.pointer_down(board, position, button, modifiers, &mut effects),
            InteractionEvent::PointerMove {
                position,
                modifiers,
            } => self.pointer_move(board, position, modifiers, &mut effects),
            InteractionEvent::PointerUp { position, .. } => {
                self.pointer_up(board, position, &mut effects)
            }
            InteractionEvent::DoubleClick { position } => {
                self.double_click(board, position, &mut effects)
            }
            InteractionEvent::KeyDown { key, modifiers } => {
                self.key_down(board, key, modifiers, &mut effects)
            }
            InteractionEvent::KeyUp { key } => {
                if key == Key::Space {
                    self.space_held = false;
                }
            }
            InteractionEvent::Wheel { position, delta_y } => {
                board.canvas.wheel_zoom(position, delta_y);
                board.note_canvas_changed();
                effects.push(Effect::CanvasStateChanged);
                effects.push(Effect::Redraw);
            }
            InteractionEvent::TextInput(text) => {
                if let Some(element) = self.editing_element().and_then(|id| board.element_mut(id)) {
                    set_text_content(element, text);
                    effects.push(Effect::Redraw);
                }
            }
            InteractionEvent::Blur => {
                if matches!(self.state, InteractionState::EditingText { .. }) {
                    self.commit_text_edit(board, &mut effects);
                    self.transition(InteractionState::EditCommitted);
                }
            }
        }
        effects
    }

    fn pointer_down(
        &mut self,
        board: &mut Board,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
        effects: &mut Vec<Effect>,
    ) {
        let point = board.canvas.screen_to_canvas(position);

        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::DrawingConnector { element } => {
                if button == MouseButton::Left {
                    append_bend_point(element, snap_if(point, grid_for(board)));
                    effects.push(Effect::Redraw);
                }
                return;
            }
            InteractionState::EditingText { .. } => {
                // The click that takes focus away from the editor.
                self.commit_text_edit(board, effects);
                return;
            }
            other => {
                log::debug!("ignoring pointer down during {}", other.name());
                return;
            }
        }

        let tool = board.tool();
        if button == MouseButton::Middle || self.space_held || tool == ToolKind::Pan {
            self.transition(InteractionState::Panning {
                last_screen: position,
            });
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        match tool {
            ToolKind::Select => self.select_press(board, point, modifiers, effects),
            ToolKind::Pan => {}
            ToolKind::Eraser => {
                if let Some(id) = board.top_element_at(point) {
                    let was_selected = board.is_selected(id);
                    board.delete_element(id);
                    effects.push(Effect::Deleted(id));
                    if was_selected {
                        effects.push(Effect::SelectionChanged);
                    }
                    effects.push(Effect::Redraw);
                }
            }
            ToolKind::Text => {
                let existing = board
                    .top_element_at(point)
                    .filter(|id| board.element(*id).is_some_and(Element::is_text));
                if let Some(id) = existing {
                    self.start_text_edit(board, id, false, effects);
                    return;
                }
                let point = snap_if(point, grid_for(board));
                if let Some(element) = create_element(ToolKind::Text, point, &board.tool_options) {
                    let id = element.id;
                    board.add_element(element.clone());
                    board.select_elements(&[id]);
                    effects.push(Effect::Created(element.clone()));
                    effects.push(Effect::SelectionChanged);
                    effects.push(Effect::Redraw);
                    self.transition(InteractionState::EditingText {
                        element_id: id,
                        snapshot: element,
                        created: true,
                    });
                }
            }
            ToolKind::Connector => {
                let point = snap_if(point, grid_for(board));
                if let Some(element) = create_element(tool, point, &board.tool_options) {
                    self.transition(InteractionState::DrawingConnector { element });
                    effects.push(Effect::Redraw);
                }
            }
            ToolKind::Rectangle
            | ToolKind::Diamond
            | ToolKind::Ellipse
            | ToolKind::Line
            | ToolKind::Arrow
            | ToolKind::Draw => {
                if let Some(element) = create_element(tool, point, &board.tool_options) {
                    self.transition(InteractionState::Drawing {
                        element,
                        anchor: point,
                    });
                }
            }
        }
    }

    fn select_press(
        &mut self,
        board: &mut Board,
        point: Point,
        modifiers: Modifiers,
        effects: &mut Vec<Effect>,
    ) {
        let tolerance = board.config.handle_tolerance / board.canvas.zoom;
        let selected = board.selected_ids();

        // Handles take priority over the shapes under them.
        if let [id] = selected.as_slice() {
            if let Some(element) = board.element(*id) {
                let handles = handles_for(element, board.measurer());
                match hit_test_handles(&handles, point, tolerance) {
                    Some(HandleKind::Point(index)) => {
                        self.transition(InteractionState::DraggingPoint {
                            element_id: *id,
                            index,
                            moved: false,
                        });
                        return;
                    }
                    Some(handle) => {
                        self.transition(InteractionState::Resizing {
                            element_id: *id,
                            handle,
                            start: point,
                            original: element.clone(),
                            moved: false,
                        });
                        return;
                    }
                    None => {}
                }
            }
        } else if selected.len() > 1 {
            let corner = board.selection_bounds().and_then(|bounds| {
                match hit_test_handles(&group_handles(bounds), point, tolerance) {
                    Some(HandleKind::Corner(corner)) => Some((corner, bounds)),
                    _ => None,
                }
            });
            if let Some((corner, bounds)) = corner {
                self.transition(InteractionState::GroupResizing {
                    corner,
                    start: point,
                    bounds,
                    originals: board.selected_elements().cloned().collect(),
                    moved: false,
                });
                return;
            }
        }

        if let Some(id) = board.top_element_at(point) {
            if modifiers.shift {
                let now_selected = board.toggle_selection(id);
                effects.push(Effect::SelectionChanged);
                effects.push(Effect::Redraw);
                if !now_selected {
                    return;
                }
            } else if !board.is_selected(id) {
                board.select_elements(&[id]);
                effects.push(Effect::SelectionChanged);
                effects.push(Effect::Redraw);
            }
            self.transition(InteractionState::Dragging {
                last: point,
                moved: false,
            });
        } else {
            if !modifiers.shift && !board.selection().is_empty() {
                board.clear_selection();
                effects.push(Effect::SelectionChanged);
                effects.push(Effect::Redraw);
            }
            self.transition(InteractionState::SelectionBox {
                rect: SelectionRect {
                    start: point,
                    current: point,
                },
                additive: modifiers.shift,
            });
        }
    }

    fn pointer_move(
        &mut self,
        board: &mut Board,
        position: Point,
        modifiers: Modifiers,
        effects: &mut Vec<Effect>,
    ) {
        let point = board.canvas.screen_to_canvas(position);

        match &mut self.state {
            InteractionState::Idle
            | InteractionState::EditingText { .. }
            | InteractionState::EditCommitted => return,
            InteractionState::Drawing { element, anchor } => {
                update_with_point(element, point, *anchor);
            }
            InteractionState::SelectionBox { rect, .. } => {
                rect.current = point;
            }
            InteractionState::Dragging { last, moved } => {
                let delta = point - *last;
                if delta == Vec2::ZERO {
                    return;
                }
                if !*moved {
                    board.push_undo();
                    *moved = true;
                }
                for id in board.selected_ids() {
                    if let Some(element) = board.element_mut(id) {
                        element.translate(delta);
                    }
                }
                *last = point;
            }
            InteractionState::Resizing {
                element_id,
                handle,
                start,
                original,
                moved,
            } => {
                if !*moved {
                    board.push_undo();
                    *moved = true;
                }
                let resized = resize_element(
                    original,
                    *handle,
                    point - *start,
                    modifiers.shift,
                    board.measurer(),
                );
                if let Some(element) = board.element_mut(*element_id) {
                    *element = resized;
                }
            }
            InteractionState::GroupResizing {
                corner,
                start,
                bounds,
                originals,
                moved,
            } => {
                if !*moved {
                    board.push_undo();
                    *moved = true;
                }
                let resized = group_resize(originals, *bounds, *corner, point - *start, modifiers.shift);
                for element in resized {
                    if let Some(slot) = board.element_mut(element.id) {
                        *slot = element;
                    }
                }
            }
            InteractionState::DraggingPoint {
                element_id,
                index,
                moved,
            } => {
                if !*moved {
                    board.push_undo();
                    *moved = true;
                }
                let target = snap_if(point, grid_for(board));
                if let Some(element) = board.element_mut(*element_id) {
                    set_point(element, *index, target);
                }
            }
            InteractionState::Panning { last_screen } => {
                board.canvas.pan(position - *last_screen);
                *last_screen = position;
                effects.push(Effect::CanvasStateChanged);
            }
            InteractionState::DrawingConnector { element } => {
                preview_last_point(element, snap_if(point, grid_for(board)));
            }
        }
        effects.push(Effect::Redraw);
    }

    fn pointer_up(&mut self, board: &mut Board, position: Point, effects: &mut Vec<Effect>) {
        let point = board.canvas.screen_to_canvas(position);

        match self.take_state() {
            InteractionState::Idle | InteractionState::EditCommitted => {}
            // These gestures do not end on release.
            state @ (InteractionState::DrawingConnector { .. }
            | InteractionState::EditingText { .. }) => {
                self.state = state;
            }
            InteractionState::Drawing {
                mut element,
                anchor,
            } => {
                finalize_element(&mut element, point, anchor, grid_for(board));
                self.commit_new_element(board, element, effects);
            }
            InteractionState::SelectionBox { mut rect, additive } => {
                rect.current = point;
                let hits = board.elements_in_rect(rect.to_rect());
                if additive {
                    for id in hits {
                        board.add_to_selection(id);
                    }
                } else {
                    board.select_elements(&hits);
                }
                effects.push(Effect::SelectionChanged);
                effects.push(Effect::Redraw);
            }
            InteractionState::Dragging { moved, .. } => {
                if moved {
                    let ids = board.selected_ids();
                    finish_move(board, &ids, effects);
                }
            }
            InteractionState::Resizing {
                element_id, moved, ..
            } => {
                if moved {
                    finish_move(board, &[element_id], effects);
                }
            }
            InteractionState::GroupResizing {
                originals, moved, ..
            } => {
                if moved {
                    let ids: Vec<ElementId> = originals.iter().map(|e| e.id).collect();
                    finish_move(board, &ids, effects);
                }
            }
            InteractionState::DraggingPoint {
                element_id,
                index,
                moved,
            } => {
                if moved {
                    rebind_endpoint(board, element_id, index);
                    finish_move(board, &[element_id], effects);
                }
            }
            InteractionState::Panning { .. } => {
                board.note_canvas_changed();
                effects.push(Effect::CanvasStateChanged);
            }
        }
    }

    fn double_click(&mut self, board: &mut Board, position: Point, effects: &mut Vec<Effect>) {
        match &self.state {
            InteractionState::DrawingConnector { .. } => self.commit_connector(board, effects),
            InteractionState::Idle if board.tool() == ToolKind::Select => {
                let point = board.canvas.screen_to_canvas(position);
                let target = board
                    .top_element_at(point)
                    .filter(|id| board.element(*id).is_some_and(|e| e.is_text() || e.is_box()));
                if let Some(id) = target {
                    self.start_text_edit(board, id, false, effects);
                }
            }
            _ => {}
        }
    }

    fn key_down(
        &mut self,
        board: &mut Board,
        key: Key,
        modifiers: Modifiers,
        effects: &mut Vec<Effect>,
    ) {
        let editing = matches!(self.state, InteractionState::EditingText { .. });
        match key {
            Key::Space if !editing => self.space_held = true,
            Key::Enter => match &self.state {
                InteractionState::DrawingConnector { .. } => self.commit_connector(board, effects),
                InteractionState::EditingText { .. } if !modifiers.shift => {
                    self.commit_text_edit(board, effects);
                }
                _ => {}
            },
            Key::Escape => match &self.state {
                InteractionState::DrawingConnector { .. } | InteractionState::Drawing { .. } => {
                    self.take_state();
                    effects.push(Effect::Redraw);
                }
                InteractionState::EditingText { .. } => self.abort_text_edit(board, effects),
                InteractionState::Idle if !board.selection().is_empty() => {
                    board.clear_selection();
                    effects.push(Effect::SelectionChanged);
                    effects.push(Effect::Redraw);
                }
                _ => {}
            },
            Key::Delete | Key::Backspace if self.is_idle() => {
                let deleted = board.delete_selection();
                if !deleted.is_empty() {
                    effects.extend(deleted.into_iter().map(Effect::Deleted));
                    effects.push(Effect::SelectionChanged);
                    effects.push(Effect::Redraw);
                }
            }
            Key::Character(c) if self.is_idle() && modifiers.command() => {
                let changed = match c.to_ascii_lowercase() {
                    'z' if modifiers.shift => board.redo(),
                    'z' => board.undo(),
                    'y' => board.redo(),
                    'a' => {
                        board.select_all();
                        effects.push(Effect::SelectionChanged);
                        effects.push(Effect::Redraw);
                        false
                    }
                    _ => false,
                };
                if changed {
                    effects.push(Effect::SelectionChanged);
                    effects.push(Effect::Redraw);
                }
            }
            _ => {}
        }
    }

    /// Put a finished element on the board and select it.
    fn commit_new_element(&mut self, board: &mut Board, element: Element, effects: &mut Vec<Effect>) {
        let id = element.id;
        board.add_element(element.clone());
        board.select_elements(&[id]);
        effects.push(Effect::Created(element));
        effects.push(Effect::SelectionChanged);
        if !board.config.tool_lock && board.set_tool(ToolKind::Select) {
            effects.push(Effect::ToolChanged(ToolKind::Select));
        }
        effects.push(Effect::Redraw);
    }

    fn commit_connector(&mut self, board: &mut Board, effects: &mut Vec<Effect>) {
        let InteractionState::DrawingConnector { mut element } = self.take_state() else {
            return;
        };
        finish_connector(&mut element);
        bind_connector(&mut element, board.elements(), board.config.binding_threshold);
        self.commit_new_element(board, element, effects);
    }

    fn start_text_edit(
        &mut self,
        board: &mut Board,
        id: ElementId,
        created: bool,
        effects: &mut Vec<Effect>,
    ) {
        let Some(snapshot) = board.element(id).cloned() else {
            return;
        };
        if !created {
            board.push_undo();
        }
        board.select_elements(&[id]);
        effects.push(Effect::SelectionChanged);
        effects.push(Effect::Redraw);
        self.transition(InteractionState::EditingText {
            element_id: id,
            snapshot,
            created,
        });
    }

    /// Finish the current text edit. Text that trims to nothing deletes a
    /// text element and clears a box label.
    fn commit_text_edit(&mut self, board: &mut Board, effects: &mut Vec<Effect>) {
        let InteractionState::EditingText {
            element_id,
            snapshot,
            created,
        } = self.take_state()
        else {
            return;
        };
        let Some(mut element) = board.element(element_id).cloned() else {
            return;
        };

        let empty = element.text_content().is_none_or(|t| t.trim().is_empty());
        match &mut element.kind {
            ElementKind::Text(_) if empty => {
                if created {
                    board.abandon_element(element_id);
                } else {
                    board.remove_element(element_id);
                }
                effects.push(Effect::Deleted(element_id));
                effects.push(Effect::SelectionChanged);
                effects.push(Effect::Redraw);
                return;
            }
            ElementKind::Text(t) => {
                let height = layout_text(t, board.measurer()).size.height;
                t.height = height;
            }
            ElementKind::Rectangle(b) | ElementKind::Diamond(b) | ElementKind::Ellipse(b)
                if empty =>
            {
                b.label = None;
            }
            _ => {}
        }

        if !created && element == snapshot {
            if board.element(element_id) != Some(&element) {
                board.restore_element(element);
            }
            board.discard_undo_snapshot();
            return;
        }
        board.restore_element(element.clone());
        effects.push(Effect::Updated(element));
        effects.push(Effect::Redraw);
    }

    /// Abort the current text edit, restoring the text from before it began.
    /// A text element created by this edit is removed.
    pub fn cancel_text_edit(&mut self, board: &mut Board) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.abort_text_edit(board, &mut effects);
        effects
    }

    fn abort_text_edit(&mut self, board: &mut Board, effects: &mut Vec<Effect>) {
        let InteractionState::EditingText {
            element_id,
            snapshot,
            created,
        } = self.take_state()
        else {
            return;
        };
        if created {
            board.abandon_element(element_id);
            effects.push(Effect::Deleted(element_id));
            effects.push(Effect::SelectionChanged);
        } else {
            board.restore_element(snapshot.clone());
            board.discard_undo_snapshot();
            effects.push(Effect::Updated(snapshot));
        }
        effects.push(Effect::Redraw);
    }

    /// Abandon whatever gesture is active (lost pointer capture, tool
    /// switch). In-progress drawings are discarded; moves made so far are kept
    /// and committed; a text edit is committed.
    pub fn reset(&mut self, board: &mut Board) -> Vec<Effect> {
        let mut effects = Vec::new();
        match &self.state {
            InteractionState::EditingText { .. } => self.commit_text_edit(board, &mut effects),
            InteractionState::Dragging { last, .. } => {
                let last = board.canvas.canvas_to_screen(*last);
                self.pointer_up(board, last, &mut effects);
            }
            InteractionState::Panning { last_screen } => {
                let last = *last_screen;
                self.pointer_up(board, last, &mut effects);
            }
            InteractionState::Resizing { moved: true, .. }
            | InteractionState::GroupResizing { moved: true, .. }
            | InteractionState::DraggingPoint { moved: true, .. } => {
                let ids: Vec<ElementId> = match self.take_state() {
                    InteractionState::Resizing { element_id, .. }
                    | InteractionState::DraggingPoint { element_id, .. } => vec![element_id],
                    InteractionState::GroupResizing { originals, .. } => {
                        originals.iter().map(|e| e.id).collect()
                    }
                    _ => Vec::new(),
                };
                finish_move(board, &ids, &mut effects);
            }
            _ => {
                if self.preview_element().is_some() || self.selection_rect().is_some() {
                    effects.push(Effect::Redraw);
                }
                self.take_state();
            }
        }
        self.state = InteractionState::Idle;
        self.space_held = false;
        effects
    }
}

/// Persist moved elements and let bound connectors follow.
fn finish_move(board: &mut Board, ids: &[ElementId], effects: &mut Vec<Effect>) {
    let connectors = board.commit_geometry(ids);
    for id in ids.iter().chain(connectors.iter().filter(|c| !ids.contains(c))) {
        if let Some(element) = board.element(*id) {
            effects.push(Effect::Updated(element.clone()));
        }
    }
    effects.push(Effect::Redraw);
}

/// After a connector endpoint is dragged, bind it to whatever anchor it was
/// dropped near (or unbind it).
fn rebind_endpoint(board: &mut Board, id: ElementId, index: usize) {
    let Some(mut connector) = board.element(id).filter(|e| e.is_connector()).cloned() else {
        return;
    };
    let points = connector.absolute_points();
    let last = points.len().saturating_sub(1);
    if index != 0 && index != last {
        return;
    }
    let binding = nearest_anchor(
        points[index],
        board.elements(),
        Some(id),
        board.config.binding_threshold,
    );
    if let Some(shape) = connector.as_connector_mut() {
        if index == 0 {
            shape.start_binding = binding;
        } else {
            shape.end_binding = binding;
        }
    }
    resolve_connector(&mut connector, board.elements());
    if let Some(slot) = board.element_mut(id) {
        *slot = connector;
    }
}
