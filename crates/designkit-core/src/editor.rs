//! Editor state: the element store plus everything that coordinates around it.

use crate::align::{self, Alignment, Axis};
use crate::config::EditorConfig;
use crate::deferred::Debouncer;
use crate::drag::DragController;
use crate::element::{DesignElement, ElementId, ElementPatch, GroupId, NewElement};
use crate::history::{BranchId, History, SnapshotId};
use crate::input::{Gesture, Modifiers, MouseButton};
use crate::selection::MultiSelection;
use crate::shortcuts::{EditorAction, ShortcutRegistry};
use crate::store::{ElementStore, StoreResult};
use crate::tools::{ToolKind, ToolManager};
use crate::viewport::Viewport;
use kurbo::{Point, Rect};
use std::collections::HashSet;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Minimum marquee size (screen pixels) before it counts as an area selection.
const MARQUEE_THRESHOLD: f64 = 2.0;

/// The pointer interaction in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    None,
    Dragging { moved: bool },
    Marquee { start: Point, current: Point },
    Panning { last: Point },
}

/// Runtime editor state (not persisted).
///
/// Owns the live collection exclusively. Collaborators only see it through
/// `&ElementStore`, and every mutation is sequenced here so that deletions
/// also clear selection and drag state.
#[derive(Debug, Clone)]
pub struct Editor {
    store: ElementStore,
    selection: MultiSelection,
    drag: DragController,
    history: History,
    viewport: Viewport,
    /// Tool manager.
    pub tools: ToolManager,
    config: EditorConfig,
    snapshot_debounce: Debouncer,
    pending_snapshot: Option<String>,
    interaction: Interaction,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an editor with an empty document and default config.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    /// Create an editor with an empty document.
    pub fn with_config(config: EditorConfig) -> Self {
        Self::with_store(ElementStore::new(), config)
    }

    /// Create an editor around an existing document.
    /// The document's state becomes the first history snapshot.
    pub fn with_store(store: ElementStore, config: EditorConfig) -> Self {
        let mut history = History::new(config.max_history);
        history.save_snapshot(&store, "Initial state");
        Self {
            store,
            selection: MultiSelection::new(),
            drag: DragController::new(Duration::from_millis(config.drag_throttle_ms)),
            history,
            viewport: Viewport::from_config(&config),
            tools: ToolManager::new(),
            snapshot_debounce: Debouncer::new(Duration::from_millis(config.snapshot_debounce_ms)),
            pending_snapshot: None,
            interaction: Interaction::None,
            config,
        }
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn selection(&self) -> &MultiSelection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Ids the bulk operations act on: the multi-selection, or the
    /// single-selected element when the set is empty.
    pub fn selected_ids(&self) -> Vec<ElementId> {
        if self.selection.is_empty() {
            self.store.selected().into_iter().collect()
        } else {
            self.selection.ids().to_vec()
        }
    }

    // --- Document mutations ---

    /// Add an element and record it in history.
    pub fn add_element(&mut self, new: NewElement) -> StoreResult<ElementId> {
        let label = format!("Add {}", new.kind.name());
        let id = self.store.add(new)?;
        self.commit(label);
        Ok(id)
    }

    /// Update an element. Edits arrive in bursts (sliders, typing), so the
    /// history snapshot is debounced.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> StoreResult<()> {
        self.store.update(id, patch)?;
        self.request_snapshot("Edit element");
        Ok(())
    }

    /// Single-select an element (or clear with `None`), mirroring it into
    /// the multi-selection.
    pub fn select(&mut self, id: Option<ElementId>) -> Option<ElementId> {
        let selected = self.store.select(id);
        match selected {
            Some(id) => self.selection.select_multiple(&self.store, [id]),
            None => self.selection.clear_selection(),
        }
        selected
    }

    /// Delete an element and every reference to it.
    pub fn delete_element(&mut self, id: ElementId) -> StoreResult<DesignElement> {
        let removed = self.remove_element(id)?;
        self.commit(format!("Delete {}", removed.kind.name()));
        Ok(removed)
    }

    fn remove_element(&mut self, id: ElementId) -> StoreResult<DesignElement> {
        if self.drag.dragged_element() == Some(id) {
            self.drag.cancel_drag(&mut self.store);
            self.interaction = Interaction::None;
        }
        let removed = self.store.delete(id)?;
        for event in self.store.drain_events() {
            self.selection.handle_event(event);
        }
        Ok(removed)
    }

    /// Delete every selected element. Returns how many were deleted.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selected_ids();
        let deleted = ids.into_iter().filter(|&id| self.remove_element(id).is_ok()).count();
        if deleted > 0 {
            self.commit(format!("Delete {deleted} element(s)"));
        }
        deleted
    }

    /// Show or hide an element.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> StoreResult<()> {
        self.store.set_visible(id, visible)?;
        self.commit(if visible { "Show element" } else { "Hide element" });
        Ok(())
    }

    /// Lock or unlock an element. Locking the dragged element ends the drag
    /// where it started.
    pub fn set_locked(&mut self, id: ElementId, locked: bool) -> StoreResult<()> {
        if locked && self.drag.dragged_element() == Some(id) {
            self.drag.cancel_drag(&mut self.store);
            self.interaction = Interaction::None;
        }
        self.store.set_locked(id, locked)?;
        self.commit(if locked { "Lock element" } else { "Unlock element" });
        Ok(())
    }

    /// Group the selected elements.
    pub fn group_selected(&mut self, name: impl Into<String>) -> Option<GroupId> {
        let ids = self.selected_ids();
        match self.store.group_elements(&ids, name) {
            Ok(group) => {
                self.commit("Group elements");
                Some(group)
            }
            Err(e) => {
                log::debug!("Group skipped: {}", e);
                None
            }
        }
    }

    /// Dissolve every group a selected element belongs to.
    /// Returns the former members.
    pub fn ungroup_selected(&mut self) -> Vec<ElementId> {
        let mut seen = HashSet::new();
        let groups: Vec<GroupId> = self
            .selected_ids()
            .iter()
            .filter_map(|&id| self.store.get(id).and_then(|e| e.group_id))
            .filter(|g| seen.insert(*g))
            .collect();
        let members: Vec<ElementId> = groups
            .into_iter()
            .filter_map(|g| self.store.ungroup(g).ok())
            .flatten()
            .collect();
        if !members.is_empty() {
            self.commit("Ungroup elements");
        }
        members
    }

    /// Align the selected elements.
    pub fn align_selected(&mut self, alignment: Alignment) -> usize {
        let ids = self.selected_ids();
        let report = align::align(&mut self.store, &ids, alignment);
        if !report.applied.is_empty() {
            self.commit("Align elements");
        }
        report.applied.len()
    }

    /// Distribute the selected elements evenly.
    pub fn distribute_selected(&mut self, axis: Axis) -> usize {
        let ids = self.selected_ids();
        let report = align::distribute(&mut self.store, &ids, axis);
        if !report.applied.is_empty() {
            self.commit("Distribute elements");
        }
        report.applied.len()
    }

    fn reorder_selected(&mut self, label: &str, f: fn(&mut ElementStore, ElementId) -> bool) -> bool {
        let mut changed = false;
        for id in self.selected_ids() {
            changed |= f(&mut self.store, id);
        }
        if changed {
            self.commit(label);
        }
        changed
    }

    // --- History ---

    /// Snapshot the collection now, dropping any pending debounced snapshot.
    pub fn commit(&mut self, label: impl Into<String>) -> Option<SnapshotId> {
        self.snapshot_debounce.cancel();
        self.pending_snapshot = None;
        self.history.save_snapshot(&self.store, label)
    }

    /// Ask for a snapshot once edits have been quiet for the debounce period.
    pub fn request_snapshot(&mut self, label: impl Into<String>) {
        self.request_snapshot_at(label, Instant::now());
    }

    /// Like [`request_snapshot`](Self::request_snapshot), with an explicit clock.
    pub fn request_snapshot_at(&mut self, label: impl Into<String>, now: Instant) {
        self.pending_snapshot = Some(label.into());
        self.snapshot_debounce.schedule(now);
    }

    /// Take a debounced snapshot if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<SnapshotId> {
        self.snapshot_debounce.poll(now)?;
        let label = self.pending_snapshot.take()?;
        self.history.save_snapshot(&self.store, label)
    }

    fn flush_pending_snapshot(&mut self) {
        if self.snapshot_debounce.flush().is_some() {
            if let Some(label) = self.pending_snapshot.take() {
                self.history.save_snapshot(&self.store, label);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.snapshot_debounce.is_pending()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo the last committed action.
    pub fn undo(&mut self) -> bool {
        self.settle_for_history();
        let undone = self.history.undo(&mut self.store);
        self.selection.retain_live(&self.store);
        undone
    }

    /// Redo the last undone action.
    pub fn redo(&mut self) -> bool {
        self.settle_for_history();
        let redone = self.history.redo(&mut self.store);
        self.selection.retain_live(&self.store);
        redone
    }

    /// Jump to a snapshot of the current history branch.
    pub fn jump_to(&mut self, snapshot: SnapshotId) -> bool {
        self.settle_for_history();
        let moved = self.history.jump_to(&mut self.store, snapshot);
        self.selection.retain_live(&self.store);
        moved
    }

    /// Fork a history branch from the current state and make it current.
    pub fn create_branch(&mut self, name: impl Into<String>) -> BranchId {
        self.settle_for_history();
        self.history.create_branch(name)
    }

    /// Switch history branches, restoring that branch's state.
    pub fn switch_branch(&mut self, branch: BranchId) -> bool {
        self.settle_for_history();
        let switched = self.history.switch_branch(&mut self.store, branch);
        self.selection.retain_live(&self.store);
        switched
    }

    fn settle_for_history(&mut self) {
        if self.drag.is_dragging() {
            self.drag.cancel_drag(&mut self.store);
        }
        self.interaction = Interaction::None;
        self.flush_pending_snapshot();
    }

    // --- Zoom ---

    pub fn zoom_to_fit(&mut self) -> bool {
        self.viewport.zoom_to_fit(self.store.elements())
    }

    pub fn zoom_to_selection(&mut self) -> bool {
        let selected: Vec<&DesignElement> =
            self.selected_ids().iter().filter_map(|&id| self.store.get(id)).collect();
        self.viewport.zoom_to_selection(selected, self.store.elements())
    }

    /// Elements to hand to a renderer: visible, in the viewport, back to front.
    pub fn visible_elements(&self) -> Vec<&DesignElement> {
        self.viewport.visible_elements(self.store.paint_order())
    }

    /// Advance animations and debounced work. Returns true while a redraw
    /// is needed for an in-flight animation.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.poll(now);
        self.viewport.tick(now)
    }

    // --- Pointer and keyboard ---

    /// Marquee rectangle in document coordinates, while area-selecting.
    pub fn marquee_rect(&self) -> Option<Rect> {
        match self.interaction {
            Interaction::Marquee { start, current } => Some(Rect::from_points(
                self.viewport.screen_to_world(start),
                self.viewport.screen_to_world(current),
            )),
            _ => None,
        }
    }

    /// Dispatch a gesture reported by a renderer.
    pub fn handle_gesture(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::PointerDown {
                position,
                button: MouseButton::Left,
                modifiers,
            } => self.pointer_down(position, modifiers),
            Gesture::PointerDown {
                position,
                button: MouseButton::Middle,
                ..
            } => self.interaction = Interaction::Panning { last: position },
            Gesture::PointerDown { .. } => {}
            Gesture::PointerMove { position } => self.pointer_move(position),
            Gesture::PointerUp { position, .. } => self.pointer_up(position),
            Gesture::Scroll {
                position,
                delta,
                modifiers,
            } => {
                if modifiers.command() {
                    let factor = if delta.y < 0.0 { 1.1 } else { 1.0 / 1.1 };
                    self.viewport.zoom_at(position, factor);
                } else {
                    self.viewport.pan(-delta);
                }
            }
            Gesture::KeyDown { key, modifiers } => {
                self.handle_key(&key, modifiers);
            }
        }
    }

    /// Pointer pressed at a screen position.
    pub fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) {
        let world = self.viewport.screen_to_world(screen);
        match self.tools.current_tool {
            ToolKind::Select => self.select_at(screen, world, modifiers),
            ToolKind::Pan => self.interaction = Interaction::Panning { last: screen },
            ToolKind::Pen | ToolKind::Shape | ToolKind::Text => {
                let Some(new) = self.tools.new_element(world) else {
                    return;
                };
                if let Ok(id) = self.add_element(new) {
                    self.select(Some(id));
                    self.tools.element_created();
                }
            }
        }
    }

    fn select_at(&mut self, screen: Point, world: Point, modifiers: Modifiers) {
        let tolerance = self.config.hit_tolerance / self.viewport.zoom();
        match self.store.element_at(world, tolerance) {
            Some(id) if modifiers.shift => {
                let now_selected = self.selection.select_element(&self.store, id, true);
                self.store.select(now_selected.then_some(id));
            }
            Some(id) => {
                if !self.selection.contains(id) {
                    self.selection.select_element(&self.store, id, false);
                }
                self.store.select(Some(id));
                if self.drag.start_drag(&self.store, id, world.x, world.y) {
                    self.interaction = Interaction::Dragging { moved: false };
                }
            }
            None => {
                if !modifiers.shift {
                    self.selection.clear_selection();
                    self.store.select(None);
                }
                self.interaction = Interaction::Marquee {
                    start: screen,
                    current: screen,
                };
            }
        }
    }

    /// Pointer moved to a screen position.
    pub fn pointer_move(&mut self, screen: Point) {
        match &mut self.interaction {
            Interaction::Dragging { moved } => {
                *moved = true;
                let world = self.viewport.screen_to_world(screen);
                self.drag.update_drag(&mut self.store, world.x, world.y);
                if !self.drag.is_dragging() {
                    self.interaction = Interaction::None;
                }
            }
            Interaction::Marquee { current, .. } => *current = screen,
            Interaction::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan(delta);
            }
            Interaction::None => {}
        }
    }

    /// Pointer released at a screen position.
    pub fn pointer_up(&mut self, screen: Point) {
        match std::mem::replace(&mut self.interaction, Interaction::None) {
            Interaction::Dragging { moved } => {
                if moved {
                    let world = self.viewport.screen_to_world(screen);
                    self.drag.update_drag(&mut self.store, world.x, world.y);
                }
                self.drag.end_drag(&mut self.store);
                if moved {
                    self.commit("Move element");
                }
            }
            Interaction::Marquee { start, .. } => {
                if start.distance(screen) < MARQUEE_THRESHOLD {
                    return;
                }
                let a = self.viewport.screen_to_world(start);
                let b = self.viewport.screen_to_world(screen);
                self.selection.select_in_area(&self.store, a.x, a.y, b.x, b.y);
                let primary = self.selection.ids().first().copied();
                self.store.select(primary);
            }
            Interaction::Panning { .. } | Interaction::None => {}
        }
    }

    /// Handle a key press. Returns true if it triggered an action.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        match ShortcutRegistry::resolve(key, modifiers) {
            Some(action) => self.apply_action(action),
            None => false,
        }
    }

    /// Run an editor action. Returns true if anything changed.
    pub fn apply_action(&mut self, action: EditorAction) -> bool {
        log::debug!("Action: {:?}", action);
        match action {
            EditorAction::Undo => self.undo(),
            EditorAction::Redo => self.redo(),
            EditorAction::SelectAll => {
                self.selection.select_all(&self.store);
                !self.selection.is_empty()
            }
            EditorAction::DeleteSelection => self.delete_selected() > 0,
            EditorAction::Cancel => {
                if self.drag.is_dragging() {
                    self.drag.cancel_drag(&mut self.store);
                    self.interaction = Interaction::None;
                } else {
                    self.selection.clear_selection();
                    self.store.select(None);
                }
                true
            }
            EditorAction::Group => self.group_selected("Group").is_some(),
            EditorAction::Ungroup => !self.ungroup_selected().is_empty(),
            EditorAction::BringToFront => self.reorder_selected("Bring to front", ElementStore::bring_to_front),
            EditorAction::SendToBack => self.reorder_selected("Send to back", ElementStore::send_to_back),
            EditorAction::BringForward => self.reorder_selected("Bring forward", ElementStore::bring_forward),
            EditorAction::SendBackward => self.reorder_selected("Send backward", ElementStore::send_backward),
            EditorAction::ZoomIn => {
                self.viewport.zoom_in();
                true
            }
            EditorAction::ZoomOut => {
                self.viewport.zoom_out();
                true
            }
            EditorAction::ZoomReset => {
                self.viewport.reset();
                true
            }
            EditorAction::ZoomToFit => self.zoom_to_fit(),
            EditorAction::ZoomToSelection => self.zoom_to_selection(),
            EditorAction::ToggleMultiSelect => {
                self.selection.toggle_multi_select_mode(None);
                true
            }
            EditorAction::SetTool(tool) => {
                self.tools.set_tool(tool);
                true
            }
        }
    }

    // --- Persistence ---

    /// Serialize the document.
    pub fn to_json(&self) -> StoreResult<String> {
        self.store.to_json()
    }

    /// Replace the document with one loaded from JSON, resetting history.
    pub fn load_json(&mut self, json: &str) -> StoreResult<()> {
        let store = ElementStore::from_json(json)?;
        let tools = std::mem::take(&mut self.tools);
        let viewport = self.viewport.clone();
        *self = Self::with_store(store, self.config.clone());
        self.tools = tools;
        self.viewport = viewport;
        Ok(())
    }
}
