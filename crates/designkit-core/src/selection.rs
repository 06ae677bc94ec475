//! Multi-selection set, independent of the store's single `selected` flag.

use crate::element::{DesignElement, ElementId};
use crate::store::{ElementStore, StoreEvent, union_bounds};
use kurbo::{Point, Rect};
use std::collections::HashSet;

/// The set of element ids used by bulk operations (align, group, delete).
///
/// Ids are kept in the order they were selected. Every operation re-derives
/// the set against the live collection, so it never holds a deleted id for
/// longer than the next call.
#[derive(Debug, Clone, Default)]
pub struct MultiSelection {
    ids: Vec<ElementId>,
    multi_select_mode: bool,
}

impl MultiSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an element.
    ///
    /// Non-additive selection always ends with exactly `{id}`, re-clicking a
    /// selected element does not deselect it. Additive selection (or any
    /// selection while multi-select mode is on) toggles membership.
    /// Returns whether `id` is selected afterwards.
    pub fn select_element(&mut self, store: &ElementStore, id: ElementId, additive: bool) -> bool {
        self.retain_live(store);
        if !store.contains(id) {
            log::debug!("Ignoring selection of unknown element {}", id);
            return false;
        }
        if additive || self.multi_select_mode {
            if let Some(pos) = self.ids.iter().position(|&s| s == id) {
                self.ids.remove(pos);
                false
            } else {
                self.ids.push(id);
                true
            }
        } else {
            self.ids.clear();
            self.ids.push(id);
            true
        }
    }

    /// Replace the selection wholesale. Unknown ids are dropped.
    pub fn select_multiple(&mut self, store: &ElementStore, ids: impl IntoIterator<Item = ElementId>) {
        let mut seen = HashSet::new();
        self.ids = ids
            .into_iter()
            .filter(|&id| store.contains(id) && seen.insert(id))
            .collect();
    }

    /// Replace the selection with every visible element whose center lies
    /// inside the rectangle spanned by the two corners (edges inclusive).
    /// Returns the number of selected elements.
    pub fn select_in_area(&mut self, store: &ElementStore, x1: f64, y1: f64, x2: f64, y2: f64) -> usize {
        let area = Rect::from_points(Point::new(x1, y1), Point::new(x2, y2));
        let hits: Vec<ElementId> = store
            .elements()
            .iter()
            .filter(|e| e.visible && contains_inclusive(area, e.center()))
            .map(|e| e.id)
            .collect();
        self.select_multiple(store, hits);
        self.ids.len()
    }

    /// Select every element in the collection.
    pub fn select_all(&mut self, store: &ElementStore) {
        self.ids = store.ids().collect();
    }

    /// Empty the selection.
    pub fn clear_selection(&mut self) {
        self.ids.clear();
    }

    /// Toggle multi-select mode, or set it explicitly.
    /// Turning the mode off clears the selection. Returns the new mode.
    pub fn toggle_multi_select_mode(&mut self, enabled: Option<bool>) -> bool {
        self.multi_select_mode = enabled.unwrap_or(!self.multi_select_mode);
        if !self.multi_select_mode {
            self.ids.clear();
        }
        self.multi_select_mode
    }

    pub fn is_multi_select_mode(&self) -> bool {
        self.multi_select_mode
    }

    /// Drop ids that are no longer in the collection.
    pub fn retain_live(&mut self, store: &ElementStore) {
        self.ids.retain(|&id| store.contains(id));
    }

    /// Remove a single id, e.g. after its element was deleted.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&s| s != id);
        self.ids.len() != before
    }

    /// Apply a store change notification.
    pub fn handle_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Deleted(id) => {
                self.remove(id);
            }
        }
    }

    /// Selected ids in selection order.
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The selected elements, in selection order.
    pub fn selected_elements<'a>(&self, store: &'a ElementStore) -> Vec<&'a DesignElement> {
        self.ids.iter().filter_map(|&id| store.get(id)).collect()
    }

    /// Union bounding box of the selected elements.
    pub fn bounds(&self, store: &ElementStore) -> Option<Rect> {
        union_bounds(self.selected_elements(store))
    }
}

fn contains_inclusive(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}
