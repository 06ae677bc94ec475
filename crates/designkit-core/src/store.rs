//! Element store: the single owner of the live element collection.
//!
//! Every mutation of the collection goes through [`ElementStore`]. Rejected
//! operations come back as a [`StoreError`] and leave the collection exactly
//! as it was; none of them panic.

use crate::element::{DesignElement, ElementId, ElementPatch, GroupId, LayerGroup, NewElement};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Element store errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Invalid position: x and y must be finite numbers")]
    InvalidPosition,
    #[error("Invalid element: {0}")]
    InvalidElement(String),
    #[error("Element not found: {0}")]
    NotFound(ElementId),
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),
    #[error("Duplicate element id: {0}")]
    DuplicateId(ElementId),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of [`ElementStore::bulk_update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkUpdateReport {
    /// Ids whose update was applied.
    pub applied: Vec<ElementId>,
    /// Ids whose update was skipped, with the reason.
    pub rejected: Vec<(ElementId, StoreError)>,
}

impl BulkUpdateReport {
    /// True when every requested update was applied.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Change notifications recorded by the store, drained by dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Deleted(ElementId),
}

/// Serialized form of the store.
#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    elements: Vec<DesignElement>,
    #[serde(default)]
    groups: Vec<LayerGroup>,
}

/// Ordered collection of design elements plus single-selection and layer groups.
///
/// Insertion order is the z-order tiebreak for elements sharing a `z_index`.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<DesignElement>,
    selected: Option<ElementId>,
    groups: Vec<LayerGroup>,
    events: Vec<StoreEvent>,
}

impl ElementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new element. Returns the freshly assigned id.
    ///
    /// The element is not selected.
    pub fn add(&mut self, new: NewElement) -> StoreResult<ElementId> {
        if !new.x.is_finite() || !new.y.is_finite() {
            log::warn!("Rejected element with invalid position ({}, {})", new.x, new.y);
            return Err(StoreError::InvalidPosition);
        }
        let id = self.fresh_id()?;
        let element = new.into_element(id);
        self.insert_validated(element)
    }

    /// Add an element from a loosely typed JSON object, as produced by
    /// rendering adapters.
    ///
    /// `id` and `selected` in the input are ignored.
    pub fn add_json(&mut self, value: &Value) -> StoreResult<ElementId> {
        let Some(object) = value.as_object() else {
            log::warn!("Rejected element: not a JSON object");
            return Err(StoreError::InvalidElement("element must be a JSON object".into()));
        };
        let finite = |key: &str| object.get(key).and_then(Value::as_f64).is_some_and(f64::is_finite);
        if !finite("x") || !finite("y") {
            log::warn!("Rejected element with missing or non-numeric position");
            return Err(StoreError::InvalidPosition);
        }

        let id = self.fresh_id()?;
        let mut object = object.clone();
        object.insert("id".into(), Value::String(id.to_string()));
        object.insert("selected".into(), Value::Bool(false));

        let mut element: DesignElement = serde_json::from_value(Value::Object(object)).map_err(|e| {
            log::warn!("Rejected element: {}", e);
            StoreError::InvalidElement(e.to_string())
        })?;
        if element.group_id.is_some_and(|g| self.group(g).is_none()) {
            element.group_id = None;
        }
        element.children.retain(|child| self.contains(*child));
        self.insert_validated(element)
    }

    fn fresh_id(&self) -> StoreResult<ElementId> {
        let id = Uuid::new_v4();
        if self.contains(id) {
            log::error!("Generated id {} already exists", id);
            return Err(StoreError::DuplicateId(id));
        }
        Ok(id)
    }

    fn insert_validated(&mut self, element: DesignElement) -> StoreResult<ElementId> {
        if let Err(e) = element.validate() {
            log::warn!("Rejected {} element: {}", element.kind.name(), e);
            return Err(e);
        }
        let id = element.id;
        if let Some(group_id) = element.group_id {
            if let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) {
                group.children.push(id);
            }
        }
        log::debug!("Added {} element {}", element.kind.name(), id);
        self.elements.push(element);
        Ok(id)
    }

    /// Merge a partial update into an element.
    ///
    /// The merged result is validated first; an invalid merge is discarded
    /// and the element is left untouched.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> StoreResult<()> {
        let index = self.index_of(id)?;
        let merged = patch.apply(&self.elements[index]);
        if let Err(e) = merged.validate() {
            log::warn!("Rejected update of {}: {}", id, e);
            return Err(e);
        }
        self.elements[index] = merged;
        Ok(())
    }

    /// Merge a loosely typed JSON patch into an element.
    ///
    /// Field type mismatches are reported as [`StoreError::InvalidElement`],
    /// a non-numeric `x`/`y` as [`StoreError::InvalidPosition`]. `selected`,
    /// `groupId` and `children` keep their current values.
    pub fn update_json(&mut self, id: ElementId, patch: &Value) -> StoreResult<()> {
        let index = self.index_of(id)?;
        let Some(patch) = patch.as_object() else {
            return Err(StoreError::InvalidElement("patch must be a JSON object".into()));
        };
        for key in ["x", "y"] {
            if patch.get(key).is_some_and(|v| !v.as_f64().is_some_and(f64::is_finite)) {
                log::warn!("Rejected update of {}: non-numeric {}", id, key);
                return Err(StoreError::InvalidPosition);
            }
        }

        let current = &self.elements[index];
        let mut merged = serde_json::to_value(current)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if let Some(object) = merged.as_object_mut() {
            for (key, value) in patch {
                if key == "id" && value.as_str() != Some(id.to_string().as_str()) {
                    return Err(StoreError::InvalidElement("id is immutable".into()));
                }
                object.insert(key.clone(), value.clone());
            }
        }

        let mut merged: DesignElement = serde_json::from_value(merged).map_err(|e| {
            log::warn!("Rejected update of {}: {}", id, e);
            StoreError::InvalidElement(e.to_string())
        })?;
        merged.selected = current.selected;
        merged.group_id = current.group_id;
        merged.children = current.children.clone();
        if let Err(e) = merged.validate() {
            log::warn!("Rejected update of {}: {}", id, e);
            return Err(e);
        }
        self.elements[index] = merged;
        Ok(())
    }

    /// Apply several updates against one resulting collection.
    ///
    /// Best-effort: valid updates are applied together, invalid or unknown
    /// entries are skipped and reported. Later entries see the result of
    /// earlier ones for the same id.
    pub fn bulk_update(
        &mut self,
        updates: impl IntoIterator<Item = (ElementId, ElementPatch)>,
    ) -> BulkUpdateReport {
        let mut working = self.elements.clone();
        let mut report = BulkUpdateReport::default();

        for (id, patch) in updates {
            let Some(index) = working.iter().position(|e| e.id == id) else {
                log::debug!("Bulk update skipped unknown element {}", id);
                report.rejected.push((id, StoreError::NotFound(id)));
                continue;
            };
            let merged = patch.apply(&working[index]);
            match merged.validate() {
                Ok(()) => {
                    working[index] = merged;
                    report.applied.push(id);
                }
                Err(e) => {
                    log::warn!("Bulk update skipped {}: {}", id, e);
                    report.rejected.push((id, e));
                }
            }
        }

        self.elements = working;
        report
    }

    /// Single-select an element, or clear the selection with `None`.
    ///
    /// Selecting an id that is not in the collection clears the selection.
    /// Returns the id that ended up selected.
    pub fn select(&mut self, id: Option<ElementId>) -> Option<ElementId> {
        let target = id.filter(|id| self.contains(*id));
        if let (Some(requested), None) = (id, target) {
            log::debug!("Select of unknown element {}; clearing selection", requested);
        }
        for element in &mut self.elements {
            element.selected = Some(element.id) == target;
        }
        self.selected = target;
        target
    }

    /// Remove an element, clearing the selection pointer and group membership.
    pub fn delete(&mut self, id: ElementId) -> StoreResult<DesignElement> {
        let index = self.index_of(id)?;
        let removed = self.elements.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.detach_from_groups(id);
        self.events.push(StoreEvent::Deleted(id));
        log::debug!("Deleted element {}", id);
        Ok(removed)
    }

    fn detach_from_groups(&mut self, id: ElementId) {
        for element in &mut self.elements {
            element.children.retain(|&child| child != id);
        }
        for group in &mut self.groups {
            group.children.retain(|&child| child != id);
        }
        let before = self.groups.len();
        self.groups.retain(|g| !g.children.is_empty());
        if self.groups.len() != before {
            log::debug!("Dropped {} empty group(s)", before - self.groups.len());
        }
    }

    /// Take the events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    /// Remove all elements and groups.
    pub fn clear(&mut self) {
        self.events.extend(self.elements.iter().map(|e| StoreEvent::Deleted(e.id)));
        self.elements.clear();
        self.groups.clear();
        self.selected = None;
    }

    fn index_of(&self, id: ElementId) -> StoreResult<usize> {
        self.elements.iter().position(|e| e.id == id).ok_or_else(|| {
            log::debug!("Element {} not found", id);
            StoreError::NotFound(id)
        })
    }

    /// Get an element by id.
    pub fn get(&self, id: ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Check if an element is in the collection.
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    /// All elements in insertion order.
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    /// All element ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().map(|e| e.id)
    }

    /// Elements back to front: ascending `z_index`, insertion order for ties.
    pub fn paint_order(&self) -> Vec<&DesignElement> {
        let mut ordered: Vec<&DesignElement> = self.elements.iter().collect();
        ordered.sort_by_key(|e| e.z_index);
        ordered
    }

    /// The single-selected element id.
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// The single-selected element.
    pub fn selected_element(&self) -> Option<&DesignElement> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Topmost visible element under a point (document coordinates).
    pub fn element_at(&self, point: Point, tolerance: f64) -> Option<ElementId> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|e| e.visible && e.hit_test(point, tolerance))
            .map(|e| e.id)
    }

    /// Union bounding box of all elements.
    pub fn bounds(&self) -> Option<Rect> {
        union_bounds(self.elements.iter())
    }

    /// Bring an element to the front (topmost).
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        self.reorder(id, |order, pos| {
            let id = order.remove(pos);
            order.push(id);
            true
        })
    }

    /// Send an element to the back (bottommost).
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.reorder(id, |order, pos| {
            let id = order.remove(pos);
            order.insert(0, id);
            true
        })
    }

    /// Move an element one layer forward.
    /// Returns false if it is already at the front.
    pub fn bring_forward(&mut self, id: ElementId) -> bool {
        self.reorder(id, |order, pos| {
            if pos + 1 < order.len() {
                order.swap(pos, pos + 1);
                true
            } else {
                false
            }
        })
    }

    /// Move an element one layer backward.
    /// Returns false if it is already at the back.
    pub fn send_backward(&mut self, id: ElementId) -> bool {
        self.reorder(id, |order, pos| {
            if pos > 0 {
                order.swap(pos, pos - 1);
                true
            } else {
                false
            }
        })
    }

    /// Rewrite every `z_index` to match a reordered paint order.
    fn reorder(&mut self, id: ElementId, f: impl FnOnce(&mut Vec<ElementId>, usize) -> bool) -> bool {
        let mut order: Vec<ElementId> = self.paint_order().iter().map(|e| e.id).collect();
        let Some(pos) = order.iter().position(|&e| e == id) else {
            log::debug!("Reorder of unknown element {}", id);
            return false;
        };
        if !f(&mut order, pos) {
            return false;
        }
        for (z, id) in order.into_iter().enumerate() {
            if let Some(element) = self.elements.iter_mut().find(|e| e.id == id) {
                element.z_index = z as i32;
            }
        }
        true
    }

    /// Show or hide an element.
    pub fn set_visible(&mut self, id: ElementId, visible: bool) -> StoreResult<()> {
        self.update(id, &ElementPatch { visible: Some(visible), ..Default::default() })
    }

    /// Lock or unlock an element.
    pub fn set_locked(&mut self, id: ElementId, locked: bool) -> StoreResult<()> {
        self.update(id, &ElementPatch { locked: Some(locked), ..Default::default() })
    }

    /// Layer groups.
    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    /// Get a layer group by id.
    pub fn group(&self, id: GroupId) -> Option<&LayerGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Group live elements into a new layer group.
    ///
    /// Unknown ids are ignored; at least two live elements are required.
    /// Elements already in another group are moved out of it.
    pub fn group_elements(&mut self, ids: &[ElementId], name: impl Into<String>) -> StoreResult<GroupId> {
        let mut seen = HashSet::new();
        let members: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| self.contains(id) && seen.insert(id))
            .collect();
        if members.len() < 2 {
            log::debug!("Grouping needs at least two elements, got {}", members.len());
            return Err(StoreError::InvalidElement("a group needs at least two elements".into()));
        }

        for group in &mut self.groups {
            group.children.retain(|child| !members.contains(child));
        }
        self.groups.retain(|g| !g.children.is_empty());

        let group = LayerGroup::new(name, members.clone());
        let group_id = group.id;
        for element in &mut self.elements {
            if members.contains(&element.id) {
                element.group_id = Some(group_id);
            }
        }
        log::debug!("Created group {} with {} elements", group_id, members.len());
        self.groups.push(group);
        Ok(group_id)
    }

    /// Dissolve a layer group. Returns the former members.
    pub fn ungroup(&mut self, group_id: GroupId) -> StoreResult<Vec<ElementId>> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or(StoreError::GroupNotFound(group_id))?;
        let group = self.groups.remove(index);
        for element in &mut self.elements {
            if element.group_id == Some(group_id) {
                element.group_id = None;
            }
        }
        Ok(group.children)
    }

    /// Show or hide a group and all its members.
    pub fn set_group_visible(&mut self, group_id: GroupId, visible: bool) -> StoreResult<()> {
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or(StoreError::GroupNotFound(group_id))?;
        group.visible = visible;
        for element in &mut self.elements {
            if element.group_id == Some(group_id) {
                element.visible = visible;
            }
        }
        Ok(())
    }

    /// Deep copies of the elements and groups, for history snapshots.
    pub(crate) fn snapshot(&self) -> (Vec<DesignElement>, Vec<LayerGroup>) {
        (self.elements.clone(), self.groups.clone())
    }

    /// Replace the whole collection, e.g. from a history snapshot.
    ///
    /// The selection pointer is re-derived from the restored `selected`
    /// flags, keeping at most one of them set.
    pub(crate) fn restore(&mut self, elements: Vec<DesignElement>, groups: Vec<LayerGroup>) {
        self.elements = elements;
        self.groups = groups;
        self.selected = None;
        for element in &mut self.elements {
            if element.selected && self.selected.is_none() {
                self.selected = Some(element.id);
            } else {
                element.selected = false;
            }
        }
    }

    /// Serialize the collection to JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        let doc = StoredDocument {
            elements: self.elements.clone(),
            groups: self.groups.clone(),
        };
        serde_json::to_string_pretty(&doc).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Load a collection from JSON, validating every element.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let doc: StoredDocument =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut seen = HashSet::new();
        for element in &doc.elements {
            if !seen.insert(element.id) {
                log::error!("Document contains duplicate element id {}", element.id);
                return Err(StoreError::DuplicateId(element.id));
            }
            element.validate()?;
        }

        let mut store = Self::new();
        store.restore(doc.elements, doc.groups);
        let live: HashSet<ElementId> = store.ids().collect();
        for group in &mut store.groups {
            group.children.retain(|child| live.contains(child));
        }
        store.groups.retain(|g| !g.children.is_empty());
        let groups: HashSet<GroupId> = store.groups.iter().map(|g| g.id).collect();
        for element in &mut store.elements {
            if element.group_id.is_some_and(|g| !groups.contains(&g)) {
                log::debug!("Clearing dangling group of element {}", element.id);
                element.group_id = None;
            }
        }
        Ok(store)
    }
}

/// Union bounding box of a set of elements.
pub fn union_bounds<'a>(elements: impl IntoIterator<Item = &'a DesignElement>) -> Option<Rect> {
    elements.into_iter().map(DesignElement::bounds).reduce(|a, b| a.union(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use serde_json::json;

    fn store_with(n: usize) -> (ElementStore, Vec<ElementId>) {
        let mut store = ElementStore::new();
        let ids = (0..n)
            .map(|i| {
                let x = i as f64 * 10.0;
                store.add(NewElement::shape(x, x, "#000").with_size(10.0, 10.0)).unwrap()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_add_assigns_unique_unselected_ids() {
        let (store, ids) = store_with(3);
        assert_eq!(store.len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert!(store.elements().iter().all(|e| !e.selected));
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_add_rejects_invalid_position() {
        let mut store = ElementStore::new();
        let result = store.add(NewElement::shape(f64::INFINITY, 0.0, "#000"));
        assert_eq!(result, Err(StoreError::InvalidPosition));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_invalid_element() {
        let mut store = ElementStore::new();
        let result = store.add(NewElement::shape(0.0, 0.0, ""));
        assert!(matches!(result, Err(StoreError::InvalidElement(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_json() {
        let mut store = ElementStore::new();
        let id = store
            .add_json(&json!({"type": "text", "x": 5, "y": 6, "color": "#111", "content": "Hi", "selected": true}))
            .unwrap();
        let element = store.get(id).unwrap();
        assert_eq!(element.kind, ElementKind::Text);
        assert_eq!(element.content.as_deref(), Some("Hi"));
        assert!(!element.selected);

        assert_eq!(
            store.add_json(&json!({"type": "shape", "x": "a", "y": 0, "color": "#000"})),
            Err(StoreError::InvalidPosition)
        );
        assert!(matches!(
            store.add_json(&json!({"type": "blob", "x": 0, "y": 0, "color": "#000"})),
            Err(StoreError::InvalidElement(_))
        ));
        assert!(matches!(
            store.add_json(&json!({"x": 0, "y": 0, "color": "#000"})),
            Err(StoreError::InvalidElement(_))
        ));
        assert!(matches!(
            store.add_json(&json!({"type": "shape", "x": 0, "y": 0, "color": {"gradient": []}})),
            Err(StoreError::InvalidElement(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_not_found() {
        let mut store = ElementStore::new();
        let missing = Uuid::new_v4();
        assert_eq!(
            store.update(missing, &ElementPatch::position(1.0, 1.0)),
            Err(StoreError::NotFound(missing))
        );
    }

    #[test]
    fn test_invalid_update_keeps_element() {
        let (mut store, ids) = store_with(1);
        let before = store.get(ids[0]).cloned();
        let patch = ElementPatch {
            x: Some(50.0),
            opacity: Some(7.0),
            ..Default::default()
        };
        assert!(store.update(ids[0], &patch).is_err());
        assert_eq!(store.get(ids[0]).cloned(), before);
    }

    #[test]
    fn test_update_json() {
        let (mut store, ids) = store_with(1);
        store.select(Some(ids[0]));
        store.update_json(ids[0], &json!({"color": "#abc", "width": 42})).unwrap();
        let element = store.get(ids[0]).unwrap();
        assert_eq!(element.color, "#abc");
        assert_eq!(element.width, Some(42.0));
        assert!(element.selected);

        let before = store.get(ids[0]).cloned();
        assert!(matches!(
            store.update_json(ids[0], &json!({"color": 12})),
            Err(StoreError::InvalidElement(_))
        ));
        assert!(matches!(
            store.update_json(ids[0], &json!({"selected": "yes"})),
            Err(StoreError::InvalidElement(_))
        ));
        assert_eq!(store.update_json(ids[0], &json!({"x": null})), Err(StoreError::InvalidPosition));
        assert_eq!(store.get(ids[0]).cloned(), before);
    }

    #[test]
    fn test_select_is_exclusive() {
        let (mut store, ids) = store_with(3);
        store.select(Some(ids[0]));
        store.select(Some(ids[2]));
        let selected: Vec<_> = store.elements().iter().filter(|e| e.selected).map(|e| e.id).collect();
        assert_eq!(selected, vec![ids[2]]);
        assert_eq!(store.selected(), Some(ids[2]));
    }

    #[test]
    fn test_select_unknown_clears() {
        let (mut store, ids) = store_with(2);
        store.select(Some(ids[1]));
        assert_eq!(store.select(Some(Uuid::new_v4())), None);
        assert_eq!(store.selected(), None);
        assert!(store.elements().iter().all(|e| !e.selected));
    }

    #[test]
    fn test_delete_clears_selected_pointer() {
        let (mut store, ids) = store_with(2);
        store.select(Some(ids[0]));
        let removed = store.delete(ids[0]).unwrap();
        assert_eq!(removed.id, ids[0]);
        assert_eq!(store.selected(), None);
        assert_eq!(store.delete(ids[0]), Err(StoreError::NotFound(ids[0])));
        assert_eq!(store.drain_events(), vec![StoreEvent::Deleted(ids[0])]);
        assert!(store.drain_events().is_empty());
    }

    #[test]
    fn test_bulk_update_is_best_effort() {
        let (mut store, ids) = store_with(2);
        let missing = Uuid::new_v4();
        let report = store.bulk_update(vec![
            (ids[0], ElementPatch::position(100.0, 100.0)),
            (ids[1], ElementPatch::color("")),
            (missing, ElementPatch::position(0.0, 0.0)),
        ]);
        assert_eq!(report.applied, vec![ids[0]]);
        assert_eq!(report.rejected.len(), 2);
        assert!(!report.is_complete());
        assert_eq!(store.get(ids[0]).unwrap().x, 100.0);
        assert_eq!(store.get(ids[1]).unwrap().color, "#000");
    }

    #[test]
    fn test_z_order() {
        let (mut store, ids) = store_with(3);
        let order = |s: &ElementStore| s.paint_order().iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(order(&store), ids);

        assert!(store.bring_to_front(ids[0]));
        assert_eq!(order(&store), vec![ids[1], ids[2], ids[0]]);

        assert!(store.send_to_back(ids[0]));
        assert_eq!(order(&store), ids);

        assert!(store.bring_forward(ids[1]));
        assert_eq!(order(&store), vec![ids[0], ids[2], ids[1]]);
        assert!(!store.bring_forward(ids[1]));

        assert!(store.send_backward(ids[2]));
        assert_eq!(order(&store), vec![ids[2], ids[0], ids[1]]);
        assert!(!store.send_backward(ids[2]));
    }

    #[test]
    fn test_element_at_prefers_topmost_visible() {
        let mut store = ElementStore::new();
        let back = store.add(NewElement::shape(0.0, 0.0, "#000").with_size(100.0, 100.0)).unwrap();
        let front = store.add(NewElement::shape(50.0, 50.0, "#000").with_size(100.0, 100.0)).unwrap();
        assert_eq!(store.element_at(Point::new(75.0, 75.0), 0.0), Some(front));
        assert_eq!(store.element_at(Point::new(25.0, 25.0), 0.0), Some(back));

        store.set_visible(front, false).unwrap();
        assert_eq!(store.element_at(Point::new(75.0, 75.0), 0.0), Some(back));
        assert_eq!(store.element_at(Point::new(500.0, 500.0), 0.0), None);
    }

    #[test]
    fn test_groups() {
        let (mut store, ids) = store_with(3);
        assert!(store.group_elements(&ids[..1], "One").is_err());

        let group = store.group_elements(&ids[..2], "Pair").unwrap();
        assert_eq!(store.group(group).unwrap().children, ids[..2].to_vec());
        assert_eq!(store.get(ids[0]).unwrap().group_id, Some(group));

        store.set_group_visible(group, false).unwrap();
        assert!(!store.get(ids[1]).unwrap().visible);

        store.delete(ids[0]).unwrap();
        assert_eq!(store.group(group).unwrap().children, vec![ids[1]]);
        store.delete(ids[1]).unwrap();
        assert!(store.group(group).is_none());
    }

    #[test]
    fn test_ungroup() {
        let (mut store, ids) = store_with(2);
        let group = store.group_elements(&ids, "Pair").unwrap();
        assert_eq!(store.ungroup(group).unwrap(), ids);
        assert!(store.groups().is_empty());
        assert!(store.elements().iter().all(|e| e.group_id.is_none()));
        assert_eq!(store.ungroup(group), Err(StoreError::GroupNotFound(group)));
    }

    #[test]
    fn test_json_roundtrip_and_duplicates() {
        let (mut store, ids) = store_with(2);
        store.select(Some(ids[1]));
        let json = store.to_json().unwrap();
        let loaded = ElementStore::from_json(&json).unwrap();
        assert_eq!(loaded.elements(), store.elements());
        assert_eq!(loaded.selected(), Some(ids[1]));

        let element = serde_json::to_value(store.get(ids[0]).unwrap()).unwrap();
        let duplicated = json!({ "elements": [element.clone(), element] }).to_string();
        assert_eq!(ElementStore::from_json(&duplicated).err(), Some(StoreError::DuplicateId(ids[0])));
    }

    #[test]
    fn test_from_json_clears_dangling_group_ids() {
        let (mut store, ids) = store_with(2);
        store.group_elements(&ids, "Pair").unwrap();

        // Group whose members are all unknown is dropped on load.
        let mut doc: Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        doc["groups"][0]["children"] = json!([Uuid::new_v4()]);
        let loaded = ElementStore::from_json(&doc.to_string()).unwrap();
        assert!(loaded.groups().is_empty());
        assert!(loaded.elements().iter().all(|e| e.group_id.is_none()));

        // Missing group list entirely.
        doc["groups"] = json!([]);
        let loaded = ElementStore::from_json(&doc.to_string()).unwrap();
        assert!(loaded.elements().iter().all(|e| e.group_id.is_none()));
    }
}
