//! Invariants that must hold across arbitrary operation sequences.

use designkit_core::{
    DragController, ElementKind, ElementPatch, ElementStore, History, MultiSelection, NewElement, StoreError,
    Viewport,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashSet;

fn shape_at(x: f64, y: f64) -> NewElement {
    NewElement::shape(x, y, "#336699").with_size(40.0, 30.0)
}

#[test]
fn ids_are_unique() {
    let mut store = ElementStore::new();
    let mut ids = HashSet::new();
    for i in 0..200 {
        let kind = match i % 3 {
            0 => ElementKind::Text,
            1 => ElementKind::Shape,
            _ => ElementKind::Drawing,
        };
        let id = store.add(NewElement::new(kind, i as f64, 0.0, "#000")).unwrap();
        assert!(ids.insert(id), "id {id} was issued twice");
    }
    // Deleting and re-adding never reuses an id.
    let first = store.elements()[0].id;
    store.delete(first).unwrap();
    let fresh = store.add(shape_at(0.0, 0.0)).unwrap();
    assert_ne!(fresh, first);
}

#[test]
fn at_most_one_element_selected() {
    let mut store = ElementStore::new();
    let ids: Vec<_> = (0..5).map(|i| store.add(shape_at(i as f64 * 50.0, 0.0)).unwrap()).collect();
    let unknown = uuid::Uuid::new_v4();

    let requests = [Some(ids[0]), Some(ids[3]), Some(unknown), Some(ids[3]), None, Some(ids[4]), Some(ids[1])];
    for request in requests {
        let result = store.select(request);
        let flagged: Vec<_> = store.elements().iter().filter(|e| e.selected).map(|e| e.id).collect();
        assert!(flagged.len() <= 1);
        assert_eq!(flagged.first().copied(), store.selected());
        match request {
            Some(id) if store.contains(id) => assert_eq!(result, Some(id)),
            _ => assert_eq!(result, None),
        }
    }
}

#[test]
fn delete_clears_dependents() {
    let mut store = ElementStore::new();
    let a = store.add(shape_at(0.0, 0.0)).unwrap();
    let b = store.add(shape_at(100.0, 0.0)).unwrap();
    let mut selection = MultiSelection::new();
    selection.select_all(&store);
    store.select(Some(a));

    store.delete(a).unwrap();
    selection.remove(a);
    assert_eq!(store.selected(), None);
    assert!(store.selected_element().is_none());
    assert_eq!(selection.ids(), &[b]);

    // Even without explicit cleanup the set is pruned on its next use.
    store.delete(b).unwrap();
    assert!(selection.selected_elements(&store).is_empty());
    assert!(selection.bounds(&store).is_none());
}

#[test]
fn invalid_update_leaves_element_unchanged() {
    let mut store = ElementStore::new();
    let id = store
        .add(NewElement::text(10.0, 20.0, "#000", "Hello").with_font(18.0, "Inter"))
        .unwrap();
    let before = store.get(id).unwrap().clone();

    let bad_patches = [
        ElementPatch { x: Some(f64::NAN), ..Default::default() },
        ElementPatch { y: Some(f64::INFINITY), ..Default::default() },
        ElementPatch { width: Some(-1.0), ..Default::default() },
        ElementPatch { height: Some(f64::NAN), ..Default::default() },
        ElementPatch { font_size: Some(0.0), ..Default::default() },
        ElementPatch { opacity: Some(1.5), ..Default::default() },
        ElementPatch { color: Some(String::new()), x: Some(99.0), ..Default::default() },
    ];
    for patch in &bad_patches {
        assert!(store.update(id, patch).is_err(), "{patch:?} was accepted");
        assert_eq!(store.get(id).unwrap(), &before);
    }

    let bad_json = [json!({ "x": "left" }), json!({ "color": 7 }), json!({ "type": "circle" }), json!(null)];
    for patch in &bad_json {
        assert!(store.update_json(id, patch).is_err(), "{patch} was accepted");
        assert_eq!(store.get(id).unwrap(), &before);
    }
}

#[test]
fn update_of_missing_element_is_not_found() {
    let mut store = ElementStore::new();
    let missing = uuid::Uuid::new_v4();
    assert_eq!(
        store.update(missing, &ElementPatch::position(1.0, 1.0)),
        Err(StoreError::NotFound(missing))
    );
}

#[test]
fn repeated_snapshot_is_suppressed() {
    let mut store = ElementStore::new();
    let mut history = History::default();
    store.add(shape_at(0.0, 0.0)).unwrap();

    assert!(history.save_snapshot(&store, "add").is_some());
    assert!(history.save_snapshot(&store, "add again").is_none());
    assert_eq!(history.snapshots().len(), 1);
}

#[test]
fn undo_then_redo_restores_final_state() {
    let mut store = ElementStore::new();
    let mut history = History::default();
    history.save_snapshot(&store, "empty");

    let a = store.add(shape_at(0.0, 0.0)).unwrap();
    history.save_snapshot(&store, "add a");
    let b = store.add(NewElement::text(50.0, 50.0, "#111", "B")).unwrap();
    history.save_snapshot(&store, "add b");
    store.update(a, &ElementPatch::color("#ff0000")).unwrap();
    history.save_snapshot(&store, "recolor a");
    store.select(Some(b));
    history.save_snapshot(&store, "select b");
    store.delete(a).unwrap();
    history.save_snapshot(&store, "delete a");

    let final_state = store.elements().to_vec();
    let n = history.snapshots().len();
    for _ in 0..n - 1 {
        assert!(history.undo(&mut store));
    }
    assert!(!history.can_undo());
    assert!(store.is_empty());
    for _ in 0..n - 1 {
        assert!(history.redo(&mut store));
    }
    assert!(!history.can_redo());
    assert_eq!(store.elements(), final_state.as_slice());
    assert_eq!(store.selected(), Some(b));
}

#[test]
fn new_snapshot_after_undo_discards_redo() {
    let mut store = ElementStore::new();
    let mut history = History::default();
    history.save_snapshot(&store, "empty");
    store.add(shape_at(0.0, 0.0)).unwrap();
    history.save_snapshot(&store, "one");
    store.add(shape_at(50.0, 0.0)).unwrap();
    history.save_snapshot(&store, "two");

    assert!(history.undo(&mut store));
    store.add(shape_at(0.0, 80.0)).unwrap();
    history.save_snapshot(&store, "branching edit");

    assert!(!history.can_redo());
    let before = store.elements().to_vec();
    assert!(!history.redo(&mut store));
    assert_eq!(store.elements(), before.as_slice());
    let labels: Vec<_> = history.snapshots().iter().map(|s| s.action.as_str()).collect();
    assert_eq!(labels, vec!["empty", "one", "branching edit"]);
}

#[test]
fn zoom_to_fit_on_empty_collection_keeps_zoom() {
    let store = ElementStore::new();
    let mut viewport = Viewport::default();
    viewport.zoom_to(2.0, None);
    viewport.finish_animation();

    assert!(!viewport.zoom_to_fit(store.elements()));
    assert_eq!(viewport.zoom(), 2.0);
    assert!(!viewport.zoom_to_selection(std::iter::empty(), store.elements()));
    assert_eq!(viewport.zoom(), 2.0);
}

#[test]
fn cancel_drag_restores_origin() {
    let mut store = ElementStore::new();
    let id = store.add(shape_at(37.5, 12.25)).unwrap();
    let mut drag = DragController::default();

    assert!(drag.start_drag(&store, id, 40.0, 20.0));
    for (x, y) in [(60.0, 30.0), (-500.0, 90.0), (300.0, 400.0), (41.0, 21.0)] {
        drag.update_drag(&mut store, x, y);
    }
    assert_eq!(drag.cancel_drag(&mut store), Some(id));
    let element = store.get(id).unwrap();
    assert_eq!((element.x, element.y), (37.5, 12.25));
    assert!(!drag.is_dragging());
}
