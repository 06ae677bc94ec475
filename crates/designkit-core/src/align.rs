//! Alignment and distribution of selected elements.

use crate::element::{ElementId, ElementPatch};
use crate::store::{BulkUpdateReport, ElementStore, union_bounds};
use serde::{Deserialize, Serialize};

/// Edge or center to align elements to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    CenterHorizontal,
    Right,
    Top,
    CenterVertical,
    Bottom,
}

/// Axis for distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Align elements to the shared bounding box of the group.
///
/// Needs at least two live, unlocked elements; otherwise nothing changes
/// and an empty report is returned.
pub fn align(store: &mut ElementStore, ids: &[ElementId], alignment: Alignment) -> BulkUpdateReport {
    let elements: Vec<_> = ids
        .iter()
        .filter_map(|&id| store.get(id))
        .filter(|e| !e.locked)
        .collect();
    if elements.len() < 2 {
        return BulkUpdateReport::default();
    }
    let Some(bounds) = union_bounds(elements.iter().copied()) else {
        return BulkUpdateReport::default();
    };

    let updates: Vec<(ElementId, ElementPatch)> = elements
        .iter()
        .map(|e| {
            // Offsets between the element's position and its (possibly rotated) bounds.
            let b = e.bounds();
            let (dx, dy) = match alignment {
                Alignment::Left => (bounds.x0 - b.x0, 0.0),
                Alignment::CenterHorizontal => (bounds.center().x - b.center().x, 0.0),
                Alignment::Right => (bounds.x1 - b.x1, 0.0),
                Alignment::Top => (0.0, bounds.y0 - b.y0),
                Alignment::CenterVertical => (0.0, bounds.center().y - b.center().y),
                Alignment::Bottom => (0.0, bounds.y1 - b.y1),
            };
            (e.id, ElementPatch::position(e.x + dx, e.y + dy))
        })
        .collect();

    log::debug!("Aligning {} elements: {:?}", updates.len(), alignment);
    store.bulk_update(updates)
}

/// Space elements evenly along an axis, keeping the outermost two in place.
///
/// Needs at least three live, unlocked elements.
pub fn distribute(store: &mut ElementStore, ids: &[ElementId], axis: Axis) -> BulkUpdateReport {
    let mut elements: Vec<_> = ids
        .iter()
        .filter_map(|&id| store.get(id))
        .filter(|e| !e.locked)
        .collect();
    if elements.len() < 3 {
        return BulkUpdateReport::default();
    }

    let start = |b: kurbo::Rect| match axis {
        Axis::Horizontal => b.x0,
        Axis::Vertical => b.y0,
    };
    let extent = |b: kurbo::Rect| match axis {
        Axis::Horizontal => b.width(),
        Axis::Vertical => b.height(),
    };
    elements.sort_by(|a, b| start(a.bounds()).total_cmp(&start(b.bounds())));

    let first = elements[0].bounds();
    let last = elements[elements.len() - 1].bounds();
    let span = start(last) + extent(last) - start(first);
    let occupied: f64 = elements.iter().map(|e| extent(e.bounds())).sum();
    let gap = (span - occupied) / (elements.len() - 1) as f64;

    let mut cursor = start(first);
    let mut updates = Vec::with_capacity(elements.len());
    for e in &elements {
        let b = e.bounds();
        let delta = cursor - start(b);
        let patch = match axis {
            Axis::Horizontal => ElementPatch::position(e.x + delta, e.y),
            Axis::Vertical => ElementPatch::position(e.x, e.y + delta),
        };
        updates.push((e.id, patch));
        cursor += extent(b) + gap;
    }

    log::debug!("Distributing {} elements along {:?}", updates.len(), axis);
    store.bulk_update(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::NewElement;

    fn add(store: &mut ElementStore, x: f64, y: f64, w: f64) -> ElementId {
        store.add(NewElement::shape(x, y, "#000").with_size(w, 10.0)).unwrap()
    }

    #[test]
    fn test_align_left_and_bottom() {
        let mut store = ElementStore::new();
        let a = add(&mut store, 10.0, 0.0, 10.0);
        let b = add(&mut store, 40.0, 30.0, 20.0);

        let report = align(&mut store, &[a, b], Alignment::Left);
        assert!(report.is_complete());
        assert_eq!(store.get(b).unwrap().x, 10.0);

        align(&mut store, &[a, b], Alignment::Bottom);
        assert_eq!(store.get(a).unwrap().y, 30.0);
        assert_eq!(store.get(b).unwrap().y, 30.0);
    }

    #[test]
    fn test_align_needs_two() {
        let mut store = ElementStore::new();
        let a = add(&mut store, 10.0, 0.0, 10.0);
        let report = align(&mut store, &[a], Alignment::Right);
        assert!(report.applied.is_empty());
    }

    #[test]
    fn test_distribute_horizontal() {
        let mut store = ElementStore::new();
        let a = add(&mut store, 0.0, 0.0, 10.0);
        let c = add(&mut store, 90.0, 0.0, 10.0);
        let b = add(&mut store, 20.0, 0.0, 10.0);

        distribute(&mut store, &[a, b, c], Axis::Horizontal);
        assert_eq!(store.get(a).unwrap().x, 0.0);
        assert_eq!(store.get(b).unwrap().x, 45.0);
        assert_eq!(store.get(c).unwrap().x, 90.0);
    }
}
