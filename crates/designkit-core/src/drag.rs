//! Interactive drag of a single element.
//!
//! `Idle -> Dragging -> Idle`, with cancel restoring the element to where
//! the drag started. Calls made in the wrong state are logged no-ops.

use crate::deferred::Throttle;
use crate::element::{ElementId, ElementPatch};
use crate::store::ElementStore;
use kurbo::{Point, Vec2};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default minimum interval between applied drag updates (one frame).
pub const DEFAULT_DRAG_THROTTLE: Duration = Duration::from_millis(16);

/// An active drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// The element being dragged.
    pub element_id: ElementId,
    /// Element position when the drag started.
    pub origin: Point,
    /// Pointer position minus element position at drag start.
    pub offset: Vec2,
    /// Latest position held back by the throttle.
    pending: Option<Point>,
}

/// Drag state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Converts pointer movement into element position updates.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    throttle: Throttle,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THROTTLE)
    }
}

impl DragController {
    /// Create a controller applying at most one update per `throttle`.
    /// A zero interval applies every update.
    pub fn new(throttle: Duration) -> Self {
        Self {
            state: DragState::Idle,
            throttle: Throttle::new(throttle),
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// The element being dragged, if any.
    pub fn dragged_element(&self) -> Option<ElementId> {
        match &self.state {
            DragState::Dragging(session) => Some(session.element_id),
            DragState::Idle => None,
        }
    }

    /// Begin dragging an element from a pointer position (document space).
    ///
    /// No-op unless idle, and for unknown or locked elements.
    pub fn start_drag(&mut self, store: &ElementStore, id: ElementId, pointer_x: f64, pointer_y: f64) -> bool {
        if self.is_dragging() {
            log::debug!("start_drag ignored: a drag is already in progress");
            return false;
        }
        let Some(element) = store.get(id) else {
            log::warn!("start_drag ignored: element {} not found", id);
            return false;
        };
        if element.locked {
            log::debug!("start_drag ignored: element {} is locked", id);
            return false;
        }

        let origin = element.position();
        let offset = Point::new(pointer_x, pointer_y) - origin;
        self.throttle.reset();
        self.state = DragState::Dragging(DragSession {
            element_id: id,
            origin,
            offset,
            pending: None,
        });
        true
    }

    /// Move the dragged element to follow the pointer.
    /// Returns true if an update was applied to the store.
    pub fn update_drag(&mut self, store: &mut ElementStore, pointer_x: f64, pointer_y: f64) -> bool {
        self.update_drag_at(store, pointer_x, pointer_y, Instant::now())
    }

    /// Like [`update_drag`](Self::update_drag), with an explicit clock.
    pub fn update_drag_at(
        &mut self,
        store: &mut ElementStore,
        pointer_x: f64,
        pointer_y: f64,
        now: Instant,
    ) -> bool {
        let DragState::Dragging(session) = &mut self.state else {
            log::debug!("update_drag ignored: not dragging");
            return false;
        };

        // Elements cannot be dragged to negative document coordinates.
        let target = Point::new(
            (pointer_x - session.offset.x).max(0.0),
            (pointer_y - session.offset.y).max(0.0),
        );
        if !self.throttle.ready(now) {
            session.pending = Some(target);
            return false;
        }
        session.pending = None;
        let id = session.element_id;
        self.apply(store, id, target)
    }

    /// Finish the drag, leaving the element at its last position.
    /// Returns the dragged element.
    pub fn end_drag(&mut self, store: &mut ElementStore) -> Option<ElementId> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            log::debug!("end_drag ignored: not dragging");
            return None;
        };
        if let Some(pending) = session.pending {
            self.apply(store, session.element_id, pending);
        }
        Some(session.element_id)
    }

    /// Abort the drag, restoring the element to its original position.
    /// Returns the dragged element.
    pub fn cancel_drag(&mut self, store: &mut ElementStore) -> Option<ElementId> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            log::debug!("cancel_drag ignored: not dragging");
            return None;
        };
        if let Err(e) = store.update(session.element_id, &ElementPatch::position(session.origin.x, session.origin.y)) {
            log::warn!("Could not restore dragged element {}: {}", session.element_id, e);
        }
        Some(session.element_id)
    }

    fn apply(&mut self, store: &mut ElementStore, id: ElementId, target: Point) -> bool {
        match store.update(id, &ElementPatch::position(target.x, target.y)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Drag of {} aborted: {}", id, e);
                self.state = DragState::Idle;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::NewElement;

    fn setup() -> (ElementStore, ElementId, DragController) {
        let mut store = ElementStore::new();
        let id = store.add(NewElement::shape(20.0, 20.0, "#000")).unwrap();
        (store, id, DragController::new(Duration::ZERO))
    }

    fn position(store: &ElementStore, id: ElementId) -> (f64, f64) {
        let e = store.get(id).unwrap();
        (e.x, e.y)
    }

    #[test]
    fn test_drag_keeps_pointer_offset() {
        let (mut store, id, mut drag) = setup();
        assert!(drag.start_drag(&store, id, 100.0, 100.0));
        assert!(drag.update_drag(&mut store, 130.0, 130.0));
        assert_eq!(position(&store, id), (50.0, 50.0));
        assert_eq!(drag.end_drag(&mut store), Some(id));
        assert!(!drag.is_dragging());
        assert_eq!(position(&store, id), (50.0, 50.0));
    }

    #[test]
    fn test_drag_clamps_to_origin() {
        let (mut store, id, mut drag) = setup();
        drag.start_drag(&store, id, 30.0, 30.0);
        drag.update_drag(&mut store, 0.0, 5.0);
        assert_eq!(position(&store, id), (0.0, 0.0));
    }

    #[test]
    fn test_cancel_restores_origin() {
        let (mut store, id, mut drag) = setup();
        drag.start_drag(&store, id, 25.0, 25.0);
        drag.update_drag(&mut store, 300.0, 120.0);
        drag.update_drag(&mut store, 77.5, 410.0);
        assert_eq!(drag.cancel_drag(&mut store), Some(id));
        assert_eq!(position(&store, id), (20.0, 20.0));
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn test_out_of_order_calls_are_noops() {
        let (mut store, id, mut drag) = setup();
        assert!(!drag.update_drag(&mut store, 10.0, 10.0));
        assert_eq!(drag.end_drag(&mut store), None);
        assert_eq!(drag.cancel_drag(&mut store), None);
        assert!(!drag.start_drag(&store, uuid::Uuid::new_v4(), 0.0, 0.0));
        assert!(drag.start_drag(&store, id, 0.0, 0.0));
        assert!(!drag.start_drag(&store, id, 0.0, 0.0));
    }

    #[test]
    fn test_locked_element_does_not_drag() {
        let (mut store, id, mut drag) = setup();
        store.set_locked(id, true).unwrap();
        assert!(!drag.start_drag(&store, id, 20.0, 20.0));
    }

    #[test]
    fn test_throttled_update_flushed_on_end() {
        let (mut store, id, _) = setup();
        let mut drag = DragController::new(Duration::from_millis(16));
        let start = Instant::now();
        drag.start_drag(&store, id, 20.0, 20.0);
        assert!(drag.update_drag_at(&mut store, 30.0, 30.0, start));
        assert!(!drag.update_drag_at(&mut store, 40.0, 40.0, start + Duration::from_millis(4)));
        assert_eq!(position(&store, id), (30.0, 30.0));
        drag.end_drag(&mut store);
        assert_eq!(position(&store, id), (40.0, 40.0));
    }

    #[test]
    fn test_deleted_element_aborts_drag() {
        let (mut store, id, mut drag) = setup();
        drag.start_drag(&store, id, 20.0, 20.0);
        store.delete(id).unwrap();
        assert!(!drag.update_drag(&mut store, 50.0, 50.0));
        assert!(!drag.is_dragging());
    }
}
