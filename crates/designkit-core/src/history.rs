//! Snapshot-based undo/redo with named branches.
//!
//! Each branch is a linear list of snapshots. The current pointer is a
//! branch plus an index into its list. Saving while parked in the middle
//! of a branch discards the abandoned future, as in any linear undo stack.

use crate::element::{DesignElement, LayerGroup};
use crate::store::{ElementStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Default maximum number of snapshots kept per branch.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Name of the implicit initial branch.
pub const MAIN_BRANCH: &str = "main";

/// Unique identifier for snapshots.
pub type SnapshotId = Uuid;

/// Unique identifier for branches. The main branch is the nil UUID.
pub type BranchId = Uuid;

/// A deep copy of the element collection at one point in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub id: SnapshotId,
    pub elements: Vec<DesignElement>,
    #[serde(default)]
    pub groups: Vec<LayerGroup>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Human-readable label of the action that produced this state.
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub branch: BranchId,
}

impl HistorySnapshot {
    fn same_state(&self, elements: &[DesignElement], groups: &[LayerGroup]) -> bool {
        self.elements == elements && self.groups == groups
    }
}

/// A named sequence of snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    /// Snapshot this branch was forked from (`None` for main).
    pub parent: Option<SnapshotId>,
    snapshots: Vec<HistorySnapshot>,
}

impl Branch {
    fn new(id: BranchId, name: impl Into<String>, parent: Option<SnapshotId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent,
            snapshots: Vec::new(),
        }
    }

    pub fn snapshots(&self) -> &[HistorySnapshot] {
        &self.snapshots
    }
}

/// Branching undo/redo history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    branches: Vec<Branch>,
    current_branch: usize,
    /// Index into the current branch's snapshots; `None` while it is empty.
    cursor: Option<usize>,
    max_len: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    /// Create a history holding at most `max_len` snapshots per branch.
    pub fn new(max_len: usize) -> Self {
        Self {
            branches: vec![Branch::new(Uuid::nil(), MAIN_BRANCH, None)],
            current_branch: 0,
            cursor: None,
            max_len: max_len.max(1),
        }
    }

    fn branch(&self) -> &Branch {
        &self.branches[self.current_branch]
    }

    /// Snapshot the store's collection.
    ///
    /// Returns the new snapshot id, or `None` if the collection is identical
    /// to the current snapshot (redundant saves are suppressed).
    pub fn save_snapshot(&mut self, store: &ElementStore, action: impl Into<String>) -> Option<SnapshotId> {
        self.save_snapshot_with_thumbnail(store, action, None)
    }

    /// Snapshot the store's collection with an optional preview image
    /// (for example a data URL produced by a renderer).
    pub fn save_snapshot_with_thumbnail(
        &mut self,
        store: &ElementStore,
        action: impl Into<String>,
        thumbnail: Option<String>,
    ) -> Option<SnapshotId> {
        let action = action.into();
        let (elements, groups) = store.snapshot();
        if self.reference_snapshot().is_some_and(|s| s.same_state(&elements, &groups)) {
            log::debug!("Skipping redundant snapshot '{}'", action);
            return None;
        }

        let branch_id = self.branch().id;
        let snapshot = HistorySnapshot {
            id: Uuid::new_v4(),
            elements,
            groups,
            timestamp: now_millis(),
            action,
            thumbnail,
            branch: branch_id,
        };
        let id = snapshot.id;

        let cursor = self.cursor;
        let max_len = self.max_len;
        let branch = &mut self.branches[self.current_branch];
        if let Some(cursor) = cursor {
            let discarded = branch.snapshots.len() - (cursor + 1);
            if discarded > 0 {
                log::debug!("Discarding {} redo snapshot(s)", discarded);
            }
            branch.snapshots.truncate(cursor + 1);
        }
        branch.snapshots.push(snapshot);
        if branch.snapshots.len() > max_len {
            branch.snapshots.remove(0);
        }
        self.cursor = Some(branch.snapshots.len() - 1);
        Some(id)
    }

    /// The snapshot a new save is compared against: the current one, or the
    /// fork point of a branch that has no snapshots yet.
    fn reference_snapshot(&self) -> Option<&HistorySnapshot> {
        match self.cursor {
            Some(cursor) => self.branch().snapshots.get(cursor),
            None => self.branch().parent.and_then(|id| self.find_snapshot(id)),
        }
    }

    fn find_snapshot(&self, id: SnapshotId) -> Option<&HistorySnapshot> {
        self.branches.iter().flat_map(|b| b.snapshots.iter()).find(|s| s.id == id)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.branch().snapshots.len())
    }

    /// Step back one snapshot and restore it. Returns false at the start.
    pub fn undo(&mut self, store: &mut ElementStore) -> bool {
        if !self.can_undo() {
            log::debug!("Nothing to undo");
            return false;
        }
        let cursor = self.cursor.map_or(0, |c| c - 1);
        self.move_to(store, cursor);
        true
    }

    /// Step forward one snapshot and restore it. Returns false at the end.
    pub fn redo(&mut self, store: &mut ElementStore) -> bool {
        if !self.can_redo() {
            log::debug!("Nothing to redo");
            return false;
        }
        let cursor = self.cursor.map_or(0, |c| c + 1);
        self.move_to(store, cursor);
        true
    }

    /// Jump directly to a snapshot of the current branch.
    pub fn jump_to(&mut self, store: &mut ElementStore, id: SnapshotId) -> bool {
        match self.branch().snapshots.iter().position(|s| s.id == id) {
            Some(index) => {
                self.move_to(store, index);
                true
            }
            None => {
                log::debug!("Snapshot {} not on the current branch", id);
                false
            }
        }
    }

    fn move_to(&mut self, store: &mut ElementStore, index: usize) {
        self.cursor = Some(index);
        let snapshot = &self.branches[self.current_branch].snapshots[index];
        store.restore(snapshot.elements.clone(), snapshot.groups.clone());
    }

    /// Fork a new branch from the current snapshot and make it current.
    /// Forking from an empty branch inherits that branch's fork point.
    ///
    /// Subsequent saves append to the new branch only.
    pub fn create_branch(&mut self, name: impl Into<String>) -> BranchId {
        let parent = self.current_snapshot().map(|s| s.id).or(self.branch().parent);
        let branch = Branch::new(Uuid::new_v4(), name, parent);
        let id = branch.id;
        log::info!("Created history branch '{}' ({})", branch.name, id);
        self.branches.push(branch);
        self.current_branch = self.branches.len() - 1;
        self.cursor = None;
        id
    }

    /// Make another branch current, restoring its latest snapshot (or its
    /// fork point if it has none). Returns false for an unknown branch.
    pub fn switch_branch(&mut self, store: &mut ElementStore, id: BranchId) -> bool {
        let Some(index) = self.branches.iter().position(|b| b.id == id) else {
            log::warn!("Unknown history branch {}", id);
            return false;
        };
        self.current_branch = index;
        let branch = &self.branches[index];
        if let Some(last) = branch.snapshots.len().checked_sub(1) {
            self.move_to(store, last);
        } else {
            self.cursor = None;
            match branch.parent.and_then(|p| self.find_snapshot(p)) {
                Some(parent) => store.restore(parent.elements.clone(), parent.groups.clone()),
                None => log::warn!("Fork point of branch {} is no longer in history", id),
            }
        }
        log::info!("Switched to history branch '{}'", self.branches[index].name);
        true
    }

    /// All branches, main first.
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// The current branch id.
    pub fn current_branch(&self) -> BranchId {
        self.branch().id
    }

    /// The snapshot the current pointer refers to.
    pub fn current_snapshot(&self) -> Option<&HistorySnapshot> {
        self.cursor.and_then(|c| self.branch().snapshots.get(c))
    }

    /// Snapshots of the current branch, oldest first.
    pub fn snapshots(&self) -> &[HistorySnapshot] {
        &self.branch().snapshots
    }

    /// Drop every snapshot and branch.
    pub fn clear(&mut self) {
        *self = Self::new(self.max_len);
    }

    /// Serialize the whole history to JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Load a history from JSON.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let history: Self =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let valid_branch = history.current_branch < history.branches.len();
        let valid_cursor = valid_branch
            && match history.cursor {
                Some(c) => c < history.branches[history.current_branch].snapshots.len(),
                None => history.branches[history.current_branch].snapshots.is_empty(),
            };
        if !valid_cursor {
            return Err(StoreError::Serialization("history pointer out of range".into()));
        }
        Ok(history)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementPatch, NewElement};

    fn add(store: &mut ElementStore, x: f64) -> crate::element::ElementId {
        store.add(NewElement::shape(x, 0.0, "#000")).unwrap()
    }

    #[test]
    fn test_empty_history() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.undo(&mut store));
        assert!(!history.redo(&mut store));
        assert!(history.current_snapshot().is_none());
    }

    #[test]
    fn test_undo_redo() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        history.save_snapshot(&store, "Initial");
        let id = add(&mut store, 1.0);
        history.save_snapshot(&store, "Add");

        assert!(history.undo(&mut store));
        assert!(store.is_empty());
        assert!(history.can_redo());
        assert!(!history.can_undo());

        assert!(history.redo(&mut store));
        assert!(store.get(id).is_some());
        assert_eq!(history.current_snapshot().unwrap().action, "Add");
    }

    #[test]
    fn test_redundant_save_is_suppressed() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        add(&mut store, 1.0);
        assert!(history.save_snapshot(&store, "A").is_some());
        assert!(history.save_snapshot(&store, "B").is_none());
        assert_eq!(history.snapshots().len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        let id = add(&mut store, 1.0);
        history.save_snapshot(&store, "A");
        store.update(id, &ElementPatch::position(99.0, 99.0)).unwrap();
        assert_eq!(history.snapshots()[0].elements[0].x, 1.0);
    }

    #[test]
    fn test_save_discards_redo() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        history.save_snapshot(&store, "Initial");
        add(&mut store, 1.0);
        history.save_snapshot(&store, "One");
        add(&mut store, 2.0);
        history.save_snapshot(&store, "Two");

        history.undo(&mut store);
        history.undo(&mut store);
        add(&mut store, 3.0);
        history.save_snapshot(&store, "Three");

        assert!(!history.can_redo());
        assert!(!history.redo(&mut store));
        let labels: Vec<_> = history.snapshots().iter().map(|s| s.action.as_str()).collect();
        assert_eq!(labels, vec!["Initial", "Three"]);
    }

    #[test]
    fn test_max_len_drops_oldest() {
        let mut store = ElementStore::new();
        let mut history = History::new(3);
        for i in 0..5 {
            add(&mut store, i as f64);
            history.save_snapshot(&store, format!("Step {i}"));
        }
        assert_eq!(history.snapshots().len(), 3);
        assert_eq!(history.snapshots()[0].action, "Step 2");
        assert!(history.undo(&mut store));
        assert!(history.undo(&mut store));
        assert!(!history.undo(&mut store));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_branches() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        add(&mut store, 1.0);
        let fork = history.save_snapshot(&store, "Base").unwrap();
        add(&mut store, 2.0);
        history.save_snapshot(&store, "Main work");

        history.undo(&mut store);
        let experiment = history.create_branch("experiment");
        assert_eq!(history.branches()[1].parent, Some(fork));
        assert!(!history.can_undo());

        // Saving the unchanged fork state on the new branch is redundant.
        assert!(history.save_snapshot(&store, "Noop").is_none());

        add(&mut store, 3.0);
        history.save_snapshot(&store, "Experiment");
        assert_eq!(store.len(), 2);
        assert_eq!(history.snapshots().len(), 1);
        assert_eq!(history.snapshots()[0].branch, experiment);

        assert!(history.switch_branch(&mut store, Uuid::nil()));
        assert_eq!(store.len(), 2);
        assert_eq!(history.current_snapshot().unwrap().action, "Main work");

        assert!(history.switch_branch(&mut store, experiment));
        assert_eq!(history.current_snapshot().unwrap().action, "Experiment");
        assert!(!history.switch_branch(&mut store, Uuid::new_v4()));
    }

    #[test]
    fn test_switch_to_empty_branch_restores_parent() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        add(&mut store, 1.0);
        history.save_snapshot(&store, "Base");
        let empty = history.create_branch("empty");
        history.switch_branch(&mut store, Uuid::nil());

        add(&mut store, 2.0);
        assert_eq!(store.len(), 2);
        assert!(history.switch_branch(&mut store, empty));
        assert_eq!(store.len(), 1);
        assert!(history.current_snapshot().is_none());
    }

    #[test]
    fn test_branch_from_empty_branch_keeps_fork_point() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        add(&mut store, 1.0);
        let base = history.save_snapshot(&store, "Base").unwrap();
        let a = history.create_branch("a");
        let b = history.create_branch("b");
        assert_eq!(history.branches()[2].parent, Some(base));

        history.switch_branch(&mut store, Uuid::nil());
        add(&mut store, 2.0);
        history.save_snapshot(&store, "Main work");
        history.switch_branch(&mut store, a);
        add(&mut store, 3.0);
        history.save_snapshot(&store, "A work");
        assert_eq!(store.len(), 2);

        assert!(history.switch_branch(&mut store, b));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_jump_to_and_json() {
        let mut store = ElementStore::new();
        let mut history = History::default();
        let first = history.save_snapshot(&store, "Initial").unwrap();
        add(&mut store, 1.0);
        history.save_snapshot_with_thumbnail(&store, "Add", Some("data:image/png;base64,".into()));

        assert!(history.jump_to(&mut store, first));
        assert!(store.is_empty());
        assert!(!history.jump_to(&mut store, Uuid::new_v4()));

        let json = history.to_json().unwrap();
        let loaded = History::from_json(&json).unwrap();
        assert_eq!(loaded.snapshots(), history.snapshots());
        assert!(loaded.can_redo());
    }
}
