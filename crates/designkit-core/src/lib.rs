//! DesignKit Core Library
//!
//! Platform-agnostic element store, selection, drag, history and viewport
//! engine for the DesignKit editor. Renderers only read from it and report
//! gestures back through [`Editor::handle_gesture`].

pub mod align;
pub mod config;
pub mod deferred;
pub mod drag;
pub mod editor;
pub mod element;
pub mod history;
pub mod input;
pub mod selection;
pub mod shortcuts;
pub mod store;
pub mod tools;
pub mod viewport;

pub use align::{Alignment, Axis};
pub use config::{ConfigError, EditorConfig};
pub use deferred::{Debouncer, RequestToken, Throttle};
pub use drag::{DragController, DragState};
pub use editor::Editor;
pub use element::{DesignElement, ElementId, ElementKind, ElementPatch, GroupId, LayerGroup, NewElement};
pub use history::{Branch, BranchId, History, HistorySnapshot, SnapshotId, MAX_UNDO_HISTORY};
pub use input::{Gesture, Modifiers, MouseButton};
pub use selection::MultiSelection;
pub use shortcuts::{EditorAction, ShortcutRegistry};
pub use store::{BulkUpdateReport, ElementStore, StoreError, StoreEvent, StoreResult};
pub use tools::{ToolKind, ToolManager};
pub use viewport::{ViewState, Viewport};
