//! Keyboard shortcut registry.

use crate::input::Modifiers;
use crate::tools::ToolKind;
use serde::{Deserialize, Serialize};

/// An editor command reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorAction {
    Undo,
    Redo,
    SelectAll,
    DeleteSelection,
    Cancel,
    Group,
    Ungroup,
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ZoomToFit,
    ZoomToSelection,
    ToggleMultiSelect,
    SetTool(ToolKind),
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub action: EditorAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        action: EditorAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == modifiers.command()
            && (self.shift == modifiers.shift || self.is_symbol())
    }

    /// Symbol keys such as `+` often need Shift to type, so the Shift
    /// state is ignored for them.
    fn is_symbol(&self) -> bool {
        let mut chars = self.key.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_punctuation())
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use EditorAction::*;
        vec![
            Shortcut::new("Z", true, false, Undo, "Undo"),
            Shortcut::new("Z", true, true, Redo, "Redo"),
            Shortcut::new("Y", true, false, Redo, "Redo"),
            Shortcut::new("A", true, false, SelectAll, "Select all elements"),
            Shortcut::new("G", true, false, Group, "Group selected elements"),
            Shortcut::new("G", true, true, Ungroup, "Ungroup selected elements"),
            Shortcut::new("]", true, false, BringToFront, "Bring to front"),
            Shortcut::new("[", true, false, SendToBack, "Send to back"),
            Shortcut::new("]", false, false, BringForward, "Bring forward"),
            Shortcut::new("[", false, false, SendBackward, "Send backward"),
            Shortcut::new("Delete", false, false, DeleteSelection, "Delete selected elements"),
            Shortcut::new("Backspace", false, false, DeleteSelection, "Delete selected elements"),
            Shortcut::new("Escape", false, false, Cancel, "Cancel drag or clear selection"),
            Shortcut::new("+", false, false, ZoomIn, "Zoom in"),
            Shortcut::new("=", false, false, ZoomIn, "Zoom in"),
            Shortcut::new("-", false, false, ZoomOut, "Zoom out"),
            Shortcut::new("0", true, false, ZoomReset, "Reset zoom to 100%"),
            Shortcut::new("1", false, true, ZoomToFit, "Zoom to fit"),
            Shortcut::new("2", false, true, ZoomToSelection, "Zoom to selection"),
            Shortcut::new("M", false, false, ToggleMultiSelect, "Toggle multi-select mode"),
            Shortcut::new("V", false, false, SetTool(ToolKind::Select), "Select tool"),
            Shortcut::new("H", false, false, SetTool(ToolKind::Pan), "Pan tool"),
            Shortcut::new("P", false, false, SetTool(ToolKind::Pen), "Pen tool"),
            Shortcut::new("R", false, false, SetTool(ToolKind::Shape), "Shape tool"),
            Shortcut::new("T", false, false, SetTool(ToolKind::Text), "Text tool"),
        ]
    }

    /// Find the action bound to a key press.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<EditorAction> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, modifiers))
            .map(|s| s.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_respects_modifiers() {
        assert_eq!(ShortcutRegistry::resolve("z", Modifiers::ctrl()), Some(EditorAction::Undo));
        assert_eq!(ShortcutRegistry::resolve("Z", Modifiers::ctrl_shift()), Some(EditorAction::Redo));
        assert_eq!(ShortcutRegistry::resolve("z", Modifiers::NONE), None);
        assert_eq!(
            ShortcutRegistry::resolve("t", Modifiers::NONE),
            Some(EditorAction::SetTool(ToolKind::Text))
        );
    }

    #[test]
    fn test_symbol_keys_ignore_shift() {
        assert_eq!(ShortcutRegistry::resolve("+", Modifiers::shift()), Some(EditorAction::ZoomIn));
        assert_eq!(ShortcutRegistry::resolve("+", Modifiers::NONE), Some(EditorAction::ZoomIn));
        assert_eq!(ShortcutRegistry::resolve("]", Modifiers::NONE), Some(EditorAction::BringForward));
        assert_eq!(ShortcutRegistry::resolve("]", Modifiers::ctrl()), Some(EditorAction::BringToFront));
        // Letters still distinguish Shift.
        assert_eq!(ShortcutRegistry::resolve("m", Modifiers::shift()), None);
    }

    #[test]
    fn test_meta_counts_as_command() {
        let cmd = Modifiers { meta: true, ..Modifiers::NONE };
        assert_eq!(ShortcutRegistry::resolve("a", cmd), Some(EditorAction::SelectAll));
    }

    #[test]
    fn test_format() {
        let redo = ShortcutRegistry::all()
            .into_iter()
            .find(|s| s.action == EditorAction::Redo)
            .unwrap();
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
    }
}
