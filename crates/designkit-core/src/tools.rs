//! Tool system for the editor.

use crate::element::{ElementKind, NewElement, DEFAULT_FONT_SIZE};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Pen,
    Shape,
    Text,
}

impl ToolKind {
    /// Kind of element this tool creates, if it creates one.
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            ToolKind::Select | ToolKind::Pan => None,
            ToolKind::Pen => Some(ElementKind::Drawing),
            ToolKind::Shape => Some(ElementKind::Shape),
            ToolKind::Text => Some(ElementKind::Text),
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Pan => "Pan",
            ToolKind::Pen => "Pen",
            ToolKind::Shape => "Shape",
            ToolKind::Text => "Text",
        }
    }
}

/// Manages the current tool and the style applied to new elements.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Color for new elements.
    pub color: String,
    /// Font settings for new text elements.
    pub font_size: f64,
    pub font_family: String,
    /// Return to the select tool after creating an element.
    pub revert_to_select: bool,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self {
            current_tool: ToolKind::default(),
            color: "#000000".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_family: "Inter".to_string(),
            revert_to_select: true,
        }
    }
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.current_tool != tool {
            log::debug!("Tool changed: {} -> {}", self.current_tool.name(), tool.name());
        }
        self.current_tool = tool;
    }

    /// Describe the element the current tool creates at a point.
    pub fn new_element(&self, at: Point) -> Option<NewElement> {
        let kind = self.current_tool.element_kind()?;
        let element = match kind {
            ElementKind::Text => NewElement::text(at.x, at.y, self.color.clone(), "Text")
                .with_font(self.font_size, self.font_family.clone()),
            kind => NewElement::new(kind, at.x, at.y, self.color.clone()),
        };
        Some(element)
    }

    /// Called after the current tool created an element.
    pub fn element_created(&mut self) {
        if self.revert_to_select {
            self.set_tool(ToolKind::Select);
        }
    }
}
