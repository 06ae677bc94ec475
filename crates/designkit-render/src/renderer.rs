//! Renderer trait abstraction.

use designkit_core::{DesignElement, Editor, ElementId, Gesture, ToolKind};
use kurbo::{Affine, Rect, Size};
use peniko::Color;
use peniko::color::{Srgb, parse_color as parse_css_color};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Output error: {0}")]
    Output(#[from] std::fmt::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
///
/// Everything here is read-only; renderers report interaction back as
/// [`Gesture`]s and never touch the editor directly.
pub struct RenderContext<'a> {
    /// Visible elements in paint order (back to front), already culled to
    /// the viewport.
    pub elements: Vec<&'a DesignElement>,
    /// Active tool mode.
    pub tool: ToolKind,
    /// Document-to-screen transform.
    pub transform: Affine,
    /// Current zoom level.
    pub zoom: f64,
    /// Viewport size in screen pixels.
    pub viewport_size: Size,
    /// The single-selected element.
    pub primary: Option<ElementId>,
    /// Multi-selection set.
    pub selected: Vec<ElementId>,
    /// Selection rectangle (marquee) in document coordinates.
    pub selection_rect: Option<Rect>,
    /// Background color.
    pub background_color: Color,
    /// Selection highlight color.
    pub selection_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Capture the editor's current frame.
    pub fn new(editor: &'a Editor) -> Self {
        let viewport = editor.viewport();
        Self {
            elements: editor.visible_elements(),
            tool: editor.tools.current_tool,
            transform: viewport.transform(),
            zoom: viewport.zoom(),
            viewport_size: viewport.size(),
            primary: editor.store().selected(),
            selected: editor.selection().ids().to_vec(),
            selection_rect: editor.marquee_rect(),
            background_color: Color::from_rgba8(250, 250, 250, 255),
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
        }
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the selection highlight color.
    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Whether an element is highlighted as selected.
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.primary == Some(id) || self.selected.contains(&id)
    }

    /// Transform placing an element in screen space, rotation included.
    pub fn element_transform(&self, element: &DesignElement) -> Affine {
        let frame = element.frame();
        self.transform * Affine::rotate_about(element.rotation().to_radians(), frame.center())
    }

    /// Screen-space box around an element, for selection outlines.
    pub fn screen_bounds(&self, element: &DesignElement) -> Rect {
        self.transform.transform_rect_bbox(element.bounds())
    }
}

/// Parse a CSS color string (`#rgb`, `#rrggbb`, `rgb(...)`, named colors).
pub fn parse_color(value: &str) -> RenderResult<Color> {
    parse_css_color(value)
        .map(|color| color.to_alpha_color::<Srgb>())
        .map_err(|e| RendererError::InvalidColor(format!("{value:?}: {e}")))
}

/// Fill color of an element with its opacity applied. Unparseable colors
/// fall back to black.
pub fn element_color(element: &DesignElement) -> Color {
    let color = parse_color(&element.color).unwrap_or_else(|e| {
        log::warn!("Element {}: {}", element.id, e);
        Color::BLACK
    });
    color.multiply_alpha(element.opacity() as f32)
}

/// Trait for rendering backends.
///
/// A renderer consumes the element list plus tool mode and emits gesture
/// events. Implementations are interchangeable and chosen by the caller.
pub trait Renderer: Send + Sync {
    /// Draw one frame.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Drain the gestures observed since the last call.
    fn take_gestures(&mut self) -> Vec<Gesture>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
