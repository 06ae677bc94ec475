//! Design element definitions.

use crate::store::{StoreError, StoreResult};
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for design elements.
pub type ElementId = Uuid;

/// Unique identifier for layer groups.
pub type GroupId = Uuid;

/// Fallback width/height for shapes, drawings and groups without explicit geometry.
pub const DEFAULT_SIZE: f64 = 100.0;
/// Fallback width for text elements.
pub const DEFAULT_TEXT_WIDTH: f64 = 200.0;
/// Fallback font size for text elements.
pub const DEFAULT_FONT_SIZE: f64 = 24.0;
/// Line height multiplier used to derive a text element's fallback height.
const TEXT_LINE_HEIGHT: f64 = 1.2;

/// Kind of design element. Controls which optional fields are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Shape,
    Drawing,
    Group,
}

impl ElementKind {
    /// Fallback (width, height) when the element carries no explicit geometry.
    pub fn default_size(self) -> (f64, f64) {
        match self {
            ElementKind::Text => (DEFAULT_TEXT_WIDTH, DEFAULT_FONT_SIZE * TEXT_LINE_HEIGHT),
            ElementKind::Shape | ElementKind::Drawing | ElementKind::Group => {
                (DEFAULT_SIZE, DEFAULT_SIZE)
            }
        }
    }

    /// Human-readable name, used in history labels.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Shape => "shape",
            ElementKind::Drawing => "drawing",
            ElementKind::Group => "group",
        }
    }
}

fn default_true() -> bool {
    true
}

/// An atomic visual object on the canvas.
///
/// Positions are in document space. Rotation is in degrees around the
/// element's center. Elements are plain data: they hold no references to
/// renderer objects, so a clone is always a deep, independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignElement {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementId>,
}

impl DesignElement {
    /// Width, falling back to the kind's default.
    pub fn width(&self) -> f64 {
        self.width.unwrap_or_else(|| self.kind.default_size().0)
    }

    /// Height, falling back to the kind's default.
    pub fn height(&self) -> f64 {
        self.height.unwrap_or_else(|| self.kind.default_size().1)
    }

    /// Rotation in degrees (0 when absent).
    pub fn rotation(&self) -> f64 {
        self.rotation.unwrap_or(0.0)
    }

    /// Opacity (1.0 when absent).
    pub fn opacity(&self) -> f64 {
        self.opacity.unwrap_or(1.0)
    }

    /// Position as a point.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Unrotated frame of the element.
    pub fn frame(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width(), self.y + self.height())
    }

    /// Axis-aligned bounding box, accounting for rotation.
    pub fn bounds(&self) -> Rect {
        let frame = self.frame();
        let rotation = self.rotation();
        if rotation == 0.0 {
            return frame;
        }
        Affine::rotate_about(rotation.to_radians(), frame.center()).transform_rect_bbox(frame)
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Check if a point (document coordinates) hits this element.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    /// Check the element-shape predicate.
    ///
    /// Position problems are reported as [`StoreError::InvalidPosition`],
    /// everything else as [`StoreError::InvalidElement`].
    pub fn validate(&self) -> StoreResult<()> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(StoreError::InvalidPosition);
        }
        if self.color.trim().is_empty() {
            return Err(StoreError::InvalidElement("color must be a non-empty string".into()));
        }
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(StoreError::InvalidElement(format!(
                        "{name} must be a finite, non-negative number"
                    )));
                }
            }
        }
        if let Some(rotation) = self.rotation {
            if !rotation.is_finite() {
                return Err(StoreError::InvalidElement("rotation must be finite".into()));
            }
        }
        if let Some(size) = self.font_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(StoreError::InvalidElement("fontSize must be positive".into()));
            }
        }
        if let Some(opacity) = self.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(StoreError::InvalidElement("opacity must be within 0..=1".into()));
            }
        }
        Ok(())
    }
}

/// Fields for a new element. The store assigns `id` and `selected`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewElement {
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub content: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub visible: bool,
    pub locked: bool,
    pub opacity: Option<f64>,
    pub z_index: i32,
}

impl NewElement {
    /// Create a new element description of the given kind.
    pub fn new(kind: ElementKind, x: f64, y: f64, color: impl Into<String>) -> Self {
        Self {
            kind,
            x,
            y,
            color: color.into(),
            width: None,
            height: None,
            rotation: None,
            content: None,
            font_size: None,
            font_family: None,
            font_weight: None,
            visible: true,
            locked: false,
            opacity: None,
            z_index: 0,
        }
    }

    /// A shape element.
    pub fn shape(x: f64, y: f64, color: impl Into<String>) -> Self {
        Self::new(ElementKind::Shape, x, y, color)
    }

    /// A text element with content.
    pub fn text(x: f64, y: f64, color: impl Into<String>, content: impl Into<String>) -> Self {
        let mut element = Self::new(ElementKind::Text, x, y, color);
        element.content = Some(content.into());
        element
    }

    /// A freehand drawing element.
    pub fn drawing(x: f64, y: f64, color: impl Into<String>) -> Self {
        Self::new(ElementKind::Drawing, x, y, color)
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn with_font(mut self, size: f64, family: impl Into<String>) -> Self {
        self.font_size = Some(size);
        self.font_family = Some(family.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Assemble the full element with the given id, unselected.
    pub(crate) fn into_element(self, id: ElementId) -> DesignElement {
        DesignElement {
            id,
            kind: self.kind,
            x: self.x,
            y: self.y,
            color: self.color,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            content: self.content,
            font_size: self.font_size,
            font_family: self.font_family,
            font_weight: self.font_weight,
            selected: false,
            visible: self.visible,
            locked: self.locked,
            opacity: self.opacity,
            z_index: self.z_index,
            group_id: None,
            children: Vec::new(),
        }
    }
}

/// A partial update, merged field-by-field into an existing element.
///
/// `id`, `selected`, `group_id` and `children` are not patchable; they are
/// owned by the store's select and grouping operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub kind: Option<ElementKind>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub content: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub opacity: Option<f64>,
    pub z_index: Option<i32>,
}

impl ElementPatch {
    /// A patch that moves an element.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    /// A patch that resizes an element.
    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    /// A patch that recolors an element.
    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..Default::default()
        }
    }

    /// Produce the merged element without touching the original.
    pub fn apply(&self, element: &DesignElement) -> DesignElement {
        let mut merged = element.clone();
        if let Some(kind) = self.kind {
            merged.kind = kind;
        }
        if let Some(x) = self.x {
            merged.x = x;
        }
        if let Some(y) = self.y {
            merged.y = y;
        }
        if let Some(color) = &self.color {
            merged.color = color.clone();
        }
        if self.width.is_some() {
            merged.width = self.width;
        }
        if self.height.is_some() {
            merged.height = self.height;
        }
        if self.rotation.is_some() {
            merged.rotation = self.rotation;
        }
        if let Some(content) = &self.content {
            merged.content = Some(content.clone());
        }
        if self.font_size.is_some() {
            merged.font_size = self.font_size;
        }
        if let Some(family) = &self.font_family {
            merged.font_family = Some(family.clone());
        }
        if let Some(weight) = &self.font_weight {
            merged.font_weight = Some(weight.clone());
        }
        if let Some(visible) = self.visible {
            merged.visible = visible;
        }
        if let Some(locked) = self.locked {
            merged.locked = locked;
        }
        if self.opacity.is_some() {
            merged.opacity = self.opacity;
        }
        if let Some(z) = self.z_index {
            merged.z_index = z;
        }
        merged
    }
}

/// A named layer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerGroup {
    pub id: GroupId,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Member element ids, in layer-panel order.
    pub children: Vec<ElementId>,
    /// Whether the layer panel shows the members expanded.
    #[serde(default)]
    pub expanded: bool,
}

impl LayerGroup {
    pub fn new(name: impl Into<String>, children: Vec<ElementId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            locked: false,
            children,
            expanded: true,
        }
    }
}
