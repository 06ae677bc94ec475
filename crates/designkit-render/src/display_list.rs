//! A renderer that records draw commands instead of rasterizing.
//!
//! Useful for headless hosts that paint with their own backend, and for
//! tests that drive the editor through gestures.

use crate::renderer::{RenderContext, RenderResult, Renderer, element_color};
use designkit_core::{ElementId, ElementKind, Gesture};
use kurbo::{Affine, Point, Rect};
use peniko::Color;
use std::collections::VecDeque;

/// Stroke width (document units) for freehand drawing placeholders.
const DRAWING_STROKE_WIDTH: f64 = 2.0;

/// One recorded drawing operation.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Clear(Color),
    FillRect {
        id: ElementId,
        rect: Rect,
        transform: Affine,
        color: Color,
    },
    StrokeRect {
        id: ElementId,
        rect: Rect,
        transform: Affine,
        color: Color,
        width: f64,
    },
    Text {
        id: ElementId,
        origin: Point,
        content: String,
        font_size: f64,
        font_family: Option<String>,
        transform: Affine,
        color: Color,
    },
    /// Highlight around a selected element, in screen space.
    SelectionOutline { id: ElementId, bounds: Rect, color: Color },
    /// Area-selection rectangle, in screen space.
    Marquee { rect: Rect, color: Color },
}

impl DrawCommand {
    /// Element the command draws, if any.
    pub fn element_id(&self) -> Option<ElementId> {
        match self {
            DrawCommand::FillRect { id, .. }
            | DrawCommand::StrokeRect { id, .. }
            | DrawCommand::Text { id, .. }
            | DrawCommand::SelectionOutline { id, .. } => Some(*id),
            DrawCommand::Clear(_) | DrawCommand::Marquee { .. } => None,
        }
    }
}

/// Records a frame as a list of [`DrawCommand`]s.
#[derive(Debug, Default)]
pub struct DisplayListRenderer {
    commands: Vec<DrawCommand>,
    gestures: VecDeque<Gesture>,
}

impl DisplayListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded by the last frame.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Queue a gesture as if the user had performed it on the surface.
    pub fn push_gesture(&mut self, gesture: Gesture) {
        self.gestures.push_back(gesture);
    }
}

impl Renderer for DisplayListRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(self.background_color(ctx)));

        for element in &ctx.elements {
            let transform = ctx.element_transform(element);
            let color = element_color(element);
            let id = element.id;
            match element.kind {
                ElementKind::Shape => self.commands.push(DrawCommand::FillRect {
                    id,
                    rect: element.frame(),
                    transform,
                    color,
                }),
                ElementKind::Drawing => self.commands.push(DrawCommand::StrokeRect {
                    id,
                    rect: element.frame(),
                    transform,
                    color,
                    width: DRAWING_STROKE_WIDTH,
                }),
                ElementKind::Text => self.commands.push(DrawCommand::Text {
                    id,
                    origin: element.position(),
                    content: element.content.clone().unwrap_or_default(),
                    font_size: element.font_size.unwrap_or(designkit_core::element::DEFAULT_FONT_SIZE),
                    font_family: element.font_family.clone(),
                    transform,
                    color,
                }),
                // Members draw themselves.
                ElementKind::Group => {}
            }
        }

        for element in ctx.elements.iter().filter(|e| ctx.is_selected(e.id)) {
            self.commands.push(DrawCommand::SelectionOutline {
                id: element.id,
                bounds: ctx.screen_bounds(element),
                color: ctx.selection_color,
            });
        }

        if let Some(rect) = ctx.selection_rect {
            self.commands.push(DrawCommand::Marquee {
                rect: ctx.transform.transform_rect_bbox(rect),
                color: ctx.selection_color,
            });
        }
        Ok(())
    }

    fn take_gestures(&mut self) -> Vec<Gesture> {
        self.gestures.drain(..).collect()
    }
}
