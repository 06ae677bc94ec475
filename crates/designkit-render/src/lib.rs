//! DesignKit Render Library
//!
//! Renderer abstraction and two interchangeable implementations: a display
//! list recorder for hosts with their own paint backend, and an SVG writer.

mod display_list;
mod renderer;
mod svg;

pub use display_list::{DisplayListRenderer, DrawCommand};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError, element_color, parse_color};
pub use svg::SvgRenderer;
