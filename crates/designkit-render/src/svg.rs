//! SVG export renderer.

use crate::renderer::{RenderContext, RenderResult, Renderer, element_color};
use designkit_core::element::DEFAULT_FONT_SIZE;
use designkit_core::{DesignElement, ElementKind, Gesture};
use kurbo::{Affine, Rect};
use peniko::Color;
use std::fmt::Write;

/// Stroke width (document units) for freehand drawing placeholders.
const DRAWING_STROKE_WIDTH: f64 = 2.0;

/// Renders a frame to an SVG document string.
///
/// The output is static, so this renderer never reports gestures.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    output: String,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The SVG produced by the last frame.
    pub fn svg(&self) -> &str {
        &self.output
    }

    pub fn into_svg(self) -> String {
        self.output
    }

    fn write_element(&mut self, element: &DesignElement) -> RenderResult<()> {
        let (fill, opacity) = svg_color(element_color(element));
        let frame = element.frame();
        let rotation = rotate_attr(element);
        match element.kind {
            ElementKind::Shape => writeln!(
                self.output,
                r#"    <rect x="{}" y="{}" width="{}" height="{}" fill="{fill}" fill-opacity="{opacity}"{rotation}/>"#,
                frame.x0,
                frame.y0,
                frame.width(),
                frame.height(),
            )?,
            ElementKind::Drawing => writeln!(
                self.output,
                r#"    <rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{fill}" stroke-opacity="{opacity}" stroke-width="{DRAWING_STROKE_WIDTH}"{rotation}/>"#,
                frame.x0,
                frame.y0,
                frame.width(),
                frame.height(),
            )?,
            ElementKind::Text => {
                let font_size = element.font_size.unwrap_or(DEFAULT_FONT_SIZE);
                write!(
                    self.output,
                    r#"    <text x="{}" y="{}" font-size="{font_size}" dominant-baseline="hanging" fill="{fill}" fill-opacity="{opacity}""#,
                    frame.x0, frame.y0,
                )?;
                if let Some(family) = &element.font_family {
                    write!(self.output, r#" font-family="{}""#, escape(family))?;
                }
                if let Some(weight) = &element.font_weight {
                    write!(self.output, r#" font-weight="{}""#, escape(weight))?;
                }
                writeln!(
                    self.output,
                    "{rotation}>{}</text>",
                    escape(element.content.as_deref().unwrap_or_default())
                )?;
            }
            ElementKind::Group => {}
        }
        Ok(())
    }

    fn write_outline(&mut self, rect: Rect, color: Color, dashed: bool) -> RenderResult<()> {
        let (stroke, opacity) = svg_color(color);
        let dash = if dashed { r#" stroke-dasharray="4 4""# } else { "" };
        writeln!(
            self.output,
            r#"  <rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{stroke}" stroke-opacity="{opacity}"{dash}/>"#,
            rect.x0,
            rect.y0,
            rect.width(),
            rect.height(),
        )?;
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        self.output.clear();
        let size = ctx.viewport_size;
        writeln!(
            self.output,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = size.width,
            h = size.height,
        )?;
        let (background, _) = svg_color(self.background_color(ctx));
        writeln!(self.output, r#"  <rect width="100%" height="100%" fill="{background}"/>"#)?;

        writeln!(self.output, r#"  <g transform="{}">"#, matrix_attr(ctx.transform))?;
        for element in &ctx.elements {
            self.write_element(element)?;
        }
        writeln!(self.output, "  </g>")?;

        // Overlays are drawn in screen space so their stroke does not scale.
        for element in ctx.elements.iter().filter(|e| ctx.is_selected(e.id)) {
            self.write_outline(ctx.screen_bounds(element), ctx.selection_color, false)?;
        }
        if let Some(rect) = ctx.selection_rect {
            self.write_outline(ctx.transform.transform_rect_bbox(rect), ctx.selection_color, true)?;
        }

        writeln!(self.output, "</svg>")?;
        log::debug!("Rendered {} element(s) to SVG", ctx.elements.len());
        Ok(())
    }

    fn take_gestures(&mut self) -> Vec<Gesture> {
        Vec::new()
    }
}

/// Hex color and opacity for SVG paint attributes.
fn svg_color(color: Color) -> (String, f64) {
    let rgba = color.to_rgba8();
    let hex = format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b);
    let opacity = (f64::from(rgba.a) / 255.0 * 1000.0).round() / 1000.0;
    (hex, opacity)
}

fn matrix_attr(transform: Affine) -> String {
    let [a, b, c, d, e, f] = transform.as_coeffs();
    format!("matrix({a} {b} {c} {d} {e} {f})")
}

fn rotate_attr(element: &DesignElement) -> String {
    let rotation = element.rotation();
    if rotation == 0.0 {
        return String::new();
    }
    let center = element.frame().center();
    format!(r#" transform="rotate({rotation} {} {})""#, center.x, center.y)
}

/// Escape text for use in SVG content and attribute values.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
