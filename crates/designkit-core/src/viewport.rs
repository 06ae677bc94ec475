//! Viewport module for zoom, pan and viewport culling.

use crate::config::EditorConfig;
use crate::deferred::{RequestToken, TokenSource};
use crate::element::DesignElement;
use crate::store::union_bounds;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 10.0;
/// Increment applied by zoom in/out.
pub const ZOOM_STEP: f64 = 0.1;
/// Margin (document units) added around content when fitting.
pub const FIT_MARGIN: f64 = 50.0;
/// Fraction of the viewport that fitted content fills.
pub const FIT_FILL: f64 = 0.8;
/// Fraction of the viewport that a fitted selection fills.
pub const SELECTION_FILL: f64 = 0.9;
/// Default duration of a zoom transition.
pub const DEFAULT_ZOOM_ANIMATION: Duration = Duration::from_millis(300);

/// A zoom level and the document point shown at the viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f64,
    pub center: Point,
}

impl ViewState {
    fn lerp(self, to: ViewState, t: f64) -> ViewState {
        ViewState {
            zoom: self.zoom + (to.zoom - self.zoom) * t,
            center: self.center.lerp(to.center, t),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ZoomAnimation {
    from: ViewState,
    /// Set by the first tick, so the caller's clock drives the transition.
    started: Option<Instant>,
    token: RequestToken,
}

/// Maps a zoom level and center point to a document-space viewport.
///
/// Zoom changes interpolate from the currently displayed state to the
/// target with an ease-out curve; call [`tick`](Self::tick) once per frame.
/// A new target restarts the interpolation from wherever the view is now.
#[derive(Debug, Clone)]
pub struct Viewport {
    view: ViewState,
    target: ViewState,
    size: Size,
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
    fit_margin: f64,
    fit_fill: f64,
    selection_fill: f64,
    animation_duration: Duration,
    animation: Option<ZoomAnimation>,
    tokens: TokenSource,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0))
    }
}

impl Viewport {
    /// Create a viewport of the given screen size at 100% zoom, centered on
    /// the middle of the screen-sized document area.
    pub fn new(size: Size) -> Self {
        let initial = ViewState {
            zoom: 1.0,
            center: Point::new(size.width / 2.0, size.height / 2.0),
        };
        Self {
            view: initial,
            target: initial,
            size,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            fit_margin: FIT_MARGIN,
            fit_fill: FIT_FILL,
            selection_fill: SELECTION_FILL,
            animation_duration: DEFAULT_ZOOM_ANIMATION,
            animation: None,
            tokens: TokenSource::new(),
        }
    }

    /// Create a viewport using the limits and timings from a config.
    pub fn from_config(config: &EditorConfig) -> Self {
        let mut viewport = Self::new(Size::new(config.viewport_width, config.viewport_height));
        viewport.min_zoom = config.min_zoom;
        viewport.max_zoom = config.max_zoom;
        viewport.zoom_step = config.zoom_step;
        viewport.fit_margin = config.fit_margin;
        viewport.fit_fill = config.fit_fill;
        viewport.selection_fill = config.selection_fill;
        viewport.animation_duration = Duration::from_millis(config.zoom_animation_ms);
        viewport
    }

    /// Set the transition duration. Zero applies zoom changes instantly.
    pub fn set_animation_duration(&mut self, duration: Duration) {
        self.animation_duration = duration;
    }

    /// Currently displayed zoom level.
    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    /// Currently displayed center (document space).
    pub fn center(&self) -> Point {
        self.view.center
    }

    /// State the view is moving towards.
    pub fn target(&self) -> ViewState {
        self.target
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Screen size of the viewport.
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    /// Transform from document to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.size.width / 2.0, self.size.height / 2.0))
            * Affine::scale(self.view.zoom)
            * Affine::translate(-self.view.center.to_vec2())
    }

    /// Transform from screen to document coordinates.
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Document-space rectangle currently visible.
    pub fn viewport_rect(&self) -> Rect {
        let size = Size::new(self.size.width / self.view.zoom, self.size.height / self.view.zoom);
        Rect::from_center_size(self.view.center, size)
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Move towards a new view state, animated unless the duration is zero.
    fn animate_to(&mut self, zoom: f64, center: Point) {
        self.target = ViewState {
            zoom: self.clamp_zoom(zoom),
            center,
        };
        if self.animation_duration.is_zero() {
            self.tokens.invalidate();
            self.animation = None;
            self.view = self.target;
            return;
        }
        self.animation = Some(ZoomAnimation {
            from: self.view,
            started: None,
            token: self.tokens.issue(),
        });
    }

    /// Advance the transition. Returns true while still animating.
    ///
    /// The first tick after a zoom change starts the transition clock.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(animation) = &mut self.animation else {
            return false;
        };
        let started = *animation.started.get_or_insert(now);
        let from = animation.from;
        let elapsed = now.saturating_duration_since(started);
        let t = (elapsed.as_secs_f64() / self.animation_duration.as_secs_f64()).min(1.0);
        if t >= 1.0 {
            self.finish_animation();
            return false;
        }
        self.view = from.lerp(self.target, ease_out_cubic(t));
        true
    }

    /// Token of the running transition, for hosts that schedule frame
    /// callbacks per transition.
    pub fn animation_token(&self) -> Option<RequestToken> {
        self.animation.map(|a| a.token)
    }

    /// Like [`tick`](Self::tick), for a frame scheduled under `token`.
    /// Frames of a superseded or finished transition are dropped.
    pub fn tick_for(&mut self, token: RequestToken, now: Instant) -> bool {
        if !self.tokens.is_current(token) {
            log::debug!("Dropping frame of a superseded zoom transition");
            return false;
        }
        self.tick(now)
    }

    /// Jump straight to the target state.
    pub fn finish_animation(&mut self) {
        self.tokens.invalidate();
        self.animation = None;
        self.view = self.target;
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Fit all elements into the viewport.
    ///
    /// Skipped (returns false, zoom unchanged) when there is nothing to fit
    /// or the content has zero area.
    pub fn zoom_to_fit<'a>(&mut self, elements: impl IntoIterator<Item = &'a DesignElement>) -> bool {
        self.fit(elements, self.fit_fill)
    }

    /// Fit the selected elements, filling more of the viewport than
    /// [`zoom_to_fit`](Self::zoom_to_fit). Falls back to fitting `all` when
    /// the selection is empty.
    pub fn zoom_to_selection<'a>(
        &mut self,
        selected: impl IntoIterator<Item = &'a DesignElement>,
        all: impl IntoIterator<Item = &'a DesignElement>,
    ) -> bool {
        let selected: Vec<&DesignElement> = selected.into_iter().collect();
        if selected.is_empty() {
            return self.zoom_to_fit(all);
        }
        self.fit(selected, self.selection_fill)
    }

    fn fit<'a>(&mut self, elements: impl IntoIterator<Item = &'a DesignElement>, fill: f64) -> bool {
        let Some(content) = union_bounds(elements) else {
            log::debug!("Nothing to fit");
            return false;
        };
        if content.is_zero_area() {
            log::debug!("Content has zero area; keeping zoom {}", self.target.zoom);
            return false;
        }
        let framed = content.inflate(self.fit_margin, self.fit_margin);
        let zoom = (self.size.width * fill / framed.width())
            .min(self.size.height * fill / framed.height())
            .min(self.max_zoom);
        self.animate_to(zoom, framed.center());
        true
    }

    /// Step the zoom level up, keeping the center.
    pub fn zoom_in(&mut self) {
        self.animate_to(self.target.zoom + self.zoom_step, self.target.center);
    }

    /// Step the zoom level down, keeping the center.
    pub fn zoom_out(&mut self) {
        self.animate_to(self.target.zoom - self.zoom_step, self.target.center);
    }

    /// Set the zoom level directly, optionally re-centering.
    pub fn zoom_to(&mut self, level: f64, center: Option<Point>) {
        if !level.is_finite() {
            log::warn!("Ignoring non-finite zoom level");
            return;
        }
        let center = center.unwrap_or(self.target.center);
        self.animate_to(level, center);
    }

    /// Zoom by a factor, keeping the given screen point fixed (scroll wheel).
    /// Applied instantly.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.finish_animation();
        let new_zoom = self.clamp_zoom(self.view.zoom * factor);
        if (new_zoom - self.view.zoom).abs() < f64::EPSILON {
            return;
        }
        let world_point = self.screen_to_world(screen_point);
        let from_center = screen_point - Point::new(self.size.width / 2.0, self.size.height / 2.0);
        self.view = ViewState {
            zoom: new_zoom,
            center: world_point - from_center / new_zoom,
        };
        self.target = self.view;
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.finish_animation();
        self.view.center -= delta / self.view.zoom;
        self.target = self.view;
    }

    /// Reset to 100% zoom centered on the middle of the screen-sized area.
    pub fn reset(&mut self) {
        self.zoom_to(1.0, Some(Point::new(self.size.width / 2.0, self.size.height / 2.0)));
    }

    /// Bounding-box overlap test between an element and a viewport rect.
    pub fn is_element_visible(element: &DesignElement, viewport: Rect) -> bool {
        let b = element.bounds();
        b.x0 <= viewport.x1 && b.x1 >= viewport.x0 && b.y0 <= viewport.y1 && b.y1 >= viewport.y0
    }

    /// The elements worth handing to a renderer: visible ones overlapping
    /// the current viewport. Order is preserved.
    pub fn visible_elements<'a>(
        &self,
        elements: impl IntoIterator<Item = &'a DesignElement>,
    ) -> Vec<&'a DesignElement> {
        let rect = self.viewport_rect();
        elements
            .into_iter()
            .filter(|e| e.visible && Self::is_element_visible(e, rect))
            .collect()
    }
}

fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}
