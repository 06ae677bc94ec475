//! Editor configuration.

use crate::drag::DEFAULT_DRAG_THROTTLE;
use crate::history::MAX_UNDO_HISTORY;
use crate::viewport::{DEFAULT_ZOOM_ANIMATION, FIT_FILL, FIT_MARGIN, MAX_ZOOM, MIN_ZOOM, SELECTION_FILL, ZOOM_STEP};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default quiet period before a debounced history snapshot is taken.
pub const DEFAULT_SNAPSHOT_DEBOUNCE_MS: u64 = 500;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the editor core. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    pub fit_margin: f64,
    pub fit_fill: f64,
    pub selection_fill: f64,
    /// Zoom transition length; 0 applies zoom changes instantly.
    pub zoom_animation_ms: u64,
    /// Minimum interval between applied drag updates; 0 disables throttling.
    pub drag_throttle_ms: u64,
    /// Snapshots kept per history branch.
    pub max_history: usize,
    pub snapshot_debounce_ms: u64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Hit-test tolerance in screen pixels.
    pub hit_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
            fit_margin: FIT_MARGIN,
            fit_fill: FIT_FILL,
            selection_fill: SELECTION_FILL,
            zoom_animation_ms: DEFAULT_ZOOM_ANIMATION.as_millis() as u64,
            drag_throttle_ms: DEFAULT_DRAG_THROTTLE.as_millis() as u64,
            max_history: MAX_UNDO_HISTORY,
            snapshot_debounce_ms: DEFAULT_SNAPSHOT_DEBOUNCE_MS,
            viewport_width: 800.0,
            viewport_height: 600.0,
            hit_tolerance: 4.0,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// A config with instant zoom and unthrottled drags, for tests and
    /// headless use.
    pub fn immediate() -> Self {
        Self {
            zoom_animation_ms: 0,
            drag_throttle_ms: 0,
            snapshot_debounce_ms: 0,
            ..Self::default()
        }
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..={} must be positive and ordered",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.zoom_step > 0.0 && self.zoom_step.is_finite()) {
            return Err(ConfigError::Invalid("zoomStep must be positive".into()));
        }
        for (name, fill) in [("fitFill", self.fit_fill), ("selectionFill", self.selection_fill)] {
            if !(fill > 0.0 && fill <= 1.0) {
                return Err(ConfigError::Invalid(format!("{name} must be within (0, 1]")));
            }
        }
        if !(self.fit_margin >= 0.0 && self.fit_margin.is_finite()) {
            return Err(ConfigError::Invalid("fitMargin must be non-negative".into()));
        }
        if self.max_history == 0 {
            return Err(ConfigError::Invalid("maxHistory must be at least 1".into()));
        }
        if !(self.viewport_width > 0.0 && self.viewport_height > 0.0) {
            return Err(ConfigError::Invalid("viewport size must be positive".into()));
        }
        Ok(())
    }
}
