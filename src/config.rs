//! Tunables for fitting, punctuation overhang and stage geometry.

use serde::{Deserialize, Serialize};

use crate::error::TelopError;

/// Horizontal-scale search policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Maximum number of lines the sentence may occupy.
    pub max_lines: usize,
    /// Hard legibility floor for the horizontal scale.
    pub min_scale: f32,
    /// Preferred (largest) horizontal scale.
    pub base_scale: f32,
    /// Bisection iteration budget.
    pub max_iterations: u32,
    /// Bisection stops once `hi - lo` drops below this width.
    pub tolerance: f32,
    /// Fraction of each line budget considered usable.
    pub fill_ratio: f32,
    /// Safety margin in px, divided by the probed scale.
    pub safety_margin_px: f32,
    /// Lower clamp for any line budget, in unscaled px.
    pub min_line_limit_px: f32,
}

impl FitConfig {
    /// Convenience for a given line count with default search parameters.
    pub fn for_lines(max_lines: usize) -> Self {
        Self {
            max_lines,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TelopError> {
        if self.max_lines == 0 {
            return Err(TelopError::invalid_config("max_lines", "must be at least 1"));
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(TelopError::invalid_config(
                "min_scale",
                format!("must be finite and positive, got {}", self.min_scale),
            ));
        }
        if !self.base_scale.is_finite() || self.base_scale < self.min_scale {
            return Err(TelopError::invalid_config(
                "base_scale",
                format!(
                    "must be finite and >= min_scale ({}), got {}",
                    self.min_scale, self.base_scale
                ),
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(TelopError::invalid_config(
                "tolerance",
                format!("must be finite and positive, got {}", self.tolerance),
            ));
        }
        if !(self.fill_ratio > 0.0 && self.fill_ratio <= 1.0) {
            return Err(TelopError::invalid_config(
                "fill_ratio",
                format!("must be within (0, 1], got {}", self.fill_ratio),
            ));
        }
        if self.max_iterations == 0 {
            return Err(TelopError::invalid_config("max_iterations", "must be at least 1"));
        }
        if !(self.safety_margin_px.is_finite() && self.safety_margin_px >= 0.0) {
            return Err(TelopError::invalid_config(
                "safety_margin_px",
                format!("must be finite and non-negative, got {}", self.safety_margin_px),
            ));
        }
        if !(self.min_line_limit_px.is_finite() && self.min_line_limit_px >= 0.0) {
            return Err(TelopError::invalid_config(
                "min_line_limit_px",
                format!("must be finite and non-negative, got {}", self.min_line_limit_px),
            ));
        }
        Ok(())
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_lines: 2,
            min_scale: 0.72,
            base_scale: 1.0,
            max_iterations: 14,
            tolerance: 0.003,
            fill_ratio: 0.98,
            safety_margin_px: 10.0,
            min_line_limit_px: 24.0,
        }
    }
}

/// Optical overhang allowances for full-width punctuation.
///
/// Values are in em and resolved against the surface font size, matching the
/// `--punctEatL` / `--punctEatR` style variables of the display page.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PunctuationConfig {
    /// Width removed from units that open with leading punctuation.
    pub eat_left_em: f32,
    /// Width removed from units that close with trailing punctuation.
    pub eat_right_em: f32,
}

impl PunctuationConfig {
    pub fn eat_left_px(&self, font_size_px: f32) -> f32 {
        (self.eat_left_em * font_size_px).max(0.0)
    }

    pub fn eat_right_px(&self, font_size_px: f32) -> f32 {
        (self.eat_right_em * font_size_px).max(0.0)
    }
}

impl Default for PunctuationConfig {
    fn default() -> Self {
        Self {
            eat_left_em: 0.5,
            eat_right_em: 0.5,
        }
    }
}

/// Container geometry seen by the line simulator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageGeometry {
    /// Nominal container width in unscaled px.
    pub container_width_px: f32,
    /// Line height in px.
    pub line_height_px: f32,
    /// Absolute horizontal shear of the stage.
    pub skew_tangent: f32,
}

impl StageGeometry {
    pub fn new(container_width_px: f32, line_height_px: f32, skew_tangent: f32) -> Self {
        Self {
            container_width_px,
            line_height_px,
            skew_tangent: skew_tangent.abs(),
        }
    }

    pub fn validate(&self) -> Result<(), TelopError> {
        if !(self.container_width_px.is_finite() && self.container_width_px >= 0.0) {
            return Err(TelopError::invalid_config(
                "container_width_px",
                format!("must be finite and non-negative, got {}", self.container_width_px),
            ));
        }
        if !(self.line_height_px.is_finite() && self.line_height_px >= 0.0) {
            return Err(TelopError::invalid_config(
                "line_height_px",
                format!("must be finite and non-negative, got {}", self.line_height_px),
            ));
        }
        if !self.skew_tangent.is_finite() {
            return Err(TelopError::invalid_config(
                "skew_tangent",
                "must be finite",
            ));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelopConfig {
    /// Scale search policy.
    pub fit: FitConfig,
    /// Punctuation overhang allowances.
    pub punctuation: PunctuationConfig,
    /// Rendered units whose tops differ by at most this many px share a line.
    pub band_tolerance_px: f32,
    /// Stage skew used when the surface exposes no transform, in degrees.
    pub default_skew_deg: f32,
}

impl TelopConfig {
    /// Decode a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TelopError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), TelopError> {
        self.fit.validate()?;
        if !(self.band_tolerance_px.is_finite() && self.band_tolerance_px >= 0.0) {
            return Err(TelopError::invalid_config(
                "band_tolerance_px",
                format!("must be finite and non-negative, got {}", self.band_tolerance_px),
            ));
        }
        if !self.default_skew_deg.is_finite() {
            return Err(TelopError::invalid_config(
                "default_skew_deg",
                "must be finite",
            ));
        }
        Ok(())
    }

    /// Tangent of [`default_skew_deg`](Self::default_skew_deg), sign preserved.
    pub fn default_skew_tangent(&self) -> f32 {
        self.default_skew_deg.to_radians().tan()
    }
}

impl Default for TelopConfig {
    fn default() -> Self {
        Self {
            fit: FitConfig::default(),
            punctuation: PunctuationConfig::default(),
            band_tolerance_px: 2.0,
            default_skew_deg: -15.0,
        }
    }
}
