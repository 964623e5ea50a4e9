use serde::{Deserialize, Serialize};
use telop_fit::{FontContext, StageGeometry};

/// Below this `|d|` a transform matrix is treated as degenerate.
const MATRIX_EPSILON: f32 = 1e-6;

/// Computed style of a display surface as reported by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceStyle {
    /// Font metrics of the live surface.
    pub font: FontContext,
    /// Width available to the text, in layout px.
    pub available_width_px: f32,
    /// Active 2-D transform `matrix(a, b, c, d, e, f)`, if any.
    pub transform: Option<[f32; 6]>,
    /// Raw value of the global stage-scale custom property.
    pub stage_scale: Option<String>,
}

impl SurfaceStyle {
    pub fn new(font: FontContext, available_width_px: f32) -> Self {
        Self {
            font,
            available_width_px,
            transform: None,
            stage_scale: None,
        }
    }

    /// Builder: stage sheared by `deg` degrees and scaled uniformly by `scale`.
    pub fn with_skew_deg(mut self, deg: f32, scale: f32) -> Self {
        let tan = deg.to_radians().tan();
        self.transform = Some([scale, 0.0, scale * tan, scale, 0.0, 0.0]);
        self
    }

    pub fn with_stage_scale(mut self, raw: impl Into<String>) -> Self {
        self.stage_scale = Some(raw.into());
        self
    }

    /// Horizontal shear (`c / d` of the matrix), sign preserved.
    ///
    /// Falls back to `default_tangent` when no usable transform is present.
    pub fn skew_tangent(&self, default_tangent: f32) -> f32 {
        match self.transform {
            Some([_, _, c, d, _, _]) if d.abs() > MATRIX_EPSILON && (c / d).is_finite() => c / d,
            _ => default_tangent,
        }
    }

    /// Global stage scale; unparsable or non-positive values read as `1.0`.
    pub fn global_scale(&self) -> f32 {
        self.stage_scale
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(1.0)
    }

    /// Geometry consumed by the line simulator.
    pub fn stage_geometry(&self, default_tangent: f32) -> StageGeometry {
        StageGeometry::new(
            self.available_width_px,
            self.font.line_height_px,
            self.skew_tangent(default_tangent),
        )
    }
}
