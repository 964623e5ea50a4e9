use serde::{Deserialize, Serialize};

use crate::surface::DisplaySurface;

/// Horizontal offset that re-centres a sheared box.
///
/// Shearing moves the visual centre sideways by half the box height times
/// the shear, so the frame shifts the box back by that amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkewCorrection {
    pub offset_x_px: f32,
}

impl SkewCorrection {
    /// `skew_tangent * (height / global_scale) / 2`; a non-positive scale reads as `1.0`.
    pub fn compute(height_px: f32, skew_tangent: f32, global_scale: f32) -> Self {
        let scale = if global_scale.is_finite() && global_scale > 0.0 {
            global_scale
        } else {
            1.0
        };
        Self {
            offset_x_px: skew_tangent * (height_px / scale) / 2.0,
        }
    }
}

/// Recompute the correction from the surface's current height and publish it.
pub fn apply_skew_correction<S: DisplaySurface>(surface: &S, default_tangent: f32) -> SkewCorrection {
    let style = surface.computed_style();
    let correction = SkewCorrection::compute(
        surface.container_height_px(),
        style.skew_tangent(default_tangent),
        style.global_scale(),
    );
    surface.publish_skew_correction(correction);
    log::debug!("skew correction offset_x={:.2}px", correction.offset_x_px);
    correction
}
