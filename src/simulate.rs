//! Greedy line packing inside a skewed container.

use serde::{Deserialize, Serialize};

use crate::config::{FitConfig, StageGeometry};

/// Outcome of one simulated layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSimulation {
    /// Lines occupied; `max_lines + 1` means "does not fit" and packing stopped there.
    pub line_count: usize,
}

impl LineSimulation {
    pub fn fits(&self, max_lines: usize) -> bool {
        self.line_count <= max_lines
    }
}

/// Usable width of line `line` (0 = top) in unscaled px.
///
/// Upper lines of a sheared box lose `skew_tangent * line_height` per line of
/// distance from the bottom line.
pub fn line_limit(line: usize, scale: f32, geometry: &StageGeometry, fit: &FitConfig) -> f32 {
    let rows_below = fit.max_lines as f32 - 1.0 - line as f32;
    let shear = geometry.skew_tangent.abs() * rows_below * geometry.line_height_px;
    let usable = (geometry.container_width_px / scale - shear) * fit.fill_ratio
        - fit.safety_margin_px / scale;
    usable.floor().max(fit.min_line_limit_px)
}

/// Count the lines `widths` occupy at `scale`.
///
/// A unit never splits; a unit wider than an empty line is placed anyway.
/// Empty input occupies one line.
pub fn simulate_lines(
    widths: &[f32],
    scale: f32,
    geometry: &StageGeometry,
    fit: &FitConfig,
) -> LineSimulation {
    let overflow = LineSimulation {
        line_count: fit.max_lines.saturating_add(1),
    };
    if !(scale.is_finite() && scale > 0.0) {
        return overflow;
    }

    let mut lines = 1usize;
    let mut used = 0.0f32;
    let mut placed = 0usize;
    let mut limit = line_limit(0, scale, geometry, fit);
    for &width in widths {
        if placed > 0 && used + width > limit {
            lines += 1;
            if lines > fit.max_lines {
                return overflow;
            }
            used = 0.0;
            placed = 0;
            limit = line_limit(lines - 1, scale, geometry, fit);
        }
        used += width;
        placed += 1;
    }
    LineSimulation { line_count: lines }
}
