//! Line locking: freeze measured line breaks into explicit line containers.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::surface::DisplaySurface;

/// Units that measured to the same vertical band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockedLine {
    /// 0-based line index, top to bottom.
    pub index: usize,
    /// Top offset of the first unit on the line.
    pub top_px: f32,
    /// Indices into the rendered unit sequence, ascending.
    pub units: SmallVec<[usize; 8]>,
}

/// Group unit top offsets into line bands.
///
/// A unit joins the current band when its top is within `tolerance_px` of
/// the band's first unit; otherwise it opens the next band.
pub fn group_line_bands(tops: &[f32], tolerance_px: f32) -> Vec<LockedLine> {
    let mut lines: Vec<LockedLine> = Vec::new();
    for (unit, &top) in tops.iter().enumerate() {
        if let Some(line) = lines
            .last_mut()
            .filter(|line| (top - line.top_px).abs() <= tolerance_px)
        {
            line.units.push(unit);
            continue;
        }
        let mut units = SmallVec::new();
        units.push(unit);
        lines.push(LockedLine {
            index: lines.len(),
            top_px: top,
            units,
        });
    }
    lines
}

/// Number of distinct line bands, at least one.
pub fn count_line_bands(tops: &[f32], tolerance_px: f32) -> usize {
    group_line_bands(tops, tolerance_px).len().max(1)
}

/// Measure the surface, group its units by line and lock the grouping in.
pub fn commit_layout<S: DisplaySurface>(surface: &S, tolerance_px: f32) -> Vec<LockedLine> {
    let lines = group_line_bands(&surface.unit_top_offsets(), tolerance_px);
    surface.lock_lines(&lines);
    log::debug!("locked {} line(s)", lines.len());
    lines
}
