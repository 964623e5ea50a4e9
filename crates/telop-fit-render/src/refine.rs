//! Phase B: refine the scale against line bands measured on the live surface.

use serde::{Deserialize, Serialize};
use telop_fit::{FitConfig, ScaleSearch};

use crate::commit::count_line_bands;
use crate::error::RenderError;
use crate::surface::{wait_for_layout_settle, CancelToken, DisplaySurface, FrameScheduler};

/// Where the measured refinement ended up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefineOutcome {
    /// Scale left applied on the surface.
    pub scale: f32,
    /// Line bands measured at `scale`.
    pub measured_lines: usize,
    /// Settled probes spent.
    pub probes: u32,
    /// Whether `measured_lines` is within the allowed lines.
    pub fits: bool,
}

/// Settle, check for cancellation and count the rendered line bands.
async fn settled_band_count<S, F, C>(
    surface: &S,
    frames: &F,
    expected_units: usize,
    band_tolerance_px: f32,
    cancel: &C,
) -> Result<usize, RenderError>
where
    S: DisplaySurface,
    F: FrameScheduler,
    C: CancelToken,
{
    wait_for_layout_settle(frames).await;
    if cancel.is_cancelled() {
        return Err(RenderError::Cancelled);
    }
    let tops = surface.unit_top_offsets();
    if tops.len() != expected_units {
        return Err(RenderError::UnitCountMismatch {
            expected: expected_units,
            actual: tops.len(),
        });
    }
    Ok(count_line_bands(&tops, band_tolerance_px))
}

/// Shrink the surface's compression until its measured line bands fit.
///
/// The surface must already hold `expected_units` units rendered at
/// `start_scale`. Each probe re-applies the scale and waits for layout to
/// settle before counting bands, so probes are strictly sequential. When the
/// budget runs out without a fit the best scale found (or the floor) is
/// applied anyway.
pub async fn refine_scale<S, F, C>(
    surface: &S,
    frames: &F,
    start_scale: f32,
    expected_units: usize,
    fit: &FitConfig,
    band_tolerance_px: f32,
    cancel: &C,
) -> Result<RefineOutcome, RenderError>
where
    S: DisplaySurface,
    F: FrameScheduler,
    C: CancelToken,
{
    let measured =
        settled_band_count(surface, frames, expected_units, band_tolerance_px, cancel).await?;
    log::debug!(
        "refine: {} band(s) measured at scale {:.4}",
        measured,
        start_scale
    );
    if measured <= fit.max_lines {
        return Ok(RefineOutcome {
            scale: start_scale,
            measured_lines: measured,
            probes: 0,
            fits: true,
        });
    }

    let mut search = ScaleSearch::new(fit.min_scale, start_scale, fit);
    while let Some(scale) = search.next_probe() {
        surface.set_hscale(scale);
        let lines =
            settled_band_count(surface, frames, expected_units, band_tolerance_px, cancel).await?;
        let fits = lines <= fit.max_lines;
        log::trace!("refine probe scale={:.4} lines={} fits={}", scale, lines, fits);
        search.record(fits);
    }

    let scale = search.best();
    surface.set_hscale(scale);
    // The last probe may have been a miss, so re-settle at `best` before reporting.
    let measured_lines =
        settled_band_count(surface, frames, expected_units, band_tolerance_px, cancel).await?;
    let fits = measured_lines <= fit.max_lines;
    if fits {
        log::debug!(
            "refine: scale={:.4} lines={} probes={}",
            scale,
            measured_lines,
            search.probes()
        );
    } else {
        log::warn!(
            "refine: {} line(s) exceed the {} allowed after {} probe(s); committing scale {:.4}",
            measured_lines,
            fit.max_lines,
            search.probes(),
            scale
        );
    }
    Ok(RefineOutcome {
        scale,
        measured_lines,
        probes: search.probes(),
        fits,
    })
}
