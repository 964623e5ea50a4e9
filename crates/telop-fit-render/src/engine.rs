//! Request orchestration: measure, solve, render, refine, lock, correct.

use core::cell::Cell;
use core::future::Future;

use serde::{Deserialize, Serialize};
use telop_fit::{
    AutofitResult, AutofitSolver, MeasureHost, SegmentUnit, TelopConfig, Tokenizer, WidthOracle,
};

use crate::commit::{commit_layout, LockedLine};
use crate::error::RenderError;
use crate::refine::{refine_scale, RefineOutcome};
use crate::skew::{apply_skew_correction, SkewCorrection};
use crate::surface::{wait_for_layout_settle, CancelToken, DisplaySurface, FrameScheduler};

/// Committed layout of one render request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelopLayout {
    /// Request generation this layout belongs to.
    pub generation: u64,
    /// Simulation-only solve.
    pub phase_a: AutofitResult,
    /// Scale left applied on the surface after measured refinement.
    pub scale: f32,
    /// Line bands measured at `scale`.
    pub measured_lines: usize,
    /// Settled probes the refinement spent.
    pub refine_probes: u32,
    /// Locked line grouping.
    pub lines: Vec<LockedLine>,
    pub correction: SkewCorrection,
    pub units: Vec<SegmentUnit>,
}

impl TelopLayout {
    /// Whether the committed layout stays within the allowed lines.
    pub fn fits(&self, max_lines: usize) -> bool {
        self.measured_lines <= max_lines
    }
}

/// Generation check for one in-flight request.
struct RequestGuard<'a> {
    current: &'a Cell<u64>,
    generation: u64,
}

impl RequestGuard<'_> {
    fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            log::warn!(
                "abandoning render request {} (current is {})",
                self.generation,
                self.current.get()
            );
            return Err(RenderError::Superseded {
                generation: self.generation,
            });
        }
        Ok(())
    }

    fn translate(&self, err: RenderError) -> RenderError {
        match err {
            RenderError::Cancelled => {
                log::warn!("render request {} superseded mid-refinement", self.generation);
                RenderError::Superseded {
                    generation: self.generation,
                }
            }
            other => other,
        }
    }
}

impl CancelToken for RequestGuard<'_> {
    fn is_cancelled(&self) -> bool {
        self.current.get() != self.generation
    }
}

/// Renders telops onto one display surface.
///
/// Requests on the same renderer are serialized by generation: starting a
/// new request makes every older one stop at its next suspension point.
pub struct TelopRenderer<S, H, F> {
    surface: S,
    oracle: WidthOracle<H>,
    frames: F,
    tokenizer: Tokenizer,
    config: TelopConfig,
    generation: Cell<u64>,
}

impl<S, H, F> TelopRenderer<S, H, F>
where
    S: DisplaySurface,
    H: MeasureHost,
    F: FrameScheduler,
{
    pub fn new(surface: S, host: H, frames: F, config: TelopConfig) -> Result<Self, RenderError> {
        config.validate()?;
        Ok(Self {
            surface,
            oracle: WidthOracle::new(host, config.punctuation),
            frames,
            tokenizer: Tokenizer::new(),
            config,
            generation: Cell::new(0),
        })
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn config(&self) -> &TelopConfig {
        &self.config
    }

    /// Generation of the most recently started request.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Typeset `text` onto the surface.
    ///
    /// The request is stamped when `render` is called, not when the future is
    /// first polled, so an older future that has not started yet is already
    /// stale. A stale request resolves to [`RenderError::Superseded`] without
    /// touching the surface again.
    pub fn render<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Future<Output = Result<TelopLayout, RenderError>> + 'a {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        self.run_request(text, generation)
    }

    async fn run_request(&self, text: &str, generation: u64) -> Result<TelopLayout, RenderError> {
        let request = RequestGuard {
            current: &self.generation,
            generation,
        };
        request.check()?;

        let style = self.surface.computed_style();
        let default_tangent = self.config.default_skew_tangent();
        let geometry = style.stage_geometry(default_tangent);
        let solver = AutofitSolver::new(self.config.fit);
        let (sentence, phase_a) =
            solver.fit_text(&self.tokenizer, &self.oracle, text, &style.font, &geometry)?;
        let units: Vec<SegmentUnit> = sentence.units.into_iter().map(|m| m.unit).collect();

        self.surface.set_hscale(phase_a.scale);
        self.surface.replace_units(&units);

        let refined = if units.is_empty() {
            RefineOutcome {
                scale: phase_a.scale,
                measured_lines: 1,
                probes: 0,
                fits: true,
            }
        } else {
            refine_scale(
                &self.surface,
                &self.frames,
                phase_a.scale,
                units.len(),
                &self.config.fit,
                self.config.band_tolerance_px,
                &request,
            )
            .await
            .map_err(|err| request.translate(err))?
        };

        let lines = commit_layout(&self.surface, self.config.band_tolerance_px);
        wait_for_layout_settle(&self.frames).await;
        request.check()?;
        let correction = apply_skew_correction(&self.surface, default_tangent);

        log::debug!(
            "render {}: {} unit(s) on {} line(s), phase A {:.4}, final {:.4}",
            generation,
            units.len(),
            lines.len(),
            phase_a.scale,
            refined.scale
        );
        Ok(TelopLayout {
            generation,
            phase_a,
            scale: refined.scale,
            measured_lines: refined.measured_lines,
            refine_probes: refined.probes,
            lines,
            correction,
            units,
        })
    }
}
