//! Pre-render horizontal-scale search.

use serde::{Deserialize, Serialize};

use crate::config::{FitConfig, StageGeometry};
use crate::error::TelopError;
use crate::measure::{FontContext, MeasureHost, MeasuredSentence, WidthOracle};
use crate::simulate::simulate_lines;
use crate::tokenize::Tokenizer;

/// Bounded bisection toward the largest scale that still fits.
///
/// The search is driven from outside: ask for a probe, test it, record the
/// verdict. This lets a synchronous simulation and an awaited host
/// measurement share the same iteration and tolerance discipline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSearch {
    lo: f32,
    hi: f32,
    best: f32,
    probes: u32,
    max_iterations: u32,
    tolerance: f32,
    pending: Option<f32>,
}

impl ScaleSearch {
    /// Search `(floor, ceiling)`; `floor` is the answer if no probe fits.
    pub fn new(floor: f32, ceiling: f32, fit: &FitConfig) -> Self {
        Self {
            lo: floor,
            hi: ceiling.max(floor),
            best: floor,
            probes: 0,
            max_iterations: fit.max_iterations,
            tolerance: fit.tolerance,
            pending: None,
        }
    }

    /// Next scale to test, or `None` once the budget or interval is exhausted.
    pub fn next_probe(&mut self) -> Option<f32> {
        if self.probes >= self.max_iterations || self.hi - self.lo < self.tolerance {
            return None;
        }
        let mid = (self.lo + self.hi) * 0.5;
        self.pending = Some(mid);
        Some(mid)
    }

    /// Record whether the last probe fit.
    pub fn record(&mut self, fits: bool) {
        let Some(mid) = self.pending.take() else {
            return;
        };
        self.probes += 1;
        if fits {
            self.best = mid;
            self.lo = mid;
        } else {
            self.hi = mid;
        }
    }

    /// Drive the search to completion with a synchronous predicate.
    pub fn run(mut self, mut fits: impl FnMut(f32) -> bool) -> Self {
        while let Some(scale) = self.next_probe() {
            let verdict = fits(scale);
            self.record(verdict);
        }
        self
    }

    pub fn best(&self) -> f32 {
        self.best
    }

    pub fn probes(&self) -> u32 {
        self.probes
    }

    /// Whether the interval narrowed below tolerance (as opposed to running out of probes).
    pub fn converged(&self) -> bool {
        self.hi - self.lo < self.tolerance
    }
}

/// Chosen horizontal compression for one render request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutofitResult {
    /// Horizontal scale in `[min_scale, base_scale]`.
    pub scale: f32,
    /// Simulated line count at `scale`.
    pub line_count: usize,
    /// Whether `line_count` is within the allowed lines.
    pub fits: bool,
    /// Bisection probes spent.
    pub probes: u32,
}

/// Phase-A solver: simulation-only scale search.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AutofitSolver {
    config: FitConfig,
}

impl AutofitSolver {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Solve for measured units, refusing widths taken under another font.
    pub fn solve(
        &self,
        sentence: &MeasuredSentence,
        font: &FontContext,
        geometry: &StageGeometry,
    ) -> Result<AutofitResult, TelopError> {
        self.config.validate()?;
        geometry.validate()?;
        sentence.ensure_valid_for(font)?;
        Ok(self.solve_widths(&sentence.widths(), geometry))
    }

    /// Tokenize, measure and solve in one pass.
    pub fn fit_text<H: MeasureHost>(
        &self,
        tokenizer: &Tokenizer,
        oracle: &WidthOracle<H>,
        text: &str,
        font: &FontContext,
        geometry: &StageGeometry,
    ) -> Result<(MeasuredSentence, AutofitResult), TelopError> {
        let sentence = oracle.measure_sentence(tokenizer.tokenize(text), font)?;
        let result = self.solve(&sentence, font, geometry)?;
        Ok((sentence, result))
    }

    /// Solve for raw widths. The configuration is assumed valid.
    pub fn solve_widths(&self, widths: &[f32], geometry: &StageGeometry) -> AutofitResult {
        let fit = &self.config;
        let at_base = simulate_lines(widths, fit.base_scale, geometry, fit);
        if at_base.fits(fit.max_lines) {
            log::debug!(
                "autofit: {} units fit {} line(s) at base scale {}",
                widths.len(),
                at_base.line_count,
                fit.base_scale
            );
            return AutofitResult {
                scale: fit.base_scale,
                line_count: at_base.line_count,
                fits: true,
                probes: 0,
            };
        }

        let search = ScaleSearch::new(fit.min_scale, fit.base_scale, fit).run(|scale| {
            let sim = simulate_lines(widths, scale, geometry, fit);
            log::trace!("autofit probe scale={:.4} lines={}", scale, sim.line_count);
            sim.fits(fit.max_lines)
        });
        let scale = search.best();
        let at_best = simulate_lines(widths, scale, geometry, fit);
        log::debug!(
            "autofit: scale={:.4} lines={} probes={} converged={}",
            scale,
            at_best.line_count,
            search.probes(),
            search.converged()
        );
        AutofitResult {
            scale,
            line_count: at_best.line_count,
            fits: at_best.fits(fit.max_lines),
            probes: search.probes(),
        }
    }
}
