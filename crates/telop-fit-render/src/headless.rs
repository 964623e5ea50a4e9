//! In-memory display surface for headless rendering and tests.

use core::cell::RefCell;

use telop_fit::{FontContext, HeuristicMeasureHost, PunctuationConfig, SegmentUnit};

use crate::commit::LockedLine;
use crate::skew::SkewCorrection;
use crate::style::SurfaceStyle;
use crate::surface::DisplaySurface;

#[derive(Debug, Default)]
struct StageState {
    hscale: f32,
    units: Vec<SegmentUnit>,
    locked: Option<Vec<LockedLine>>,
    correction: Option<SkewCorrection>,
    hscale_writes: u32,
}

/// A rectangular stage that flows units greedily at their shaped width.
///
/// Shaped width is the glyph-class estimate times `hscale` times
/// `1 + shaping_drift`; a positive drift makes the stage wrap earlier than
/// a width-sum simulation predicts, the way real shaping occasionally does.
#[derive(Debug)]
pub struct HeadlessStage {
    style: SurfaceStyle,
    host: HeuristicMeasureHost,
    punctuation: PunctuationConfig,
    shaping_drift: f32,
    state: RefCell<StageState>,
}

impl HeadlessStage {
    pub fn new(style: SurfaceStyle) -> Self {
        Self {
            style,
            host: HeuristicMeasureHost::new(),
            punctuation: PunctuationConfig::default(),
            shaping_drift: 0.0,
            state: RefCell::new(StageState {
                hscale: 1.0,
                ..StageState::default()
            }),
        }
    }

    /// Stage `available_width_px` wide rendering with `font`, no transform.
    pub fn with_font(font: FontContext, available_width_px: f32) -> Self {
        Self::new(SurfaceStyle::new(font, available_width_px))
    }

    pub fn with_shaping_drift(mut self, drift: f32) -> Self {
        self.shaping_drift = drift;
        self
    }

    pub fn with_punctuation(mut self, punctuation: PunctuationConfig) -> Self {
        self.punctuation = punctuation;
        self
    }

    pub fn hscale(&self) -> f32 {
        self.state.borrow().hscale
    }

    /// Number of times the compression variable was written.
    pub fn hscale_writes(&self) -> u32 {
        self.state.borrow().hscale_writes
    }

    pub fn units(&self) -> Vec<SegmentUnit> {
        self.state.borrow().units.clone()
    }

    pub fn locked_lines(&self) -> Option<Vec<LockedLine>> {
        self.state.borrow().locked.clone()
    }

    pub fn published_correction(&self) -> Option<SkewCorrection> {
        self.state.borrow().correction
    }

    /// Raw text of each visual line, top to bottom.
    pub fn line_texts(&self) -> Vec<String> {
        let state = self.state.borrow();
        let line_of = self.line_assignment(&state);
        let mut lines: Vec<String> = Vec::new();
        for (unit, line) in state.units.iter().zip(line_of) {
            if lines.len() <= line {
                lines.resize(line + 1, String::new());
            }
            lines[line].push_str(&unit.raw_text);
        }
        lines
    }

    fn shaped_width_px(&self, unit: &SegmentUnit, hscale: f32) -> f32 {
        let font = &self.style.font;
        let class = unit.punctuation();
        let mut width = self.host.fragment_width_px(&unit.rendered_html, font, 1.0);
        if class.leading {
            width -= self.punctuation.eat_left_px(font.size_px);
        }
        if class.trailing {
            width -= self.punctuation.eat_right_px(font.size_px);
        }
        width.max(0.0) * hscale * (1.0 + self.shaping_drift)
    }

    /// Line index of every unit: the locked grouping if present, else a fresh flow.
    fn line_assignment(&self, state: &StageState) -> Vec<usize> {
        if let Some(locked) = &state.locked {
            let mut line_of = vec![0; state.units.len()];
            for line in locked {
                for &unit in &line.units {
                    if let Some(slot) = line_of.get_mut(unit) {
                        *slot = line.index;
                    }
                }
            }
            return line_of;
        }

        let limit = self.style.available_width_px;
        let mut line_of = Vec::with_capacity(state.units.len());
        let mut line = 0usize;
        let mut used = 0.0f32;
        let mut placed = 0usize;
        for unit in &state.units {
            let width = self.shaped_width_px(unit, state.hscale);
            if placed > 0 && used + width > limit {
                line += 1;
                used = 0.0;
                placed = 0;
            }
            used += width;
            placed += 1;
            line_of.push(line);
        }
        line_of
    }
}

impl DisplaySurface for HeadlessStage {
    fn computed_style(&self) -> SurfaceStyle {
        self.style.clone()
    }

    fn set_hscale(&self, scale: f32) {
        let mut state = self.state.borrow_mut();
        state.hscale = scale;
        state.hscale_writes += 1;
    }

    fn replace_units(&self, units: &[SegmentUnit]) {
        let mut state = self.state.borrow_mut();
        state.units = units.to_vec();
        state.locked = None;
    }

    fn unit_top_offsets(&self) -> Vec<f32> {
        let state = self.state.borrow();
        let line_height = self.style.font.line_height_px * self.style.global_scale();
        self.line_assignment(&state)
            .into_iter()
            .map(|line| line as f32 * line_height)
            .collect()
    }

    fn container_height_px(&self) -> f32 {
        let state = self.state.borrow();
        let lines = self
            .line_assignment(&state)
            .into_iter()
            .max()
            .map_or(0, |last| last + 1);
        lines as f32 * self.style.font.line_height_px * self.style.global_scale()
    }

    fn lock_lines(&self, lines: &[LockedLine]) {
        self.state.borrow_mut().locked = Some(lines.to_vec());
    }

    fn publish_skew_correction(&self, correction: SkewCorrection) {
        self.state.borrow_mut().correction = Some(correction);
    }
}
