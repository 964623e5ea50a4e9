//! Width oracle: pixel widths of rendered units at neutral horizontal scale.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PunctuationConfig;
use crate::error::TelopError;
use crate::markup::{PunctuationClass, SegmentUnit};
use crate::tokenize::strip_markup;

/// Horizontal scale at which every width is measured.
pub const NEUTRAL_HSCALE: f32 = 1.0;

/// Font metrics of the live display surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontContext {
    /// Resolved font family.
    pub family: String,
    /// Font size in px.
    pub size_px: f32,
    /// Numeric weight.
    pub weight: u16,
    /// Letter spacing in px.
    pub letter_spacing_px: f32,
    /// Line height in px.
    pub line_height_px: f32,
}

impl Default for FontContext {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size_px: 48.0,
            weight: 700,
            letter_spacing_px: 0.0,
            line_height_px: 60.0,
        }
    }
}

impl fmt::Display for FontContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}px/{}px letter-spacing={}px",
            self.family, self.weight, self.size_px, self.line_height_px, self.letter_spacing_px
        )
    }
}

/// Off-screen surface used for one batch of measurements.
///
/// Dropping the scratch releases it back to the host.
pub trait MeasureScratch {
    /// Remove any previously measured content.
    fn clear(&mut self);
    /// Inject an HTML fragment.
    fn set_content(&mut self, html: &str);
    /// Rendered width of the current content in px.
    fn content_width_px(&mut self) -> f32;
}

/// Provider of measurement surfaces styled like the display surface.
pub trait MeasureHost {
    type Scratch: MeasureScratch;

    /// Acquire a scratch surface with `font` applied and the compression
    /// variable forced to `hscale`.
    fn acquire(&self, font: &FontContext, hscale: f32) -> Result<Self::Scratch, TelopError>;
}

/// A unit paired with its measured width.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasuredUnit {
    pub unit: SegmentUnit,
    /// Width in px at [`NEUTRAL_HSCALE`], overhang already removed.
    pub width_px: f32,
}

/// Measured units plus the font context the widths belong to.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasuredSentence {
    pub font: FontContext,
    pub units: Vec<MeasuredUnit>,
}

impl MeasuredSentence {
    pub fn widths(&self) -> Vec<f32> {
        self.units.iter().map(|u| u.width_px).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn is_valid_for(&self, font: &FontContext) -> bool {
        self.font == *font
    }

    /// Reject widths taken under a different rendering context.
    pub fn ensure_valid_for(&self, font: &FontContext) -> Result<(), TelopError> {
        if self.is_valid_for(font) {
            Ok(())
        } else {
            Err(TelopError::StaleMeasurement {
                measured: Box::new(self.font.clone()),
                current: Box::new(font.clone()),
            })
        }
    }
}

/// Measures rendered fragments and compensates punctuation overhang.
#[derive(Clone, Debug)]
pub struct WidthOracle<H> {
    host: H,
    punctuation: PunctuationConfig,
}

impl<H: MeasureHost> WidthOracle<H> {
    pub fn new(host: H, punctuation: PunctuationConfig) -> Self {
        Self { host, punctuation }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn punctuation(&self) -> PunctuationConfig {
        self.punctuation
    }

    /// Width of one fragment on an already acquired scratch surface.
    pub fn measure(
        &self,
        scratch: &mut H::Scratch,
        rendered_html: &str,
        raw_text: &str,
        font: &FontContext,
    ) -> Result<f32, TelopError> {
        scratch.clear();
        scratch.set_content(rendered_html);
        let measured = scratch.content_width_px();
        scratch.clear();
        if !measured.is_finite() {
            return Err(TelopError::MeasureSurfaceUnavailable {
                reason: format!("non-finite width {} for {:?}", measured, raw_text),
            });
        }

        let class = PunctuationClass::of(raw_text);
        let mut width = measured;
        if class.leading {
            width -= self.punctuation.eat_left_px(font.size_px);
        }
        if class.trailing {
            width -= self.punctuation.eat_right_px(font.size_px);
        }
        Ok(width.max(0.0))
    }

    /// Measure every unit with a single scratch surface.
    pub fn measure_sentence(
        &self,
        units: Vec<SegmentUnit>,
        font: &FontContext,
    ) -> Result<MeasuredSentence, TelopError> {
        let mut scratch = self.host.acquire(font, NEUTRAL_HSCALE)?;
        let mut measured = Vec::with_capacity(units.len());
        for unit in units {
            let width_px = self.measure(&mut scratch, &unit.rendered_html, &unit.raw_text, font)?;
            measured.push(MeasuredUnit { unit, width_px });
        }
        Ok(MeasuredSentence {
            font: font.clone(),
            units: measured,
        })
    }
}

/// Deterministic host that estimates widths from glyph classes.
///
/// Full-width glyphs advance 1em; Latin glyphs use per-class em widths.
/// Ruby advances by the wider of its base and its scaled reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeuristicMeasureHost {
    /// Reading size relative to the base size.
    pub ruby_scale: f32,
    /// Simulates a host with no renderable surface.
    pub detached: bool,
}

impl HeuristicMeasureHost {
    pub fn new() -> Self {
        Self {
            ruby_scale: 0.5,
            detached: false,
        }
    }

    pub fn detached() -> Self {
        Self {
            detached: true,
            ..Self::new()
        }
    }

    /// Width of `html` in px under `font` and `hscale`.
    pub fn fragment_width_px(&self, html: &str, font: &FontContext, hscale: f32) -> f32 {
        let (em, glyphs) = fragment_em_width(html, self.ruby_scale);
        (em * font.size_px + glyphs as f32 * font.letter_spacing_px) * hscale
    }
}

impl Default for HeuristicMeasureHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasureHost for HeuristicMeasureHost {
    type Scratch = HeuristicScratch;

    fn acquire(&self, font: &FontContext, hscale: f32) -> Result<HeuristicScratch, TelopError> {
        if self.detached {
            return Err(TelopError::MeasureSurfaceUnavailable {
                reason: "host has no renderable surface".to_string(),
            });
        }
        Ok(HeuristicScratch {
            host: *self,
            font: font.clone(),
            hscale,
            content: String::new(),
        })
    }
}

/// Scratch surface of [`HeuristicMeasureHost`].
#[derive(Clone, Debug)]
pub struct HeuristicScratch {
    host: HeuristicMeasureHost,
    font: FontContext,
    hscale: f32,
    content: String,
}

impl MeasureScratch for HeuristicScratch {
    fn clear(&mut self) {
        self.content.clear();
    }

    fn set_content(&mut self, html: &str) {
        self.content.push_str(html);
    }

    fn content_width_px(&mut self) -> f32 {
        self.host
            .fragment_width_px(&self.content, &self.font, self.hscale)
    }
}

const RUBY_OPEN: &str = "<ruby>";
const RUBY_CLOSE: &str = "</ruby>";
const RT_OPEN: &str = "<rt>";

fn fragment_em_width(html: &str, ruby_scale: f32) -> (f32, usize) {
    let mut em = 0.0f32;
    let mut glyphs = 0usize;
    let mut rest = html;
    while let Some(start) = rest.find(RUBY_OPEN) {
        let (plain_em, plain_glyphs) = plain_em_width(&rest[..start]);
        em += plain_em;
        glyphs += plain_glyphs;
        let after = &rest[start + RUBY_OPEN.len()..];
        let Some(end) = after.find(RUBY_CLOSE) else {
            rest = after;
            break;
        };
        let inner = &after[..end];
        let (base, reading) = match inner.find(RT_OPEN) {
            Some(idx) => (&inner[..idx], &inner[idx + RT_OPEN.len()..]),
            None => (inner, ""),
        };
        let (base_em, base_glyphs) = plain_em_width(base);
        let (reading_em, _) = plain_em_width(reading);
        em += base_em.max(reading_em * ruby_scale);
        glyphs += base_glyphs;
        rest = &after[end + RUBY_CLOSE.len()..];
    }
    let (tail_em, tail_glyphs) = plain_em_width(rest);
    (em + tail_em, glyphs + tail_glyphs)
}

fn plain_em_width(html: &str) -> (f32, usize) {
    let text = strip_markup(html);
    text.chars()
        .fold((0.0, 0), |(em, n), ch| (em + glyph_em_width(ch), n + 1))
}

fn is_full_width(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x3FFFD
    )
}

fn glyph_em_width(ch: char) -> f32 {
    if is_full_width(ch) {
        return 1.0;
    }
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        '\t' => 1.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        '…' | '‥' | '“' | '”' | '‘' | '’' => 1.0,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::render_unit;
    use std::cell::Cell;
    use std::rc::Rc;

    fn font() -> FontContext {
        FontContext {
            size_px: 40.0,
            ..FontContext::default()
        }
    }

    #[test]
    fn full_width_text_is_one_em_per_glyph() {
        let host = HeuristicMeasureHost::new();
        assert_eq!(host.fragment_width_px("質問です", &font(), 1.0), 160.0);
        assert_eq!(host.fragment_width_px("質問です", &font(), 0.5), 80.0);
    }

    #[test]
    fn ruby_uses_wider_of_base_and_scaled_reading() {
        let host = HeuristicMeasureHost::new();
        let html = render_unit("[東京]{とうきょう}").rendered_html;
        // base 2em, reading 4em * 0.5 = 2em
        assert_eq!(host.fragment_width_px(&html, &font(), 1.0), 80.0);
        let html = render_unit("[東]{とうきょう}").rendered_html;
        assert_eq!(host.fragment_width_px(&html, &font(), 1.0), 80.0);
    }

    #[test]
    fn trailing_punctuation_eats_right_allowance() {
        let oracle = WidthOracle::new(HeuristicMeasureHost::new(), PunctuationConfig::default());
        let sentence = oracle
            .measure_sentence(vec![render_unit("質問です。"), render_unit("「本")], &font())
            .unwrap();
        assert_eq!(sentence.widths(), vec![180.0, 60.0]);
    }

    #[test]
    fn overhang_never_drives_width_negative() {
        let punctuation = PunctuationConfig {
            eat_left_em: 3.0,
            eat_right_em: 3.0,
        };
        let oracle = WidthOracle::new(HeuristicMeasureHost::new(), punctuation);
        for raw in ["。", "「」", "「あ」", "、、、"] {
            let sentence = oracle
                .measure_sentence(vec![render_unit(raw)], &font())
                .unwrap();
            assert!(sentence.widths()[0] >= 0.0, "{}", raw);
        }
    }

    #[test]
    fn detached_host_fails_loudly() {
        let oracle = WidthOracle::new(HeuristicMeasureHost::detached(), PunctuationConfig::default());
        let err = oracle
            .measure_sentence(vec![render_unit("質問")], &font())
            .unwrap_err();
        assert!(matches!(err, TelopError::MeasureSurfaceUnavailable { .. }));
    }

    #[test]
    fn stale_widths_are_rejected() {
        let oracle = WidthOracle::new(HeuristicMeasureHost::new(), PunctuationConfig::default());
        let sentence = oracle
            .measure_sentence(vec![render_unit("質問")], &font())
            .unwrap();
        assert!(sentence.ensure_valid_for(&font()).is_ok());
        let bigger = FontContext {
            size_px: 64.0,
            ..font()
        };
        assert!(matches!(
            sentence.ensure_valid_for(&bigger),
            Err(TelopError::StaleMeasurement { .. })
        ));
    }

    struct CountingHost {
        acquired: Rc<Cell<usize>>,
        hscales: Rc<Cell<f32>>,
    }

    struct CountingScratch {
        content: String,
        dirty_writes: Rc<Cell<usize>>,
    }

    impl MeasureScratch for CountingScratch {
        fn clear(&mut self) {
            self.content.clear();
        }

        fn set_content(&mut self, html: &str) {
            if !self.content.is_empty() {
                self.dirty_writes.set(self.dirty_writes.get() + 1);
            }
            self.content.push_str(html);
        }

        fn content_width_px(&mut self) -> f32 {
            self.content.chars().count() as f32
        }
    }

    impl MeasureHost for CountingHost {
        type Scratch = CountingScratch;

        fn acquire(&self, _font: &FontContext, hscale: f32) -> Result<CountingScratch, TelopError> {
            self.acquired.set(self.acquired.get() + 1);
            self.hscales.set(hscale);
            Ok(CountingScratch {
                content: String::new(),
                dirty_writes: Rc::new(Cell::new(0)),
            })
        }
    }

    #[test]
    fn batch_acquires_once_at_neutral_scale_and_clears_between_units() {
        let acquired = Rc::new(Cell::new(0));
        let hscales = Rc::new(Cell::new(0.0));
        let host = CountingHost {
            acquired: acquired.clone(),
            hscales: hscales.clone(),
        };
        let oracle = WidthOracle::new(host, PunctuationConfig::default());
        let units = vec![render_unit("あ"), render_unit("いい"), render_unit("ううう")];
        let sentence = oracle.measure_sentence(units, &font()).unwrap();
        assert_eq!(acquired.get(), 1);
        assert_eq!(hscales.get(), NEUTRAL_HSCALE);
        assert_eq!(sentence.widths(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn leftover_scratch_content_is_cleared_before_measuring() {
        let dirty = Rc::new(Cell::new(0));
        let mut scratch = CountingScratch {
            content: "leftover".to_string(),
            dirty_writes: dirty.clone(),
        };
        let host = CountingHost {
            acquired: Rc::new(Cell::new(0)),
            hscales: Rc::new(Cell::new(0.0)),
        };
        let width = WidthOracle::new(host, PunctuationConfig::default())
            .measure(&mut scratch, "あい", "あい", &font())
            .unwrap();
        assert_eq!(width, 2.0);
        assert_eq!(dirty.get(), 0);
        assert!(scratch.content.is_empty());
    }
}
