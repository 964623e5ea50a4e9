//! Sentence segmentation into ruby-aware, particle-attached rendering units.

use std::borrow::Cow;

use crate::markup::{render_unit, SegmentUnit};
use crate::patterns;

/// Locale handed to the word segmenter.
pub const DEFAULT_LOCALE: &str = "ja";

/// Particles and auxiliaries that never open a unit of their own.
pub const PARTICLES: &[&str] = &[
    "は", "が", "を", "に", "で", "と", "の", "へ", "や", "も", "から", "まで", "より", "だ", "です",
    "ます", "ね", "よ", "か", "ぞ", "ぜ", "さ", "な", "ない", "たい", "った", "って", "でしょう",
    "でした", "だった",
];

/// Locale-aware word boundary provider.
pub trait WordSegmenter {
    /// Split `text` into ordered word-level substrings.
    fn segment(&self, text: &str, locale: &str) -> Vec<String>;
}

/// Dictionary-backed Japanese word segmentation from ICU4X.
#[cfg(feature = "icu")]
#[derive(Debug)]
pub struct IcuWordSegmenter {
    inner: icu_segmenter::WordSegmenter,
}

#[cfg(feature = "icu")]
impl IcuWordSegmenter {
    pub fn new() -> Self {
        Self {
            inner: icu_segmenter::WordSegmenter::new_dictionary(),
        }
    }
}

#[cfg(feature = "icu")]
impl Default for IcuWordSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "icu")]
impl WordSegmenter for IcuWordSegmenter {
    fn segment(&self, text: &str, _locale: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut last = 0usize;
        for breakpoint in self.inner.segment_str(text) {
            if breakpoint > last {
                out.push(text[last..breakpoint].to_string());
            }
            last = breakpoint;
        }
        if last < text.len() {
            out.push(text[last..].to_string());
        }
        out
    }
}

/// Splits raw sentences into [`SegmentUnit`]s.
pub struct Tokenizer {
    segmenter: Option<Box<dyn WordSegmenter>>,
    locale: String,
}

impl core::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("has_segmenter", &self.segmenter.is_some())
            .field("locale", &self.locale)
            .finish()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Tokenizer using the best segmenter compiled into this build.
    pub fn new() -> Self {
        #[cfg(feature = "icu")]
        {
            Self::with_segmenter(Some(Box::new(IcuWordSegmenter::new())))
        }
        #[cfg(not(feature = "icu"))]
        {
            Self::with_segmenter(None)
        }
    }

    /// Tokenizer that always uses the delimiter-regex fallback.
    pub fn fallback_only() -> Self {
        Self::with_segmenter(None)
    }

    /// Tokenizer with an explicit segmenter; `None` selects the regex fallback.
    pub fn with_segmenter(segmenter: Option<Box<dyn WordSegmenter>>) -> Self {
        if segmenter.is_none() {
            log::debug!("word segmenter unavailable; using delimiter fallback");
        }
        Self {
            segmenter,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn has_segmenter(&self) -> bool {
        self.segmenter.is_some()
    }

    /// Tokenize and render a sentence.
    pub fn tokenize(&self, sentence: &str) -> Vec<SegmentUnit> {
        self.split_units(sentence)
            .iter()
            .map(|raw| render_unit(raw))
            .collect()
    }

    /// Raw unit texts, before rendering.
    pub fn split_units(&self, sentence: &str) -> Vec<String> {
        let plain = strip_markup(sentence);
        if plain.trim().is_empty() {
            return Vec::new();
        }
        let words = match self.segmenter.as_deref() {
            Some(segmenter) => segmenter.segment(&plain, &self.locale),
            None => fallback_split(&plain),
        };
        attach_units(merge_ruby(isolate_ruby_edges(words)))
    }
}

/// Remove tags and decode entities from upstream HTML.
pub fn strip_markup(text: &str) -> Cow<'_, str> {
    let stripped = match patterns::markup_tag() {
        Some(re) => re.replace_all(text, ""),
        None => Cow::Borrowed(text),
    };
    htmlize::unescape(stripped)
}

fn fallback_split(text: &str) -> Vec<String> {
    let Some(re) = patterns::fallback_delimiter() else {
        return vec![text.to_string()];
    };
    let mut out = Vec::new();
    let mut last = 0usize;
    for m in re.find_iter(text) {
        if m.start() > last {
            out.push(text[last..m.start()].to_string());
        }
        out.push(m.as_str().to_string());
        last = m.end();
    }
    if last < text.len() {
        out.push(text[last..].to_string());
    }
    out
}

// Every `[` opens a token and every `}` closes one, whatever the segmenter did.
fn isolate_ruby_edges(words: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(words.len());
    for word in words {
        if !word.contains(['[', '}']) {
            out.push(word);
            continue;
        }
        let mut current = String::new();
        for ch in word.chars() {
            match ch {
                '[' => {
                    if !current.is_empty() {
                        out.push(core::mem::take(&mut current));
                    }
                    current.push(ch);
                }
                '}' => {
                    current.push(ch);
                    out.push(core::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

fn merge_ruby(words: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(words.len());
    let mut buffer: Option<String> = None;
    for word in words {
        if let Some(buf) = buffer.as_mut() {
            buf.push_str(&word);
            if word.contains('}') {
                out.extend(buffer.take());
            }
            continue;
        }
        if word.starts_with('[') && !word.contains('}') {
            buffer = Some(word);
        } else {
            out.push(word);
        }
    }
    // Unterminated annotation: keep it as one trailing unit.
    out.extend(buffer);
    out
}

fn is_particle(word: &str) -> bool {
    PARTICLES.contains(&word)
}

fn is_punctuation_only(word: &str) -> bool {
    word.chars().all(patterns::is_punctuation)
}

fn is_opening_only(word: &str) -> bool {
    word.chars().all(patterns::is_opening)
}

fn attach_units(words: Vec<String>) -> Vec<String> {
    let mut units: Vec<String> = Vec::with_capacity(words.len());
    // Opening brackets, or particles that trail a ruby unit, waiting for the next word.
    let mut pending = String::new();
    // Ruby units keep their raw text intact against particle attachment.
    let mut last_is_ruby = false;
    // `pending` holds only particles trailing a ruby unit.
    let mut pending_particles = false;

    for word in words {
        if word.trim().is_empty() {
            continue;
        }
        if pending_particles {
            if is_particle(&word) {
                pending.push_str(&word);
                continue;
            }
            if is_punctuation_only(&word) && !is_opening_only(&word) {
                // Particles never open a unit: they fall back onto the ruby unit.
                if let Some(last) = units.last_mut() {
                    last.push_str(&pending);
                    last.push_str(&word);
                    pending.clear();
                    pending_particles = false;
                    continue;
                }
            }
        }
        if is_opening_only(&word) {
            if pending_particles {
                if let Some(last) = units.last_mut() {
                    last.push_str(&pending);
                    pending.clear();
                }
                pending_particles = false;
            }
            pending.push_str(&word);
            continue;
        }
        let ruby = word.starts_with('[');
        if pending.is_empty() && !ruby {
            if let Some(last) = units.last_mut() {
                if is_punctuation_only(&word) {
                    last.push_str(&word);
                    continue;
                }
                if is_particle(&word) {
                    if last_is_ruby {
                        pending.push_str(&word);
                        pending_particles = true;
                    } else {
                        last.push_str(&word);
                    }
                    continue;
                }
            }
        }
        let mut unit = core::mem::take(&mut pending);
        unit.push_str(&word);
        units.push(unit);
        last_is_ruby = ruby;
        pending_particles = false;
    }

    if !pending.is_empty() {
        match units.last_mut() {
            Some(last) => last.push_str(&pending),
            None => units.push(pending),
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SplitOn(&'static [&'static str]);

    impl WordSegmenter for SplitOn {
        fn segment(&self, _text: &str, _locale: &str) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    fn scripted(words: &'static [&'static str]) -> Tokenizer {
        Tokenizer::with_segmenter(Some(Box::new(SplitOn(words))))
    }

    #[test]
    fn empty_and_blank_input_yield_no_units() {
        let tokenizer = Tokenizer::fallback_only();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("   \u{3000} ").is_empty());
        assert!(tokenizer.tokenize("<br/>").is_empty());
    }

    #[test]
    fn particles_and_punctuation_attach_backward() {
        let tokenizer = scripted(&["これ", "は", "質問", "です", "。"]);
        assert_eq!(
            tokenizer.split_units("これは質問です。"),
            vec!["これは", "質問です。"]
        );
    }

    #[test]
    fn ruby_pieces_from_segmenter_are_reassembled() {
        let tokenizer = scripted(&["[", "東京", "]{", "とう", "きょう", "}", "に", "行く"]);
        assert_eq!(
            tokenizer.split_units("[東京]{とうきょう}に行く"),
            vec!["[東京]{とうきょう}", "に行く"]
        );
    }

    #[test]
    fn fallback_isolates_ruby_from_adjacent_text() {
        let tokenizer = Tokenizer::fallback_only();
        let units = tokenizer.split_units("[東京]{とうきょう}に行く");
        assert_eq!(units, vec!["[東京]{とうきょう}", "に行く"]);
    }

    #[test]
    fn unterminated_ruby_is_flushed_not_dropped() {
        let tokenizer = scripted(&["今日", "[", "東京", "]{", "とう"]);
        assert_eq!(
            tokenizer.split_units("今日[東京]{とう"),
            vec!["今日", "[東京]{とう"]
        );
    }

    #[test]
    fn punctuation_after_ruby_still_attaches() {
        let tokenizer = scripted(&["[東京]{とうきょう}", "。"]);
        assert_eq!(
            tokenizer.split_units("[東京]{とうきょう}。"),
            vec!["[東京]{とうきょう}。"]
        );
    }

    #[test]
    fn particle_before_punctuation_falls_back_onto_ruby() {
        let tokenizer = scripted(&["[東京]{とうきょう}", "です", "。"]);
        assert_eq!(
            tokenizer.split_units("[東京]{とうきょう}です。"),
            vec!["[東京]{とうきょう}です。"]
        );

        let units =
            Tokenizer::fallback_only().split_units("[東京]{とうきょう}は、[大阪]{おおさか}です。");
        assert_eq!(
            units,
            vec!["[東京]{とうきょう}は、", "[大阪]{おおさか}です。"]
        );
    }

    #[test]
    fn consecutive_particles_after_ruby_stay_together() {
        let tokenizer = scripted(&["[東京]{とうきょう}", "で", "は", "雨", "。"]);
        assert_eq!(
            tokenizer.split_units("[東京]{とうきょう}では雨。"),
            vec!["[東京]{とうきょう}", "では雨。"]
        );

        let tokenizer = scripted(&["[東京]{とうきょう}", "で", "は", "！"]);
        assert_eq!(
            tokenizer.split_units("[東京]{とうきょう}では！"),
            vec!["[東京]{とうきょう}では！"]
        );
    }

    #[test]
    fn particle_after_ruby_never_leads_a_bracketed_unit() {
        let tokenizer = scripted(&["[東京]{とうきょう}", "と", "「", "大阪", "」"]);
        assert_eq!(
            tokenizer.split_units("[東京]{とうきょう}と「大阪」"),
            vec!["[東京]{とうきょう}と", "「大阪」"]
        );
    }

    #[test]
    fn opening_brackets_attach_forward() {
        let tokenizer = scripted(&["彼", "は", "「", "こんにちは", "」", "と", "言った"]);
        assert_eq!(
            tokenizer.split_units("彼は「こんにちは」と言った"),
            vec!["彼は", "「こんにちは」と", "言った"]
        );
    }

    #[test]
    fn punctuation_only_sentence_keeps_a_leading_unit() {
        let tokenizer = scripted(&["。", "。", "！"]);
        assert_eq!(tokenizer.split_units("。。！"), vec!["。。！"]);
    }

    #[test]
    fn leading_particle_without_predecessor_stands_alone() {
        let tokenizer = scripted(&["は", "い"]);
        assert_eq!(tokenizer.split_units("はい"), vec!["は", "い"]);
    }

    #[test]
    fn whitespace_tokens_are_dropped() {
        let tokenizer = Tokenizer::fallback_only();
        assert_eq!(
            tokenizer.split_units("ラジオ　番組"),
            vec!["ラジオ", "番組"]
        );
    }

    #[test]
    fn upstream_markup_is_stripped_and_entities_decoded() {
        assert_eq!(strip_markup("<b>質問</b>&amp;回答"), "質問&回答");
        let units = Tokenizer::fallback_only().tokenize("<p>A&amp;B</p>");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].raw_text, "A&B");
        assert_eq!(units[0].rendered_html, "A&amp;B");
    }

    #[test]
    fn bare_comparison_signs_are_not_markup() {
        assert_eq!(strip_markup("3<5 かつ 6>4 ですか"), "3<5 かつ 6>4 ですか");

        let units = Tokenizer::fallback_only().tokenize("3<5 かつ 6>4");
        let raw: Vec<&str> = units.iter().map(|u| u.raw_text.as_str()).collect();
        assert_eq!(raw, vec!["3<5", "かつ", "6>4"]);
        assert_eq!(raw.concat(), "3<5かつ6>4");
        assert_eq!(units[0].rendered_html, "3&lt;5");
        assert_eq!(units[2].rendered_html, "6&gt;4");
    }

    #[cfg(feature = "icu")]
    #[test]
    fn icu_segmentation_never_floats_particles() {
        let tokenizer = Tokenizer::new();
        assert!(tokenizer.has_segmenter());
        let units = tokenizer.split_units("これは質問です。");
        assert!(!units.is_empty());
        for banned in ["は", "です", "。"] {
            assert!(!units.iter().any(|u| u == banned), "{:?}", units);
        }
        assert_eq!(units.concat(), "これは質問です。");
    }

    #[cfg(feature = "icu")]
    #[test]
    fn icu_segmentation_keeps_ruby_atomic() {
        let units = Tokenizer::new().tokenize("[東京]{とうきょう}に行く");
        assert_eq!(units[0].raw_text, "[東京]{とうきょう}");
        assert!(units[0]
            .rendered_html
            .contains("<ruby>東京<rt>とうきょう</rt></ruby>"));
    }
}
