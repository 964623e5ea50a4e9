//! Conversion of segmentation units into displayable HTML fragments.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::patterns;

/// Marker class wrapped around leading (opening) punctuation.
pub const PUNCT_LEAD_CLASS: &str = "punct-l";
/// Marker class wrapped around trailing (closing) punctuation.
pub const PUNCT_TRAIL_CLASS: &str = "punct-r";

/// Indivisible rendering atom produced by the tokenizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentUnit {
    /// Source substring, ruby markup included.
    pub raw_text: String,
    /// Escaped, ruby-expanded, punctuation-marked fragment.
    pub rendered_html: String,
}

impl SegmentUnit {
    pub fn punctuation(&self) -> PunctuationClass {
        PunctuationClass::of(&self.raw_text)
    }
}

/// Which edges of a raw unit carry full-width punctuation overhang.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PunctuationClass {
    pub leading: bool,
    pub trailing: bool,
}

impl PunctuationClass {
    /// Classify raw (unescaped, unexpanded) unit text.
    pub fn of(raw: &str) -> Self {
        Self {
            leading: leading_run(raw).is_some(),
            trailing: trailing_run(raw).is_some(),
        }
    }
}

fn leading_run(raw: &str) -> Option<&str> {
    patterns::leading_punct()
        .and_then(|re| re.find(raw))
        .map(|m| m.as_str())
}

fn trailing_run(raw: &str) -> Option<&str> {
    patterns::trailing_punct()
        .and_then(|re| re.find(raw))
        .map(|m| m.as_str())
}

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    htmlize::escape_all_quotes(text)
}

/// Expand `[base]{reading}` into `<ruby>` markup.
///
/// Input must already be escaped. Unmatched brackets stay literal.
pub fn expand_ruby(escaped: &str) -> Cow<'_, str> {
    match patterns::ruby() {
        Some(re) => re.replace_all(escaped, "<ruby>${1}<rt>${2}</rt></ruby>"),
        None => Cow::Borrowed(escaped),
    }
}

/// Build the display fragment for one raw unit.
pub fn render_unit(raw: &str) -> SegmentUnit {
    let escaped = escape_html(raw);
    let mut html = expand_ruby(&escaped).into_owned();

    if let Some(run) = trailing_run(raw) {
        if html.ends_with(run) {
            let body_len = html.len() - run.len();
            html = format!(
                "{}<span class=\"{}\">{}</span>",
                &html[..body_len],
                PUNCT_TRAIL_CLASS,
                run
            );
        }
    }
    if let Some(run) = leading_run(raw) {
        if html.starts_with(run) {
            html = format!(
                "<span class=\"{}\">{}</span>{}",
                PUNCT_LEAD_CLASS,
                run,
                &html[run.len()..]
            );
        }
    }

    SegmentUnit {
        raw_text: raw.to_string(),
        rendered_html: html,
    }
}
