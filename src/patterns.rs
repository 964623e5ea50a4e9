use regex::Regex;
use std::sync::OnceLock;

const MARKUP_TAG: &str = r"</?[A-Za-z][^<>]*>";
const FALLBACK_DELIMITER: &str =
    r"[\s、。，．,.!?！？「」『』（）()【】〔〕〈〉《》・：；:;…‥〜～]";
const RUBY: &str = r"\[([^\[\]{}]+)\]\{([^\[\]{}]+)\}";
const LEADING_PUNCT: &str = r"^[「『（【〔〈《‘“]+";
const TRAILING_PUNCT: &str = r"[、。，．」』）】〕〉》’”]+$";

/// Characters that may never float alone as a unit.
pub(crate) const PUNCTUATION_CHARS: &str =
    "、。，．,.!?！？「」『』（）()【】〔〕〈〉《》・：；:;…‥〜～ー‐-—―\"'“”‘’";

/// Opening brackets that belong to the unit that follows them.
pub(crate) const OPENING_CHARS: &str = "「『（(【〔〈《‘“";

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            log::error!("pattern {:?} failed to compile: {}", pattern, err);
            None
        }
    })
    .as_ref()
}

pub(crate) fn markup_tag() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, MARKUP_TAG)
}

pub(crate) fn fallback_delimiter() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, FALLBACK_DELIMITER)
}

pub(crate) fn ruby() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, RUBY)
}

pub(crate) fn leading_punct() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, LEADING_PUNCT)
}

pub(crate) fn trailing_punct() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, TRAILING_PUNCT)
}

pub(crate) fn is_punctuation(ch: char) -> bool {
    PUNCTUATION_CHARS.contains(ch)
}

pub(crate) fn is_opening(ch: char) -> bool {
    OPENING_CHARS.contains(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        assert!(markup_tag().is_some());
        assert!(fallback_delimiter().is_some());
        assert!(ruby().is_some());
        assert!(leading_punct().is_some());
        assert!(trailing_punct().is_some());
    }

    #[test]
    fn long_vowel_mark_counts_as_punctuation_but_kana_does_not() {
        assert!(is_punctuation('。'));
        assert!(is_punctuation('ー'));
        assert!(!is_punctuation('あ'));
        assert!(is_opening('「'));
        assert!(!is_opening('」'));
    }

    #[test]
    fn markup_tag_only_matches_tag_syntax() {
        let re = markup_tag().unwrap();
        for tag in ["<b>", "</b>", "<br/>", "<span class=\"x\">"] {
            assert!(re.is_match(tag), "{}", tag);
        }
        for text in ["3<5", "6>4", "3<5 かつ 6>4", "< b >", "<>"] {
            assert!(!re.is_match(text), "{}", text);
        }
    }
}
