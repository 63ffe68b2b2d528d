//! Plate text normalization.
//!
//! Canonicalizes raw OCR text into a comparable plate code: uppercase
//! alphanumeric only, rejecting anything shorter than the configured minimum
//! length. Pure and idempotent - `normalize(normalize(x)) == normalize(x)`.

use regex::Regex;
use std::sync::OnceLock;

/// Separators commonly misread into plate text by OCR engines.
const SEPARATORS: [char; 6] = [' ', '-', '_', '.', '/', '\\'];

static NON_ALNUM_RE: OnceLock<Regex> = OnceLock::new();

fn non_alnum() -> &'static Regex {
    NON_ALNUM_RE.get_or_init(|| Regex::new("[^A-Z0-9]").unwrap())
}

/// Canonicalizes raw OCR output into a plate code.
#[derive(Clone, Copy, Debug)]
pub struct TextNormalizer {
    min_length: usize,
}

impl TextNormalizer {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Canonicalizes `raw` into a plate code.
    ///
    /// Trims whitespace, uppercases, strips separator characters, drops
    /// anything outside `[A-Z0-9]`, and returns the empty string when the
    /// remainder is shorter than the minimum length. The empty string means
    /// "no usable plate text"; callers must never emit it downstream.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let mut text = trimmed.to_uppercase();
        for sep in SEPARATORS {
            text = text.replace(sep, "");
        }
        let text = non_alnum().replace_all(&text, "").into_owned();

        if text.len() < self.min_length {
            return String::new();
        }
        text
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_uppercases() {
        let normalizer = TextNormalizer::new(4);
        assert_eq!(normalizer.normalize(" a-b 1.2/3"), "AB123");
        assert_eq!(normalizer.normalize("ab_12\\34"), "AB1234");
    }

    #[test]
    fn rejects_short_results() {
        let normalizer = TextNormalizer::new(4);
        assert_eq!(normalizer.normalize("ab"), "");
        assert_eq!(normalizer.normalize("a-1"), "");
        assert_eq!(normalizer.normalize("ab12"), "AB12");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        let normalizer = TextNormalizer::new(4);
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   "), "");
        assert_eq!(normalizer.normalize("\t\n"), "");
    }

    #[test]
    fn drops_non_alphanumeric_noise() {
        let normalizer = TextNormalizer::new(4);
        assert_eq!(normalizer.normalize("¡AB•12*34!"), "AB1234");
    }

    #[test]
    fn normalize_is_idempotent() {
        let normalizer = TextNormalizer::new(4);
        for raw in [" a-b 1.2/3", "XYZ987", "ab", "", "  A B C 1 2 3  ", "##--##"] {
            let once = normalizer.normalize(raw);
            assert_eq!(normalizer.normalize(&once), once, "input: {:?}", raw);
        }
    }
}
