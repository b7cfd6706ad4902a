// Text normalization shared by every extractor and by the matching key.
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

static SYMBOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\s.]").expect("symbol pattern is valid")
});

const EMOJI_RANGES: &[(char, char)] = &[
    ('\u{1F300}', '\u{1F5FF}'),
    ('\u{1F600}', '\u{1F64F}'),
    ('\u{1F680}', '\u{1F6FF}'),
    ('\u{1F900}', '\u{1F9FF}'),
    ('\u{2600}', '\u{27BF}'),
];

fn is_emoji(c: char) -> bool {
    EMOJI_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&c))
}

pub fn remove_emojis(text: &str) -> String {
    text.chars().filter(|c| !is_emoji(*c)).collect()
}

/// NFD + combining-mark removal + lowercase. Punctuation is left alone.
pub fn fold_diacritics(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Emoji removal, diacritic folding, symbol stripping (periods survive) and
/// lowercasing. Idempotent.
pub fn clean_text(text: &str) -> String {
    let folded = fold_diacritics(&remove_emojis(text));
    SYMBOLS.replace_all(&folded, "").to_lowercase()
}

/// Tokens dropped before the token bag is built.
#[derive(Debug, Clone, Default)]
pub struct StopWordSet {
    words: HashSet<String>,
}

impl StopWordSet {
    /// Each word goes through [`clean_text`] so it compares against cleaned
    /// tokens.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| clean_text(w.as_ref()).trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Cleaned, stop-word free, alphabetically sorted token bag.
pub fn matching_key(name: &str, stop_words: &StopWordSet) -> String {
    let cleaned = clean_text(name);
    let mut tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|t| !stop_words.contains(t))
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_words() -> StopWordSet {
        StopWordSet::new(["de", "la", "el", "con", "p/r", "botella"])
    }

    #[test]
    fn test_clean_text_folds_and_strips() {
        assert_eq!(clean_text("Café Molido ÑAME, 250g!"), "cafe molido name 250g");
        assert_eq!(clean_text("Harina P.A.N. 1Kg"), "harina p.a.n. 1kg");
        assert_eq!(clean_text("Galletas 🍪 Oreo 😀"), "galletas  oreo ");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        for raw in ["Jamón Endiablado Plumrose™", "ACEITE   de Girasol 1,5L", "Coca-Cola 2L"] {
            let once = clean_text(raw);
            assert_eq!(clean_text(&once), once);
        }
    }

    #[test]
    fn test_matching_key_sorts_and_drops_stop_words() {
        let stops = stop_words();
        assert_eq!(matching_key("Aceite de Girasol 1L", &stops), "1l aceite girasol");
        assert_eq!(matching_key("Girasol aceite 1L", &stops), "1l aceite girasol");
    }

    #[test]
    fn test_matching_key_is_idempotent() {
        let stops = stop_words();
        for raw in ["Harina P.A.N. Blanca 1Kg", "Ron   Añejo de la Casa 🍹 0,75L", ""] {
            let key = matching_key(raw, &stops);
            assert_eq!(matching_key(&key, &stops), key);
        }
    }

    #[test]
    fn test_matching_key_ignores_word_order() {
        let stops = stop_words();
        let tokens = ["salsa", "tomate", "napolitana", "500g", "de"];
        let base = matching_key(&tokens.join(" "), &stops);
        let mut rotated = tokens.to_vec();
        rotated.rotate_left(2);
        assert_eq!(matching_key(&rotated.join(" "), &stops), base);
        rotated.reverse();
        assert_eq!(matching_key(&rotated.join(" "), &stops), base);
    }

    #[test]
    fn test_stop_words_are_cleaned() {
        let stops = stop_words();
        assert!(stops.contains("pr"));
        assert!(!stops.contains("p/r"));
        assert_eq!(stops.len(), 6);
    }
}
