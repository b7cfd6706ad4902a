//! Product type as the leading noun phrase of a listing name.

use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::normalizer::fold_diacritics;
use crate::tagger::{PosTagger, Tag};

static QUANTITY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:[.,]\d+)?[a-z]*$").expect("quantity token pattern is valid")
});

/// Tokens that end the phrase: they introduce a size or a count.
const UNIT_STOPS: &[&str] = &[
    "gr", "kg", "lt", "ml", "g", "und", "u", "hj", "h", "rll", "r", "s", "cc", "x", "xl",
];

const PREPOSITIONS: &[&str] = &["de", "con", "para", "y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Noun,
    Adjective,
    Preposition,
}

pub struct ProductTypeClassifier {
    tagger: Arc<PosTagger>,
}

impl ProductTypeClassifier {
    pub fn new(tagger: Arc<PosTagger>) -> Self {
        Self { tagger }
    }

    /// Lowercased, diacritic-free tokens with quantities removed. Dotted
    /// abbreviations such as `p.a.n.` stay whole; `kg.` becomes `kg`.
    pub fn tokenize(name: &str) -> Vec<String> {
        fold_diacritics(name)
            .split(|c: char| c.is_whitespace() || c == '/')
            .map(|t| t.trim_end_matches([',', ';', ':']))
            .map(|t| {
                let stem = t.trim_end_matches('.');
                if stem.contains('.') { t } else { stem }
            })
            .filter(|t| t.chars().any(char::is_alphanumeric) && !QUANTITY_TOKEN.is_match(t))
            .map(str::to_string)
            .collect()
    }

    pub fn classify_type(&self, name: &str) -> String {
        let tokens = Self::tokenize(name);
        if tokens.is_empty() {
            return String::new();
        }
        let tags = self.tagger.tag(&tokens);
        noun_phrase(&tokens, &tags).join(" ")
    }
}

fn noun_phrase<'a>(tokens: &'a [String], tags: &[Tag]) -> Vec<&'a str> {
    let mut phrase: Vec<&str> = Vec::new();
    let mut last: Option<Slot> = None;

    for (token, tag) in tokens.iter().zip(tags) {
        let word = token.as_str();
        if UNIT_STOPS.contains(&word) || tag.is_numeral() {
            break;
        }
        let next = match last {
            None if tag.is_noun() => Slot::Noun,
            None => continue,
            Some(Slot::Noun) if PREPOSITIONS.contains(&word) => Slot::Preposition,
            Some(Slot::Noun) if tag.is_adjective() => Slot::Adjective,
            Some(Slot::Preposition) if tag.is_noun() || tag.is_adjective() => Slot::Noun,
            Some(_) => break,
        };
        phrase.push(word);
        last = Some(next);
    }

    if last == Some(Slot::Preposition) {
        phrase.pop();
    }
    phrase
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;

    fn classifier() -> ProductTypeClassifier {
        ProductTypeClassifier::new(Lexicon::embedded().unwrap().tagger)
    }

    #[test]
    fn test_noun_with_prepositional_complement_and_adjective() {
        let c = classifier();
        assert_eq!(
            c.classify_type("Harina de Maíz Blanca Precocida 1kg"),
            "harina de maiz blanca"
        );
        assert_eq!(c.classify_type("Aceite de Girasol 1L"), "aceite de girasol");
        assert_eq!(c.classify_type("Café molido 250 gr"), "cafe molido");
    }

    #[test]
    fn test_second_adjective_stops_phrase() {
        let c = classifier();
        assert_eq!(c.classify_type("Aceite vegetal refinado 1L"), "aceite vegetal");
        assert_eq!(c.classify_type("arroz blanco"), "arroz blanco");
    }

    #[test]
    fn test_unknown_preposition_stops_phrase() {
        assert_eq!(classifier().classify_type("Leche Completa en Polvo 900g"), "leche completa");
    }

    #[test]
    fn test_dangling_preposition_is_dropped() {
        let c = classifier();
        assert_eq!(c.classify_type("Salsa de 500ml"), "salsa");
        assert_eq!(c.classify_type("Jabón para lavar"), "jabon");
    }

    #[test]
    fn test_leading_non_nouns_are_skipped() {
        let c = classifier();
        assert_eq!(c.classify_type("el arroz blanco"), "arroz blanco");
        assert_eq!(c.classify_type("blanca harina"), "harina");
    }

    #[test]
    fn test_unit_token_stops_phrase() {
        assert_eq!(
            classifier().classify_type("Galletas de Chocolate x 12 Unidades"),
            "galletas de chocolate"
        );
    }

    #[test]
    fn test_no_phrase_is_empty() {
        let c = classifier();
        assert_eq!(c.classify_type(""), "");
        assert_eq!(c.classify_type("500g 1kg"), "");
    }

    #[test]
    fn test_tokenize_keeps_abbreviations() {
        assert_eq!(
            ProductTypeClassifier::tokenize("Harina P.A.N. 1Kg. blanca/amarilla 2 kg."),
            vec!["harina", "p.a.n.", "blanca", "amarilla", "kg"]
        );
    }
}
