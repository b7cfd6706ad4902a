//! Quantity and unit-of-measure extraction.
//!
//! Tiers, first hit wins:
//! 1. number glued to (or one space before) a known unit: `500ml`, `1 kg`
//! 2. numeral-tagged token immediately followed by a unit token
//! 3. unit token with a numeral up to three tokens before it, scanning right to left
//! 4. a count-unit token (`unidad`, `pza`, ...) means one unit
//! 5. one `unidades`

use regex::Regex;
use std::sync::{Arc, LazyLock};

use crate::model::Udm;
use crate::normalizer::fold_diacritics;
use crate::tagger::PosTagger;
use crate::units::{Unit, is_count_variant, is_unit_variant, normalize_unit};

static DIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?)\s*([a-z]{1,5})\b").expect("direct unit pattern is valid")
});

static NUMBER_WITH_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:[.,]\d+)?[a-z]+$").expect("suffix pattern is valid")
});

const PROXIMITY_WINDOW: usize = 3;
const MAX_UNIT_TOKEN_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdmTier {
    Direct,
    Tagged,
    Proximity,
    CountUnit,
    Default,
}

pub struct UdmExtractor {
    tagger: Arc<PosTagger>,
}

fn parse_quantity(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse::<f64>().ok().filter(|q| q.is_finite())
}

/// Splits on whitespace, `/` and `-`, trims a lone trailing period and drops
/// number+unit tokens such as `500ml`, which the direct tier owns.
fn tokenize(folded: &str) -> Vec<String> {
    folded
        .split(|c: char| c.is_whitespace() || c == '/' || c == '-')
        .map(|t| {
            let inner_dots = t.trim_end_matches('.').contains('.');
            if inner_dots { t } else { t.trim_end_matches('.') }
        })
        .filter(|t| !t.is_empty() && !NUMBER_WITH_SUFFIX.is_match(t))
        .map(str::to_string)
        .collect()
}

impl UdmExtractor {
    pub fn new(tagger: Arc<PosTagger>) -> Self {
        Self { tagger }
    }

    pub fn extract_udm(&self, name: &str) -> Udm {
        self.extract_with_tier(name).0
    }

    /// Same as [`UdmExtractor::extract_udm`], also reporting the tier that
    /// produced the answer.
    pub fn extract_with_tier(&self, name: &str) -> (Udm, UdmTier) {
        let folded = fold_diacritics(name);

        if let Some(udm) = direct(&folded) {
            return (udm, UdmTier::Direct);
        }

        let tokens = tokenize(&folded);
        if !tokens.is_empty() {
            let tags = self.tagger.tag(&tokens);

            for i in 0..tokens.len().saturating_sub(1) {
                if tags[i].is_numeral() && is_unit_variant(&tokens[i + 1]) {
                    if let Some(quantity) = parse_quantity(&tokens[i]) {
                        return (Udm::new(quantity, normalize_unit(&tokens[i + 1])), UdmTier::Tagged);
                    }
                }
            }

            for i in (0..tokens.len()).rev() {
                let word = &tokens[i];
                if !is_unit_variant(word) || word.chars().count() > MAX_UNIT_TOKEN_LEN {
                    continue;
                }
                for j in i.saturating_sub(PROXIMITY_WINDOW)..i {
                    if !tags[j].is_numeral() {
                        continue;
                    }
                    if let Some(quantity) = parse_quantity(&tokens[j]) {
                        return (Udm::new(quantity, normalize_unit(word)), UdmTier::Proximity);
                    }
                }
            }

            if let Some(count) = tokens.iter().find(|t| is_count_variant(t)) {
                return (Udm::new(1.0, normalize_unit(count)), UdmTier::CountUnit);
            }
        }

        (Udm::new(1.0, Unit::Unidades), UdmTier::Default)
    }
}

fn direct(folded: &str) -> Option<Udm> {
    DIRECT.captures_iter(folded).find_map(|caps| {
        let unit = caps.get(2)?.as_str();
        if !is_unit_variant(unit) {
            return None;
        }
        let quantity = parse_quantity(caps.get(1)?.as_str())?;
        Some(Udm::new(quantity, normalize_unit(unit)))
    })
}
