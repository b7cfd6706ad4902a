// Per-record enrichment: matching key, brand, quantity/unit and product type.
use rayon::prelude::*;
use tracing::trace;

use crate::classifier::ProductTypeClassifier;
use crate::lexicon::Lexicon;
use crate::model::{NormalizedProductRecord, RawProductRecord, Udm};
use crate::normalizer::{clean_text, matching_key};
use crate::udm::UdmExtractor;

pub struct Enricher {
    lexicon: Lexicon,
    udm: UdmExtractor,
    classifier: ProductTypeClassifier,
}

impl Enricher {
    pub fn new(lexicon: Lexicon) -> Self {
        let udm = UdmExtractor::new(lexicon.tagger.clone());
        let classifier = ProductTypeClassifier::new(lexicon.tagger.clone());
        Self {
            lexicon,
            udm,
            classifier,
        }
    }

    pub fn extract_brand(&self, name: &str) -> Option<String> {
        self.lexicon.gazetteer.extract(name).map(str::to_string)
    }

    /// A name with no text left after cleaning has no quantity at all.
    pub fn extract_udm(&self, name: &str) -> Option<Udm> {
        if clean_text(name).trim().is_empty() {
            return None;
        }
        let (udm, tier) = self.udm.extract_with_tier(name);
        trace!("'{}': {} {} ({:?})", name, udm.quantity, udm.unit, tier);
        Some(udm)
    }

    pub fn normalize(&self, record: &RawProductRecord) -> NormalizedProductRecord {
        let name = record.name.as_str();
        NormalizedProductRecord {
            record: record.clone(),
            normalized_name: matching_key(name, &self.lexicon.stop_words),
            brand: self.extract_brand(name),
            udm: self.extract_udm(name),
            product_type: self.classifier.classify_type(name),
        }
    }

    /// Order-preserving, parallel over records.
    pub fn normalize_all(&self, records: &[RawProductRecord]) -> Vec<NormalizedProductRecord> {
        records.par_iter().map(|r| self.normalize(r)).collect()
    }
}
