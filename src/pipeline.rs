// Pipeline orchestration: enrich, match, pivot, join.
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

use crate::enricher::Enricher;
use crate::lexicon::Lexicon;
use crate::matcher::features::mean;
use crate::matcher::{CatalogEntry, MatchEngine, build_feature_table};
use crate::model::{
    CatalogRecord, MatchOutput, MatchResult, MatchStats, NormalizedProductRecord, PipelineError,
    RawProductRecord,
};

pub struct ProductPipeline {
    enricher: Enricher,
    engine: MatchEngine,
}

impl ProductPipeline {
    pub fn new(lexicon: Lexicon, threshold: u8) -> Self {
        Self {
            enricher: Enricher::new(lexicon),
            engine: MatchEngine::new(threshold),
        }
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    pub fn enrich_catalog(&self, catalog: &[CatalogRecord]) -> Vec<CatalogEntry> {
        catalog
            .par_iter()
            .map(|row| CatalogEntry {
                catalog_id: row.catalog_id,
                normalized: self.enricher.normalize(&row.product),
            })
            .collect()
    }

    /// Full run from raw records. Deterministic for a given input.
    pub fn match_records(
        &self,
        market: &[RawProductRecord],
        catalog: &[CatalogRecord],
    ) -> Result<MatchOutput, PipelineError> {
        let market = self.enricher.normalize_all(market);
        self.match_normalized(&market, catalog)
    }

    /// Same as [`ProductPipeline::match_records`] for market records that
    /// were already enriched.
    pub fn match_normalized(
        &self,
        market: &[NormalizedProductRecord],
        catalog: &[CatalogRecord],
    ) -> Result<MatchOutput, PipelineError> {
        info!(
            "Matching {} market records against {} catalog rows (threshold {})",
            market.len(),
            catalog.len(),
            self.engine.threshold()
        );
        let entries = self.enrich_catalog(catalog);
        let run = self.engine.run(market, &entries);

        if run.accepted.is_empty() {
            return Err(PipelineError::NoMatches {
                market: market.len(),
                catalog: catalog.len(),
            });
        }

        let matches: Vec<MatchResult> = run
            .accepted
            .iter()
            .map(|c| {
                let record = &market[c.market_index].record;
                MatchResult {
                    catalog_id: c.catalog_id,
                    source_id: record.source_id.clone(),
                    market_name: record.name.clone(),
                    market_price: record.comparable_price(),
                    score: c.score,
                }
            })
            .collect();
        info!("Matching done: {} matches", matches.len());

        let features = build_feature_table(&matches, catalog);
        if features.is_empty() {
            return Err(PipelineError::EmptyFeatureTable {
                matches: matches.len(),
            });
        }

        let mut per_vendor: BTreeMap<String, usize> = BTreeMap::new();
        for m in &matches {
            *per_vendor.entry(m.source_id.clone()).or_default() += 1;
        }
        let stats = MatchStats {
            market_records: market.len(),
            catalog_records: catalog.len(),
            accepted: matches.len(),
            unmatched: run.unmatched,
            brand_rejections: run.brand_rejections,
            unit_rejections: run.unit_rejections,
            mean_score: mean(matches.iter().map(|m| f64::from(m.score))),
            per_vendor,
        };
        info!(
            "Stats: {} accepted, {} unmatched, {} brand / {} unit rejections, mean score {:.1}",
            stats.accepted,
            stats.unmatched,
            stats.brand_rejections,
            stats.unit_rejections,
            stats.mean_score
        );
        info!("Feature table: {} rows, vendors {:?}", features.rows.len(), features.vendors);

        Ok(MatchOutput {
            matches,
            features,
            stats,
        })
    }
}
