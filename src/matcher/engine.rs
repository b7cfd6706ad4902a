use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::matcher::fuzz::token_set_ratio;
use crate::model::{MatchCandidate, NormalizedProductRecord};

const PROGRESS_EVERY: usize = 200;

/// An enriched catalog row with the identifier it matches under.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub catalog_id: i64,
    pub normalized: NormalizedProductRecord,
}

/// Why a catalog row was not scored against a market record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Brand,
    Unit,
}

/// Brand and quantity/unit are hard filters. A side with no brand (or no
/// quantity) is compatible with anything.
pub fn compatibility(
    market: &NormalizedProductRecord,
    catalog: &NormalizedProductRecord,
) -> Result<(), Rejection> {
    if let (Some(a), Some(b)) = (&market.brand, &catalog.brand) {
        if a != b {
            return Err(Rejection::Brand);
        }
    }
    if let (Some(a), Some(b)) = (&market.udm, &catalog.udm) {
        if a.unit != b.unit || a.quantity != b.quantity {
            return Err(Rejection::Unit);
        }
    }
    Ok(())
}

/// Outcome of scanning the catalog for one market record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    /// Best compatible candidate, accepted or not.
    pub best: Option<MatchCandidate>,
    pub brand_rejections: usize,
    pub unit_rejections: usize,
}

#[derive(Debug, Default)]
pub struct EngineRun {
    /// Accepted candidates in market order.
    pub accepted: Vec<MatchCandidate>,
    pub unmatched: usize,
    pub brand_rejections: usize,
    pub unit_rejections: usize,
}

pub struct MatchEngine {
    threshold: u8,
}

impl MatchEngine {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Greedy best match for one market record. Highest score wins; equal
    /// scores go to the lowest `catalog_id`, then to the earliest row.
    pub fn best_candidate(
        &self,
        market_index: usize,
        market: &NormalizedProductRecord,
        catalog: &[CatalogEntry],
    ) -> Scan {
        let mut scan = Scan::default();
        for entry in catalog {
            match compatibility(market, &entry.normalized) {
                Err(Rejection::Brand) => {
                    scan.brand_rejections += 1;
                    continue;
                }
                Err(Rejection::Unit) => {
                    scan.unit_rejections += 1;
                    continue;
                }
                Ok(()) => {}
            }
            let score = token_set_ratio(&market.normalized_name, &entry.normalized.normalized_name);
            let better = scan.best.is_none_or(|best| {
                score > best.score || (score == best.score && entry.catalog_id < best.catalog_id)
            });
            if better {
                scan.best = Some(MatchCandidate {
                    market_index,
                    catalog_id: entry.catalog_id,
                    score,
                });
            }
        }
        scan
    }

    pub fn accepts(&self, candidate: &MatchCandidate) -> bool {
        candidate.score >= self.threshold
    }

    /// Scans every market record against the read-only catalog in parallel.
    /// The result does not depend on scheduling.
    pub fn run(&self, market: &[NormalizedProductRecord], catalog: &[CatalogEntry]) -> EngineRun {
        let total = market.len();
        let processed = AtomicUsize::new(0);

        let scans: Vec<Scan> = market
            .par_iter()
            .enumerate()
            .map(|(index, record)| {
                let scan = self.best_candidate(index, record, catalog);
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_EVERY == 0 {
                    info!("Matching market records: {}/{}", done, total);
                }
                scan
            })
            .collect();

        let mut run = EngineRun::default();
        for (index, scan) in scans.into_iter().enumerate() {
            run.brand_rejections += scan.brand_rejections;
            run.unit_rejections += scan.unit_rejections;
            match scan.best {
                Some(candidate) if self.accepts(&candidate) => run.accepted.push(candidate),
                best => {
                    debug!(
                        "No match for '{}' (best score {})",
                        market[index].record.name,
                        best.map_or(0, |b| b.score)
                    );
                    run.unmatched += 1;
                }
            }
        }
        run
    }
}
