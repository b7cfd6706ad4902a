// Pivot of accepted matches joined with the aggregated internal catalog.
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::model::{CatalogRecord, COMPETITOR_COLUMNS, FeatureRow, FeatureTable, MatchResult};

/// Running sum and count for a mean.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let mut acc = Mean::default();
    values.into_iter().for_each(|v| acc.push(v));
    acc.value()
}

struct CatalogAggregate {
    name: String,
    profit_sum: f64,
    price: Mean,
}

/// First name, summed profit and mean comparable price per `catalog_id`.
fn aggregate_catalog(catalog: &[CatalogRecord]) -> BTreeMap<i64, CatalogAggregate> {
    let mut aggregates: BTreeMap<i64, CatalogAggregate> = BTreeMap::new();
    for row in catalog {
        let agg = aggregates.entry(row.catalog_id).or_insert_with(|| CatalogAggregate {
            name: row.product.name.clone(),
            profit_sum: 0.0,
            price: Mean::default(),
        });
        agg.profit_sum += row.profit;
        agg.price.push(row.product.comparable_price());
    }
    aggregates
}

/// Vendors sorted by `source_id`; only the first [`COMPETITOR_COLUMNS`] get
/// a column.
pub fn competitor_vendors(matches: &[MatchResult]) -> Vec<String> {
    let all: BTreeSet<&str> = matches.iter().map(|m| m.source_id.as_str()).collect();
    if all.len() > COMPETITOR_COLUMNS {
        let dropped: Vec<&str> = all.iter().skip(COMPETITOR_COLUMNS).copied().collect();
        warn!(
            "{} vendors matched, only {} competitor columns; dropping {:?}",
            all.len(),
            COMPETITOR_COLUMNS,
            dropped
        );
    }
    all.into_iter().take(COMPETITOR_COLUMNS).map(str::to_string).collect()
}

/// Mean matched price per (catalog_id, vendor column).
fn pivot(matches: &[MatchResult], vendors: &[String]) -> BTreeMap<i64, [Mean; COMPETITOR_COLUMNS]> {
    let mut table: BTreeMap<i64, [Mean; COMPETITOR_COLUMNS]> = BTreeMap::new();
    for m in matches {
        let Some(column) = vendors.iter().position(|v| *v == m.source_id) else {
            continue;
        };
        table.entry(m.catalog_id).or_default()[column].push(m.market_price);
    }
    table
}

/// Inner join of the competitor pivot with the catalog aggregate, ordered by
/// `catalog_id`. Missing competitor prices are 0.
pub fn build_feature_table(matches: &[MatchResult], catalog: &[CatalogRecord]) -> FeatureTable {
    let vendors = competitor_vendors(matches);
    let pivot = pivot(matches, &vendors);
    let aggregates = aggregate_catalog(catalog);

    let rows = pivot
        .into_iter()
        .filter_map(|(catalog_id, columns)| {
            let agg = aggregates.get(&catalog_id)?;
            Some(FeatureRow {
                catalog_id,
                name: agg.name.clone(),
                profit_sum: agg.profit_sum,
                mean_price: agg.price.value(),
                competitor_prices: columns.map(|c| c.value()),
            })
        })
        .collect();

    FeatureTable { vendors, rows }
}
