// Core structs: records, enrichment results, matches, feature table, errors
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::units::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Ves,
    /// Legacy bolívar listings, published in cents.
    Bsd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Ves => "VES",
            Currency::Bsd => "BSD",
        }
    }

    /// Price in the unit used for comparison across sources.
    pub fn comparable_price(&self, price: f64) -> f64 {
        match self {
            Currency::Bsd => price / 100.0,
            Currency::Usd | Currency::Ves => price,
        }
    }
}

impl FromStr for Currency {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" | "$" => Ok(Currency::Usd),
            "VES" => Ok(Currency::Ves),
            "BS" | "BS." | "BSD" => Ok(Currency::Bsd),
            other => Err(SourceError::UnknownCurrency(other.to_string())),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A listing as produced by a scraper or by the internal catalog export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProductRecord {
    pub name: String,
    pub price: f64,
    pub currency: Currency,
    pub source_id: String,
    pub url: String,
    pub captured_at: DateTime<Utc>,
}

impl RawProductRecord {
    pub fn comparable_price(&self) -> f64 {
        self.currency.comparable_price(self.price)
    }
}

/// One row of the internal catalog. Several rows may share a `catalog_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    pub catalog_id: i64,
    pub product: RawProductRecord,
    pub profit: f64,
}

/// Quantity and canonical unit extracted from a product name.
#[derive(Debug, Clone, PartialEq)]
pub struct Udm {
    pub quantity: f64,
    pub unit: Unit,
}

impl Udm {
    pub fn new(quantity: f64, unit: Unit) -> Self {
        Self { quantity, unit }
    }
}

/// Derived view of a raw record. Re-derive it instead of patching it.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProductRecord {
    pub record: RawProductRecord,
    pub normalized_name: String,
    pub brand: Option<String>,
    pub udm: Option<Udm>,
    pub product_type: String,
}

impl NormalizedProductRecord {
    pub fn quantity(&self) -> Option<f64> {
        self.udm.as_ref().map(|u| u.quantity)
    }

    pub fn unit(&self) -> Option<&Unit> {
        self.udm.as_ref().map(|u| &u.unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate {
    pub market_index: usize,
    pub catalog_id: i64,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub catalog_id: i64,
    pub source_id: String,
    pub market_name: String,
    pub market_price: f64,
    pub score: u8,
}

pub const COMPETITOR_COLUMNS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub catalog_id: i64,
    pub name: String,
    pub profit_sum: f64,
    pub mean_price: f64,
    pub competitor_prices: [f64; COMPETITOR_COLUMNS],
}

impl FeatureRow {
    /// Internal price minus each competitor price, the trainer's input features.
    pub fn competitor_diffs(&self) -> [f64; COMPETITOR_COLUMNS] {
        self.competitor_prices.map(|p| self.mean_price - p)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    /// `vendors[i]` is the source behind competitor column `i`.
    pub vendors: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchStats {
    pub market_records: usize,
    pub catalog_records: usize,
    pub accepted: usize,
    pub unmatched: usize,
    pub brand_rejections: usize,
    pub unit_rejections: usize,
    pub mean_score: f64,
    pub per_vendor: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct MatchOutput {
    pub matches: Vec<MatchResult>,
    pub features: FeatureTable,
    pub stats: MatchStats,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("match_threshold must be within 0..=100, got {0}")]
    Threshold(u32),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed records in {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown currency '{0}'")]
    UnknownCurrency(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("invalid timestamp in store: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),
}

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("cannot read {kind} file {path}: {source}")]
    Io {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("corpus line {line}: malformed token '{token}'")]
    MalformedCorpus { line: usize, token: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("matching produced no match between {market} market and {catalog} catalog records")]
    NoMatches { market: usize, catalog: usize },
    #[error("feature table is empty after joining {matches} matches with the catalog")]
    EmptyFeatureTable { matches: usize },
}
