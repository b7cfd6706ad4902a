// JSON export of one scraper run: an array of loosely typed rows.
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{Currency, RawProductRecord, SourceError};
use crate::source::traits::RecordSource;
use crate::utils::{parse_datetime, parse_price};

#[derive(Debug, Deserialize)]
struct ScrapedRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    captured_at: Option<String>,
}

#[derive(Debug, Error)]
enum Defect {
    #[error("missing name")]
    MissingName,
    #[error("unparsable price {0}")]
    BadPrice(String),
    #[error("unknown currency '{0}'")]
    UnknownCurrency(String),
}

fn price_of(value: &Value, currency: Currency) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p >= 0.0),
        Value::String(s) => parse_price(s, currency),
        _ => None,
    }
}

fn to_record(
    row: ScrapedRow,
    source_id: &str,
    fetched_at: DateTime<Utc>,
) -> Result<RawProductRecord, Defect> {
    let name = row
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(Defect::MissingName)?;
    let currency: Currency = row
        .currency
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|_| Defect::UnknownCurrency(row.currency.clone().unwrap_or_default()))?;
    let price = price_of(&row.price, currency).ok_or_else(|| Defect::BadPrice(row.price.to_string()))?;
    let captured_at = row
        .captured_at
        .as_deref()
        .and_then(parse_datetime)
        .unwrap_or(fetched_at);

    Ok(RawProductRecord {
        name,
        price,
        currency,
        source_id: source_id.to_string(),
        url: row.url.unwrap_or_default(),
        captured_at,
    })
}

/// Rows that cannot enter the pipeline are dropped here with a warning.
pub fn parse_rows(
    content: &str,
    source_id: &str,
    path: &str,
) -> Result<Vec<RawProductRecord>, SourceError> {
    let rows: Vec<ScrapedRow> = serde_json::from_str(content).map_err(|source| SourceError::Format {
        path: path.to_string(),
        source,
    })?;
    let total = rows.len();
    let fetched_at = Utc::now();

    let mut records = Vec::with_capacity(total);
    for (index, row) in rows.into_iter().enumerate() {
        match to_record(row, source_id, fetched_at) {
            Ok(record) => records.push(record),
            Err(defect) => warn!("{}: dropping row {}: {}", source_id, index, defect),
        }
    }
    if records.len() < total {
        warn!("{}: {} of {} rows dropped", source_id, total - records.len(), total);
    }
    Ok(records)
}

pub struct JsonFileSource {
    pub source_id: String,
    pub path: String,
}

impl JsonFileSource {
    pub fn new(source_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            path: path.into(),
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for JsonFileSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn fetch(&self) -> Result<Vec<RawProductRecord>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let records = parse_rows(&content, &self.source_id, &self.path)?;
        info!("{}: loaded {} records from {}", self.source_id, records.len(), self.path);
        Ok(records)
    }
}
