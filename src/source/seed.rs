use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::model::{CatalogRecord, Currency, RawProductRecord, SourceError};

pub const CATALOG_SOURCE_ID: &str = "catalog";

#[derive(Debug, Deserialize)]
struct SeedRow {
    catalog_id: i64,
    name: String,
    price: f64,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    profit: f64,
}

/// Parses the one-off catalog export. Currency defaults to USD.
pub fn parse_catalog_seed(content: &str, path: &str) -> Result<Vec<CatalogRecord>, SourceError> {
    let rows: Vec<SeedRow> = serde_json::from_str(content).map_err(|source| SourceError::Format {
        path: path.to_string(),
        source,
    })?;
    let now = Utc::now();
    rows.into_iter()
        .map(|row| -> Result<CatalogRecord, SourceError> {
            let currency = match row.currency.as_deref() {
                Some(code) => code.parse::<Currency>()?,
                None => Currency::Usd,
            };
            Ok(CatalogRecord {
                catalog_id: row.catalog_id,
                product: RawProductRecord {
                    name: row.name,
                    price: row.price,
                    currency,
                    source_id: CATALOG_SOURCE_ID.to_string(),
                    url: String::new(),
                    captured_at: now,
                },
                profit: row.profit,
            })
        })
        .collect()
}

pub async fn load_catalog_seed(path: &str) -> Result<Vec<CatalogRecord>, SourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.to_string(),
            source,
        })?;
    let records = parse_catalog_seed(&content, path)?;
    info!("Catalog seed {}: {} rows", path, records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed() {
        let rows = parse_catalog_seed(
            r#"[
                {"catalog_id": 1, "name": "Harina PAN 1kg", "price": 1.2, "profit": 30.0},
                {"catalog_id": 2, "name": "Queso", "price": 350.0, "currency": "BS"}
            ]"#,
            "seed.json",
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product.currency, Currency::Usd);
        assert_eq!(rows[0].product.source_id, CATALOG_SOURCE_ID);
        assert_eq!(rows[1].profit, 0.0);
        assert_eq!(rows[1].product.comparable_price(), 3.5);
    }

    #[test]
    fn test_unknown_seed_currency_is_an_error() {
        let err = parse_catalog_seed(
            r#"[{"catalog_id": 1, "name": "Arroz", "price": 1.0, "currency": "EUR"}]"#,
            "seed.json",
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::UnknownCurrency(code) if code == "EUR"));
    }
}
