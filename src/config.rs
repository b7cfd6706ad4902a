use serde::Deserialize;
use std::fs;

use crate::model::ConfigError;

pub const DEFAULT_MATCH_THRESHOLD: u32 = 85;

fn default_threshold() -> u32 {
    DEFAULT_MATCH_THRESHOLD
}

fn default_database_path() -> String {
    "data.db".to_string()
}

/// One scraped vendor export.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    pub path: String,
}

/// Optional replacements for the embedded lexicon resources.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LexiconConfig {
    pub brands_path: Option<String>,
    pub stop_words_path: Option<String>,
    pub corpus_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_threshold")]
    pub match_threshold: u32,
    /// 0 keeps rayon's global pool.
    #[serde(default)]
    pub worker_threads: usize,
    pub market_sources: Vec<SourceConfig>,
    pub catalog_seed_path: Option<String>,
    pub feature_table_path: Option<String>,
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

impl AppConfig {
    pub fn threshold(&self) -> u8 {
        // Validated in `parse_config`.
        self.match_threshold.min(100) as u8
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    if config.match_threshold > 100 {
        return Err(ConfigError::Threshold(config.match_threshold));
    }
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_applied() {
        let cfg = parse_config(r#"{"market_sources": []}"#).unwrap();
        assert_eq!(cfg.match_threshold, 85);
        assert_eq!(cfg.database_path, "data.db");
        assert_eq!(cfg.worker_threads, 0);
        assert!(cfg.lexicon.corpus_path.is_none());
        assert!(cfg.catalog_seed_path.is_none());
    }

    #[test]
    fn test_full_config() {
        let cfg = parse_config(
            r#"{
                "database_path": "shelf.db",
                "match_threshold": 90,
                "worker_threads": 4,
                "market_sources": [{"source_id": "kalea", "path": "data/kalea.json"}],
                "catalog_seed_path": "seed.json",
                "feature_table_path": "out/features.json",
                "lexicon": {"brands_path": "brands.txt"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.threshold(), 90);
        assert_eq!(cfg.market_sources[0].source_id, "kalea");
        assert_eq!(cfg.lexicon.brands_path.as_deref(), Some("brands.txt"));
        assert!(cfg.lexicon.stop_words_path.is_none());
    }

    #[test]
    fn test_threshold_above_100_is_rejected() {
        let err = parse_config(r#"{"match_threshold": 101, "market_sources": []}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Threshold(101)));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/config.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
