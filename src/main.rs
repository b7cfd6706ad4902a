use futures::future::join_all;
use shelf_match::config::{AppConfig, load_config};
use shelf_match::model::{
    ConfigError, LexiconError, PipelineError, RawProductRecord, SourceError, StorageError,
};
use shelf_match::source::{JsonFileSource, RecordSource, load_catalog_seed};
use shelf_match::storage::SqliteStorage;
use shelf_match::{FeatureTable, Lexicon, ProductPipeline};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("matching task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("cannot write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize feature table: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    if let Err(e) = run(&config_path).await {
        error!("Run failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config_path: &str) -> Result<(), AppError> {
    let config = load_config(config_path)?;
    info!("Config loaded from {}", config_path);

    let lexicon = Lexicon::load(&config.lexicon)?;
    let storage = SqliteStorage::new(&config.database_path)?;

    seed_catalog(&storage, &config).await?;
    let catalog = storage.get_catalog_records()?;
    info!("Catalog: {} rows", catalog.len());

    let market = fetch_market(&config).await;
    info!("Market: {} records from {} sources", market.len(), config.market_sources.len());

    let pipeline = ProductPipeline::new(lexicon, config.threshold());
    let workers = config.worker_threads;
    let (normalized, output) = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let work = || {
            let normalized = pipeline.enricher().normalize_all(&market);
            let output = pipeline.match_normalized(&normalized, &catalog)?;
            Ok::<_, AppError>((normalized, output))
        };
        if workers > 0 {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
            pool.install(work)
        } else {
            work()
        }
    })
    .await??;

    let saved = storage.persist_run(&normalized, &output)?;
    info!(
        "Stored {} preprocessed records, {} matches, {} feature rows",
        saved,
        output.matches.len(),
        output.features.rows.len()
    );
    for (vendor, count) in &output.stats.per_vendor {
        info!("Vendor {}: {} matches", vendor, count);
    }

    if let Some(path) = &config.feature_table_path {
        write_feature_table(path, &output.features).await?;
    }
    Ok(())
}

/// Initial catalog load, done once while the store is empty.
async fn seed_catalog(storage: &SqliteStorage, config: &AppConfig) -> Result<(), AppError> {
    if storage.count_catalog_records()? > 0 {
        return Ok(());
    }
    match &config.catalog_seed_path {
        Some(path) => {
            let records = load_catalog_seed(path).await?;
            storage.save_catalog_records(&records)?;
            info!("Seeded catalog with {} rows", records.len());
        }
        None => warn!("Catalog is empty and no catalog_seed_path is configured"),
    }
    Ok(())
}

/// Reads every configured source concurrently. A failing source is skipped.
async fn fetch_market(config: &AppConfig) -> Vec<RawProductRecord> {
    let sources: Vec<Box<dyn RecordSource>> = config
        .market_sources
        .iter()
        .map(|s| Box::new(JsonFileSource::new(&s.source_id, &s.path)) as Box<dyn RecordSource>)
        .collect();

    let results = join_all(sources.iter().map(|s| s.fetch())).await;

    let mut market = Vec::new();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(records) => market.extend(records),
            Err(e) => warn!("Source {} skipped: {}", source.source_id(), e),
        }
    }
    market
}

async fn write_feature_table(path: &str, table: &FeatureTable) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(table)?;
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| AppError::Output {
                path: path.to_string(),
                source,
            })?;
    }
    tokio::fs::write(path, json)
        .await
        .map_err(|source| AppError::Output {
            path: path.to_string(),
            source,
        })?;
    info!("Feature table written to {}", path);
    Ok(())
}
