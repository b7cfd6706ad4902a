use crate::model::{RawProductRecord, SourceError};

/// Anything that can hand the pipeline a batch of scraped listings.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    fn source_id(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<RawProductRecord>, SourceError>;
}
