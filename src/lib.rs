//! Product name normalization and catalog matching for scraped grocery
//! listings.
//!
//! [`ProductPipeline`] enriches scraped and catalog records (matching key,
//! brand, quantity/unit, product type), links each scraped record to its best
//! catalog row and pivots the matches into a [`FeatureTable`].

pub mod brand;
pub mod classifier;
pub mod config;
pub mod enricher;
pub mod lexicon;
pub mod matcher;
pub mod model;
pub mod normalizer;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod tagger;
pub mod udm;
pub mod units;
pub mod utils;

pub use brand::BrandGazetteer;
pub use classifier::ProductTypeClassifier;
pub use enricher::Enricher;
pub use lexicon::Lexicon;
pub use model::{
    CatalogRecord, Currency, FeatureRow, FeatureTable, MatchOutput, MatchResult, MatchStats,
    NormalizedProductRecord, PipelineError, RawProductRecord, Udm,
};
pub use pipeline::ProductPipeline;
pub use tagger::PosTagger;
pub use udm::{UdmExtractor, UdmTier};
pub use units::Unit;
