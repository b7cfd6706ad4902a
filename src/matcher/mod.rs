pub mod engine;
pub mod features;
pub mod fuzz;

pub use engine::{CatalogEntry, EngineRun, MatchEngine};
pub use features::build_feature_table;
pub use fuzz::{ratio, token_set_ratio};
