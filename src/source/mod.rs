pub mod json_file;
pub mod seed;
pub mod traits;

pub use json_file::JsonFileSource;
pub use seed::load_catalog_seed;
pub use traits::RecordSource;
