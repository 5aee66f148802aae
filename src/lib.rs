pub mod aggregate;
pub mod columns;
pub mod config;
pub mod db;
pub mod errors;
pub mod merge;
pub mod period;
pub mod phenology;
pub mod pipeline;
pub mod policy;
pub mod query;
pub mod report;
pub mod source;
pub mod summary;

pub use config::Config;
pub use errors::{ConfigError, EngineError, SourceError};
pub use pipeline::IndexEngine;
pub use query::{FarmId, RawIndexQuery};
