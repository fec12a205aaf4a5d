pub mod config;
pub mod db;
pub mod encoding;
pub mod error;
pub mod ingest;
pub mod partition;
pub mod store;

// Re-export common types for convenience
pub use config::PartitionConfig;
pub use db::RatingsDb;
pub use encoding::Rating;
pub use error::{Error, Result};
pub use partition::{Family, InsertOutcome, RangeLayout};
