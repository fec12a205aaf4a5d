//! Crate-scoped error handling for redb-partitions.
//!
//! Every public operation returns [`Result`]. Storage failures from redb are
//! folded into a single variant; the rest describe rejected input or a broken
//! precondition, and are raised before anything is written.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type exposed to users of the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A bulk build was asked for zero partitions.
    #[error("Invalid partition count {0}: must be greater than 0")]
    InvalidPartitionCount(u32),

    /// An inserted rating lies outside the [0, 5] domain (or is NaN).
    #[error("Invalid rating {0}: must be within [0, 5]")]
    InvalidRating(f64),

    /// Round-robin partitions exist but the cursor row was never written.
    #[error("Round-robin cursor missing from table {0}: run a round-robin partition build first")]
    MissingCursor(String),

    /// Configuration rejected during validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A line of a ratings file could not be parsed.
    #[error("Malformed ratings line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// Reading a ratings file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any failure reported by the storage engine.
    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),
}

impl From<redb::StorageError> for Error {
    fn from(err: redb::StorageError) -> Self {
        Error::Storage(err.into())
    }
}

impl From<redb::TableError> for Error {
    fn from(err: redb::TableError) -> Self {
        Error::Storage(err.into())
    }
}

impl From<redb::TransactionError> for Error {
    fn from(err: redb::TransactionError) -> Self {
        Error::Storage(err.into())
    }
}

impl From<redb::CommitError> for Error {
    fn from(err: redb::CommitError) -> Self {
        Error::Storage(err.into())
    }
}

impl From<redb::DatabaseError> for Error {
    fn from(err: redb::DatabaseError) -> Self {
        Error::Storage(err.into())
    }
}
