//! Storage collaborator used by the partitioning core.
//!
//! The core never touches redb types directly; it goes through these traits.
//! [`RatingSource`] covers reads and is available on both read and write
//! transactions, [`RatingStore`] adds the writes and only exists on a write
//! transaction, so every mutation happens inside one unit of work.

use crate::encoding::Rating;
use crate::Result;

mod txn;

/// Key of the single row in the cursor table.
pub const CURSOR_KEY: &str = "next_use_partition";

/// Read access to ratings tables.
///
/// Tables that do not exist read as empty.
pub trait RatingSource {
    /// Number of records in `table`.
    fn count(&self, table: &str) -> Result<u64>;

    /// All records of `table` in row id (insertion) order.
    fn scan(&self, table: &str) -> Result<Vec<Rating>>;

    /// Names of existing tables starting with `prefix`, as reported by the
    /// storage engine's table metadata.
    fn list_tables_by_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Current value of the round-robin cursor, if the cursor row exists.
    fn cursor(&self, table: &str) -> Result<Option<u64>>;
}

/// Write access to ratings tables.
pub trait RatingStore: RatingSource {
    /// Creates `name` empty. An existing table of that name is emptied in
    /// place.
    fn create_table(&self, name: &str) -> Result<()>;

    /// Drops `name`. Returns whether the table existed.
    ///
    /// `name` must not have been created or written earlier in the same
    /// unit of work.
    fn drop_table(&self, name: &str) -> Result<bool>;

    /// Appends one record and returns the row id it was given.
    fn append(&self, table: &str, record: Rating) -> Result<u64>;

    /// Appends every record in order. Returns the number written.
    fn bulk_load<I>(&self, table: &str, records: I) -> Result<u64>
    where
        I: IntoIterator<Item = Rating>;

    /// Reads the cursor for a read-modify-write.
    ///
    /// The returned value stays exclusively held until the enclosing unit of
    /// work commits or aborts.
    fn lock_cursor(&self, table: &str) -> Result<Option<u64>>;

    /// Creates or overwrites the cursor row.
    fn write_cursor(&self, table: &str, value: u64) -> Result<()>;
}
