//! Transactional facade over a redb database.
//!
//! Each method runs in its own write transaction and commits only when the
//! whole operation succeeded. On error the transaction is dropped, which
//! aborts it, so no partial writes survive.

use crate::config::PartitionConfig;
use crate::encoding::Rating;
use crate::error::Result;
use crate::ingest;
use crate::partition::{self, Family, InsertOutcome};
use crate::store::RatingSource;
use redb::{Database, ReadableDatabase, WriteTransaction};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// A ratings database with its partitioning configuration.
pub struct RatingsDb {
    db: Database,
    config: PartitionConfig,
}

impl RatingsDb {
    /// Wraps an open database. The configuration is validated first.
    pub fn new(db: Database, config: PartitionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { db, config })
    }

    /// Creates (or opens) the database file at `path`.
    pub fn create(path: impl AsRef<Path>, config: PartitionConfig) -> Result<Self> {
        let db = Database::create(path)?;
        Self::new(db, config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn write<T, F>(&self, operation: &'static str, work: F) -> Result<T>
    where
        F: FnOnce(&WriteTransaction, &PartitionConfig) -> Result<T>,
    {
        let txn = self.db.begin_write()?;
        let output = work(&txn, &self.config)?;
        txn.commit()?;
        debug!(operation, "Committed");
        Ok(output)
    }

    /// Replaces the base table with the records read from `reader`.
    pub fn load_ratings_from<R: BufRead>(&self, reader: R) -> Result<u64> {
        let records = ingest::read_ratings(reader)?;
        self.write("load_ratings", |txn, config| {
            ingest::load_ratings(txn, config, records)
        })
    }

    /// Replaces the base table with the contents of a ratings file.
    pub fn load_ratings_file(&self, path: impl AsRef<Path>) -> Result<u64> {
        let file = File::open(path)?;
        self.load_ratings_from(BufReader::new(file))
    }

    /// Replaces the base table with `records`.
    pub fn load_ratings<I>(&self, records: I) -> Result<u64>
    where
        I: IntoIterator<Item = Rating>,
    {
        self.write("load_ratings", |txn, config| {
            ingest::load_ratings(txn, config, records)
        })
    }

    /// Builds `partitions` range partitions from the base table.
    pub fn range_partition(&self, partitions: u32) -> Result<u64> {
        self.write("range_partition", |txn, config| {
            partition::range_partition(txn, config, partitions)
        })
    }

    /// Builds `partitions` round-robin partitions and seeds the cursor.
    pub fn round_robin_partition(&self, partitions: u32) -> Result<u64> {
        self.write("round_robin_partition", |txn, config| {
            partition::round_robin_partition(txn, config, partitions)
        })
    }

    /// Inserts one record into the base table and its range partition.
    pub fn range_insert(&self, user_id: i64, item_id: i64, rating: f64) -> Result<InsertOutcome> {
        let record = Rating::new(user_id, item_id, rating);
        self.write("range_insert", |txn, config| {
            partition::range_insert(txn, config, record)
        })
    }

    /// Inserts one record into the base table and the next round-robin
    /// partition.
    pub fn round_robin_insert(
        &self,
        user_id: i64,
        item_id: i64,
        rating: f64,
    ) -> Result<InsertOutcome> {
        let record = Rating::new(user_id, item_id, rating);
        self.write("round_robin_insert", |txn, config| {
            partition::round_robin_insert(txn, config, record)
        })
    }

    /// Number of partitions of `family` the storage engine currently reports.
    pub fn partition_count(&self, family: Family) -> Result<u32> {
        let txn = self.db.begin_read()?;
        partition::partition_count(&txn, family.prefix(&self.config))
    }

    /// Base table records in insertion order.
    pub fn base_records(&self) -> Result<Vec<Rating>> {
        let txn = self.db.begin_read()?;
        txn.scan(&self.config.base_table)
    }

    /// Records of partition `index` of `family` in insertion order.
    pub fn partition_records(&self, family: Family, index: u32) -> Result<Vec<Rating>> {
        let txn = self.db.begin_read()?;
        let name = partition::partition_table_name(family.prefix(&self.config), index);
        txn.scan(&name)
    }

    /// Current round-robin cursor, if a round-robin build has run.
    pub fn cursor(&self) -> Result<Option<u64>> {
        let txn = self.db.begin_read()?;
        txn.cursor(&self.config.cursor_table)
    }
}
