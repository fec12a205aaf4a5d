//! Round-robin partitioning.
//!
//! Base records are numbered 1, 2, 3, ... in row id order and record `p` goes
//! to partition `(p - 1) mod N`. The bulk build leaves a cursor holding
//! `total mod N`, the partition the next record would have received, and
//! every incremental insert consumes the cursor and bumps it by one. The
//! cursor is never wrapped; the modulo is taken when it is read.

use super::catalog::{drop_stale_partitions, partition_count, partition_table_name};
use super::{check_partition_count, check_rating, InsertOutcome};
use crate::config::PartitionConfig;
use crate::encoding::Rating;
use crate::error::Error;
use crate::store::RatingStore;
use crate::Result;
use tracing::{debug, info, warn};

/// Partition for the record at 1-based `position` among `partitions`.
/// Callers guarantee `position >= 1` and `partitions > 0`.
pub(crate) fn partition_for_position(position: u64, partitions: u32) -> u32 {
    ((position - 1) % u64::from(partitions)) as u32
}

/// Rebuilds the round-robin partitions from the base table and reseeds the
/// cursor. Returns the number of records distributed.
pub(crate) fn round_robin_partition<S>(
    store: &S,
    config: &PartitionConfig,
    partitions: u32,
) -> Result<u64>
where
    S: RatingStore,
{
    check_partition_count(partitions)?;
    let prefix = config.round_robin_prefix.as_str();

    drop_stale_partitions(store, prefix, partitions)?;

    let mut buckets: Vec<Vec<Rating>> = vec![Vec::new(); partitions as usize];
    for (position, record) in (1u64..).zip(store.scan(&config.base_table)?) {
        buckets[partition_for_position(position, partitions) as usize].push(record);
    }

    let mut distributed = 0u64;
    for (index, records) in (0..partitions).zip(buckets) {
        let name = partition_table_name(prefix, index);
        store.create_table(&name)?;
        distributed += store.bulk_load(&name, records)?;
    }

    let total = store.count(&config.base_table)?;
    let next_use = total % u64::from(partitions);
    store.write_cursor(&config.cursor_table, next_use)?;

    info!(
        table = config.base_table.as_str(),
        partitions, distributed, next_use, "Built round-robin partitions"
    );
    Ok(distributed)
}

/// Appends `record` to the base table and to the round-robin partition the
/// cursor points at, then advances the cursor.
///
/// Fails with [`Error::MissingCursor`] before writing anything when
/// round-robin partitions exist without a cursor. With no round-robin
/// partitions the record only lands in the base table.
pub(crate) fn round_robin_insert<S>(
    store: &S,
    config: &PartitionConfig,
    record: Rating,
) -> Result<InsertOutcome>
where
    S: RatingStore,
{
    check_rating(&record)?;

    let partitions = partition_count(store, &config.round_robin_prefix)?;
    if partitions == 0 {
        let row_id = store.append(&config.base_table, record)?;
        warn!(
            table = config.base_table.as_str(),
            row_id, "No round-robin partitions exist; record stored in base table only"
        );
        return Ok(InsertOutcome {
            row_id,
            partition: None,
        });
    }

    let cursor = store
        .lock_cursor(&config.cursor_table)?
        .ok_or_else(|| Error::MissingCursor(config.cursor_table.clone()))?;
    store.write_cursor(&config.cursor_table, cursor + 1)?;
    let index = (cursor % u64::from(partitions)) as u32;

    let row_id = store.append(&config.base_table, record)?;
    store.append(&partition_table_name(&config.round_robin_prefix, index), record)?;
    debug!(row_id, cursor, partition = index, "Routed round-robin insert");

    Ok(InsertOutcome {
        row_id,
        partition: Some(index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RatingSource;
    use redb::Database;
    use tempfile::NamedTempFile;

    fn sample(count: i64) -> Vec<Rating> {
        (0..count)
            .map(|i| Rating::new(i, 100 + i, (i % 11) as f64 / 2.0))
            .collect()
    }

    #[test]
    fn test_partition_for_position() {
        assert_eq!(partition_for_position(1, 3), 0);
        assert_eq!(partition_for_position(2, 3), 1);
        assert_eq!(partition_for_position(3, 3), 2);
        assert_eq!(partition_for_position(4, 3), 0);
        assert_eq!(partition_for_position(9, 1), 0);
    }

    #[test]
    fn zero_partitions_rejected_without_writes() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;
        let config = PartitionConfig::default();

        let write_txn = db.begin_write()?;
        write_txn.bulk_load("ratings", sample(4))?;
        let result = round_robin_partition(&write_txn, &config, 0);
        assert!(matches!(result, Err(Error::InvalidPartitionCount(0))));
        assert_eq!(partition_count(&write_txn, "rrobin_part")?, 0);
        assert_eq!(write_txn.cursor("roundrobin_metadata")?, None);
        write_txn.commit()?;

        Ok(())
    }

    #[test]
    fn bulk_build_deals_records_in_order() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;
        let config = PartitionConfig::default();

        let write_txn = db.begin_write()?;
        write_txn.bulk_load("ratings", sample(7))?;
        assert_eq!(round_robin_partition(&write_txn, &config, 3)?, 7);

        let users = |table: &str| -> Vec<i64> {
            write_txn
                .scan(table)
                .unwrap()
                .iter()
                .map(|rating| rating.user_id)
                .collect()
        };
        assert_eq!(users("rrobin_part0"), vec![0, 3, 6]);
        assert_eq!(users("rrobin_part1"), vec![1, 4]);
        assert_eq!(users("rrobin_part2"), vec![2, 5]);
        assert_eq!(write_txn.cursor("roundrobin_metadata")?, Some(1));
        write_txn.commit()?;

        Ok(())
    }

    #[test]
    fn shrinking_rebuild_reseeds_cursor() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;
        let config = PartitionConfig::default();

        let write_txn = db.begin_write()?;
        write_txn.bulk_load("ratings", sample(7))?;
        round_robin_partition(&write_txn, &config, 5)?;
        assert_eq!(write_txn.cursor("roundrobin_metadata")?, Some(2));
        write_txn.commit()?;

        let write_txn = db.begin_write()?;
        assert_eq!(round_robin_partition(&write_txn, &config, 3)?, 7);
        assert_eq!(partition_count(&write_txn, "rrobin_part")?, 3);
        assert_eq!(write_txn.count("rrobin_part0")?, 3);
        assert_eq!(write_txn.cursor("roundrobin_metadata")?, Some(1));
        write_txn.commit()?;

        Ok(())
    }

    #[test]
    fn missing_cursor_blocks_insert() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;
        let config = PartitionConfig::default();

        let write_txn = db.begin_write()?;
        write_txn.create_table("rrobin_part0")?;
        write_txn.create_table("rrobin_part1")?;
        let result = round_robin_insert(&write_txn, &config, Rating::new(1, 1, 1.0));
        assert!(matches!(result, Err(Error::MissingCursor(_))));
        assert_eq!(write_txn.count("ratings")?, 0);
        write_txn.abort()?;

        Ok(())
    }

    #[test]
    fn cursor_wraps_only_on_read() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;
        let config = PartitionConfig::default();

        let write_txn = db.begin_write()?;
        round_robin_partition(&write_txn, &config, 2)?;
        assert_eq!(write_txn.cursor("roundrobin_metadata")?, Some(0));

        let mut routed = Vec::new();
        for i in 0..5 {
            let outcome = round_robin_insert(&write_txn, &config, Rating::new(i, i, 2.0))?;
            routed.push(outcome.partition);
        }
        assert_eq!(routed, vec![Some(0), Some(1), Some(0), Some(1), Some(0)]);
        assert_eq!(write_txn.cursor("roundrobin_metadata")?, Some(5));
        write_txn.commit()?;

        Ok(())
    }
}
