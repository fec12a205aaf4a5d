//! Partition catalog.
//!
//! The number of partitions in a family is not stored anywhere; it is read
//! back from the storage engine's table list on every call.

use crate::store::{RatingSource, RatingStore};
use crate::Result;

/// Name of partition `index` under `prefix`: `range_part0`, `rrobin_part3`, ...
pub fn partition_table_name(prefix: &str, index: u32) -> String {
    format!("{}{}", prefix, index)
}

/// Parses the partition index out of a table name, if it belongs to `prefix`.
pub fn partition_index(prefix: &str, table_name: &str) -> Option<u32> {
    let suffix = table_name.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse::<u32>().ok()
}

/// Names of every existing partition table under `prefix`.
pub fn partition_tables<S>(store: &S, prefix: &str) -> Result<Vec<String>>
where
    S: RatingSource + ?Sized,
{
    let names = store
        .list_tables_by_prefix(prefix)?
        .into_iter()
        .filter(|name| partition_index(prefix, name).is_some())
        .collect();
    Ok(names)
}

/// Drops the partitions of `prefix` whose index is `partitions` or higher.
/// Returns how many were dropped.
///
/// Tables below `partitions` are left for the caller to empty in place.
pub(crate) fn drop_stale_partitions<S>(store: &S, prefix: &str, partitions: u32) -> Result<u32>
where
    S: RatingStore,
{
    let mut dropped = 0;
    for name in partition_tables(store, prefix)? {
        if partition_index(prefix, &name).is_some_and(|index| index >= partitions) {
            store.drop_table(&name)?;
            dropped += 1;
        }
    }
    Ok(dropped)
}

/// Counts the partition tables that currently exist under `prefix`.
pub fn partition_count<S>(store: &S, prefix: &str) -> Result<u32>
where
    S: RatingSource + ?Sized,
{
    let count = partition_tables(store, prefix)?.len();
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Rating;
    use redb::{Database, ReadableDatabase};
    use tempfile::NamedTempFile;

    #[test]
    fn test_table_names() {
        assert_eq!(partition_table_name("range_part", 0), "range_part0");
        assert_eq!(partition_table_name("rrobin_part", 12), "rrobin_part12");
    }

    #[test]
    fn test_partition_index() {
        assert_eq!(partition_index("range_part", "range_part7"), Some(7));
        assert_eq!(partition_index("range_part", "range_part"), None);
        assert_eq!(partition_index("range_part", "range_part_x"), None);
        assert_eq!(partition_index("range_part", "range_part+1"), None);
        assert_eq!(partition_index("range_part", "ratings"), None);
    }

    #[test]
    fn counts_only_family_tables() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;

        let write_txn = db.begin_write()?;
        for index in 0..3 {
            write_txn.create_table(&partition_table_name("range_part", index))?;
        }
        write_txn.create_table("rrobin_part0")?;
        write_txn.create_table("range_part_backup")?;
        write_txn.append("ratings", Rating::new(1, 1, 1.0))?;
        assert_eq!(partition_count(&write_txn, "range_part")?, 3);
        write_txn.commit()?;

        let read_txn = db.begin_read()?;
        let first = partition_count(&read_txn, "range_part")?;
        let second = partition_count(&read_txn, "range_part")?;
        assert_eq!(first, 3);
        assert_eq!(first, second);
        assert_eq!(partition_count(&read_txn, "rrobin_part")?, 1);
        assert_eq!(partition_count(&read_txn, "missing_part")?, 0);

        Ok(())
    }

    #[test]
    fn drops_only_indices_past_the_new_count() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let temp_file = NamedTempFile::new()?;
        let db = Database::create(temp_file.path())?;

        let write_txn = db.begin_write()?;
        for index in 0..5 {
            write_txn.create_table(&partition_table_name("range_part", index))?;
        }
        write_txn.commit()?;

        let write_txn = db.begin_write()?;
        assert_eq!(drop_stale_partitions(&write_txn, "range_part", 2)?, 3);
        assert_eq!(drop_stale_partitions(&write_txn, "range_part", 2)?, 0);
        write_txn.commit()?;

        let read_txn = db.begin_read()?;
        let mut names = partition_tables(&read_txn, "range_part")?;
        names.sort();
        assert_eq!(names, vec!["range_part0".to_string(), "range_part1".to_string()]);

        Ok(())
    }
}
