//! Partitioning of the base ratings table.
//!
//! Two families are supported. Range partitions split the rating domain
//! [0, 5] into N equal-width intervals. Round-robin partitions deal records
//! out in insertion order, with a persisted cursor for later inserts. Each
//! family has a bulk build and an incremental insert that routes one new
//! record the same way the bulk build would have.

use crate::config::PartitionConfig;
use crate::encoding::Rating;
use crate::error::{Error, Result};

pub mod catalog;
pub mod range;
pub mod round_robin;

// Re-export main types for public API
pub use catalog::{partition_count, partition_table_name};
pub use range::RangeLayout;
pub(crate) use range::{range_insert, range_partition};
pub(crate) use round_robin::{round_robin_insert, round_robin_partition};

/// A family of partition tables sharing a name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Range,
    RoundRobin,
}

impl Family {
    /// Table name prefix of this family under `config`.
    pub fn prefix<'a>(&self, config: &'a PartitionConfig) -> &'a str {
        match self {
            Family::Range => &config.range_prefix,
            Family::RoundRobin => &config.round_robin_prefix,
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Family::Range => write!(f, "range"),
            Family::RoundRobin => write!(f, "round-robin"),
        }
    }
}

/// Where an incremental insert put its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Row id of the record in the base table.
    pub row_id: u64,
    /// Partition index that received the record, `None` when no partitions
    /// of the family exist yet.
    pub partition: Option<u32>,
}

pub(crate) fn check_partition_count(partitions: u32) -> Result<()> {
    if partitions == 0 {
        return Err(Error::InvalidPartitionCount(partitions));
    }
    Ok(())
}

pub(crate) fn check_rating(record: &Rating) -> Result<()> {
    if !record.in_domain() {
        return Err(Error::InvalidRating(record.rating));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_prefixes() {
        let config = PartitionConfig::default();
        assert_eq!(Family::Range.prefix(&config), "range_part");
        assert_eq!(Family::RoundRobin.prefix(&config), "rrobin_part");
        assert_eq!(Family::RoundRobin.to_string(), "round-robin");
    }

    #[test]
    fn test_checks() {
        assert!(matches!(
            check_partition_count(0),
            Err(Error::InvalidPartitionCount(0))
        ));
        assert!(check_partition_count(1).is_ok());
        assert!(check_rating(&Rating::new(1, 1, 5.0)).is_ok());
        assert!(matches!(
            check_rating(&Rating::new(1, 1, -1.0)),
            Err(Error::InvalidRating(_))
        ));
    }
}
