//! Range partitioning over the rating domain.
//!
//! The domain [0, 5] is cut into N intervals of width `5 / N`. Partition 0
//! covers `[0, w]`, partition `i > 0` covers `(i*w, (i+1)*w]`, so a rating on
//! a boundary belongs to the lower partition and 0 still has a home.
//!
//! Routing compares in scaled units (`rating * N / 5`) with a tolerance of
//! 1e-9, so a rating less than `1e-9 * 5 / N` above a boundary still routes to
//! the lower partition.

use super::catalog::{drop_stale_partitions, partition_count, partition_table_name};
use super::{check_partition_count, check_rating, InsertOutcome};
use crate::config::PartitionConfig;
use crate::encoding::{Rating, MAX_RATING};
use crate::store::RatingStore;
use crate::Result;
use tracing::{debug, info, warn};

/// Tolerance applied when a scaled rating lands on an interval boundary.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Interval layout for a fixed number of range partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLayout {
    partitions: u32,
}

impl RangeLayout {
    /// Creates a layout of `partitions` equal-width intervals (must be > 0).
    pub fn new(partitions: u32) -> Result<Self> {
        check_partition_count(partitions)?;
        Ok(Self { partitions })
    }

    /// Get the configured partition count.
    pub fn partitions(&self) -> u32 {
        self.partitions
    }

    /// Width of each interval.
    pub fn width(&self) -> f64 {
        MAX_RATING / f64::from(self.partitions)
    }

    /// Lower and upper bound of partition `index`. The upper bound is always
    /// inclusive; the lower bound is inclusive only for partition 0.
    ///
    /// [`partition_for`](Self::partition_for) widens each upper bound by
    /// `1e-9 * 5 / N` to absorb rounding in the scaled comparison.
    pub fn bounds(&self, index: u32) -> (f64, f64) {
        let n = f64::from(self.partitions);
        let lower = f64::from(index) * MAX_RATING / n;
        let upper = f64::from(index + 1) * MAX_RATING / n;
        (lower, upper)
    }

    /// Partition index for an in-domain rating.
    ///
    /// Works on `rating * N / 5`, which is exact for the usual half-star
    /// ratings, and takes the ceiling minus one so boundaries fall to the
    /// lower interval. Out-of-domain values are clamped to the end partitions.
    pub fn partition_for(&self, rating: f64) -> u32 {
        let scaled = rating * f64::from(self.partitions) / MAX_RATING;
        let index = (scaled - BOUNDARY_EPSILON).ceil() - 1.0;
        if index <= 0.0 {
            0
        } else {
            (index as u32).min(self.partitions - 1)
        }
    }
}

/// Rebuilds the range partitions from the base table.
///
/// Drops range partitions with an index of `partitions` or more, empties or
/// creates tables `0..partitions` and copies each base record into the one
/// whose interval holds its rating.
/// Base records outside [0, 5] belong to no interval and are skipped.
/// Returns the number of records distributed.
pub(crate) fn range_partition<S>(
    store: &S,
    config: &PartitionConfig,
    partitions: u32,
) -> Result<u64>
where
    S: RatingStore,
{
    let layout = RangeLayout::new(partitions)?;
    let prefix = config.range_prefix.as_str();

    drop_stale_partitions(store, prefix, partitions)?;

    let mut buckets: Vec<Vec<Rating>> = vec![Vec::new(); partitions as usize];
    let mut skipped = 0u64;
    for record in store.scan(&config.base_table)? {
        if !record.in_domain() {
            skipped += 1;
            continue;
        }
        buckets[layout.partition_for(record.rating) as usize].push(record);
    }

    if skipped > 0 {
        warn!(
            table = config.base_table.as_str(),
            skipped, "Skipped base records outside the rating domain"
        );
    }

    let mut distributed = 0u64;
    for (index, records) in (0..partitions).zip(buckets) {
        let name = partition_table_name(prefix, index);
        store.create_table(&name)?;
        let (lower, upper) = layout.bounds(index);
        let written = store.bulk_load(&name, records)?;
        debug!(table = name.as_str(), lower, upper, written, "Filled range partition");
        distributed += written;
    }

    info!(
        table = config.base_table.as_str(),
        partitions, distributed, "Built range partitions"
    );
    Ok(distributed)
}

/// Appends `record` to the base table and to the range partition that holds
/// its rating.
///
/// The partition count is read from the catalog. With no range partitions the
/// record only lands in the base table.
pub(crate) fn range_insert<S>(
    store: &S,
    config: &PartitionConfig,
    record: Rating,
) -> Result<InsertOutcome>
where
    S: RatingStore,
{
    check_rating(&record)?;

    let partitions = partition_count(store, &config.range_prefix)?;
    let row_id = store.append(&config.base_table, record)?;

    if partitions == 0 {
        warn!(
            table = config.base_table.as_str(),
            row_id, "No range partitions exist; record stored in base table only"
        );
        return Ok(InsertOutcome {
            row_id,
            partition: None,
        });
    }

    let index = RangeLayout::new(partitions)?.partition_for(record.rating);
    store.append(&partition_table_name(&config.range_prefix, index), record)?;
    debug!(row_id, rating = record.rating, partition = index, "Routed range insert");

    Ok(InsertOutcome {
        row_id,
        partition: Some(index),
    })
}
