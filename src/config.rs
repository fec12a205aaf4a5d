//! Configuration for partitioned ratings tables.
//!
//! Names every table the crate touches. The partition families are found
//! again later by prefix, so the names must not shadow one another.

use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::debug;

/// Table naming for the base dataset, both partition families and the
/// round-robin cursor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Base dataset table; the source of truth.
    pub base_table: String,

    /// Prefix of range partition tables (`range_part0`, `range_part1`, ...).
    pub range_prefix: String,

    /// Prefix of round-robin partition tables (`rrobin_part0`, ...).
    pub round_robin_prefix: String,

    /// Single-row table holding the round-robin cursor.
    pub cursor_table: String,
}

impl PartitionConfig {
    /// Creates a validated configuration.
    ///
    /// # Arguments
    /// * `base_table` - Name of the base ratings table
    /// * `range_prefix` - Name prefix of range partitions
    /// * `round_robin_prefix` - Name prefix of round-robin partitions
    /// * `cursor_table` - Name of the round-robin cursor table
    ///
    /// # Returns
    /// Validated configuration or error
    pub fn new(
        base_table: impl Into<String>,
        range_prefix: impl Into<String>,
        round_robin_prefix: impl Into<String>,
        cursor_table: impl Into<String>,
    ) -> Result<Self> {
        let config = Self {
            base_table: base_table.into(),
            range_prefix: range_prefix.into(),
            round_robin_prefix: round_robin_prefix.into(),
            cursor_table: cursor_table.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document. Keys that are absent keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        debug!(config = ?config, "Loaded partition config");
        Ok(config)
    }

    /// Checks that names are non-empty and that catalog discovery by prefix
    /// cannot pick up a table from another family.
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("base_table", &self.base_table),
            ("range_prefix", &self.range_prefix),
            ("round_robin_prefix", &self.round_robin_prefix),
            ("cursor_table", &self.cursor_table),
        ];
        for (field, name) in names {
            if name.is_empty() {
                return Err(Error::InvalidConfig(format!("{field} must not be empty")));
            }
        }

        if self.range_prefix.starts_with(&self.round_robin_prefix)
            || self.round_robin_prefix.starts_with(&self.range_prefix)
        {
            return Err(Error::InvalidConfig(format!(
                "partition prefixes overlap: {} / {}",
                self.range_prefix, self.round_robin_prefix
            )));
        }

        for (field, table) in [
            ("base_table", &self.base_table),
            ("cursor_table", &self.cursor_table),
        ] {
            for prefix in [&self.range_prefix, &self.round_robin_prefix] {
                if table.starts_with(prefix.as_str()) {
                    return Err(Error::InvalidConfig(format!(
                        "{field} {table} collides with partition prefix {prefix}"
                    )));
                }
            }
        }

        if self.base_table == self.cursor_table {
            return Err(Error::InvalidConfig(
                "base_table and cursor_table must differ".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            base_table: "ratings".to_string(),
            range_prefix: "range_part".to_string(),
            round_robin_prefix: "rrobin_part".to_string(),
            cursor_table: "roundrobin_metadata".to_string(),
        }
    }
}
