//! [`RatingSource`] and [`RatingStore`] over redb transactions.
//!
//! Each logical table is a redb table `u64 -> Rating` keyed by row id. Row
//! ids start at 1 and grow by one per append, so key order is insertion
//! order. The cursor lives in its own `&str -> u64` table.
//!
//! redb admits a single write transaction at a time. Reading the cursor
//! inside a [`WriteTransaction`] therefore excludes every other writer until
//! that transaction ends, which is the row lock the round-robin insert needs.

use super::{RatingSource, RatingStore, CURSOR_KEY};
use crate::encoding::Rating;
use crate::Result;
use redb::{
    ReadTransaction, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
    TableHandle, WriteTransaction,
};

fn ratings_definition(name: &str) -> TableDefinition<'_, u64, Rating> {
    TableDefinition::new(name)
}

fn cursor_definition(name: &str) -> TableDefinition<'_, &'static str, u64> {
    TableDefinition::new(name)
}

fn collect_rows<T>(table: &T) -> Result<Vec<Rating>>
where
    T: ReadableTable<u64, Rating>,
{
    let mut rows = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        rows.push(value.value());
    }
    Ok(rows)
}

fn write_table_exists(txn: &WriteTransaction, name: &str) -> Result<bool> {
    for table in txn.list_tables()? {
        if table.name() == name {
            return Ok(true);
        }
    }
    Ok(false)
}

impl RatingSource for WriteTransaction {
    fn count(&self, table: &str) -> Result<u64> {
        if !write_table_exists(self, table)? {
            return Ok(0);
        }
        let table = self.open_table(ratings_definition(table))?;
        Ok(table.len()?)
    }

    fn scan(&self, table: &str) -> Result<Vec<Rating>> {
        if !write_table_exists(self, table)? {
            return Ok(Vec::new());
        }
        let table = self.open_table(ratings_definition(table))?;
        collect_rows(&table)
    }

    fn list_tables_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for table in self.list_tables()? {
            if table.name().starts_with(prefix) {
                names.push(table.name().to_string());
            }
        }
        Ok(names)
    }

    fn cursor(&self, table: &str) -> Result<Option<u64>> {
        if !write_table_exists(self, table)? {
            return Ok(None);
        }
        let table = self.open_table(cursor_definition(table))?;
        let value = table.get(CURSOR_KEY)?.map(|guard| guard.value());
        Ok(value)
    }
}

impl RatingStore for WriteTransaction {
    fn create_table(&self, name: &str) -> Result<()> {
        // Emptied in place; a table created in this transaction must not
        // also be deleted in it (redb panics at commit).
        let mut table = self.open_table(ratings_definition(name))?;
        table.retain(|_, _| false)?;
        Ok(())
    }

    fn drop_table(&self, name: &str) -> Result<bool> {
        Ok(self.delete_table(ratings_definition(name))?)
    }

    fn append(&self, table: &str, record: Rating) -> Result<u64> {
        let mut table = self.open_table(ratings_definition(table))?;
        let row_id = table.last()?.map(|(key, _)| key.value() + 1).unwrap_or(1);
        table.insert(row_id, record)?;
        Ok(row_id)
    }

    fn bulk_load<I>(&self, table: &str, records: I) -> Result<u64>
    where
        I: IntoIterator<Item = Rating>,
    {
        let mut table = self.open_table(ratings_definition(table))?;
        let first = table.last()?.map(|(key, _)| key.value() + 1).unwrap_or(1);
        let mut row_id = first;
        for record in records {
            table.insert(row_id, record)?;
            row_id += 1;
        }
        Ok(row_id - first)
    }

    fn lock_cursor(&self, table: &str) -> Result<Option<u64>> {
        // Holding the write transaction is the lock; see module docs.
        self.cursor(table)
    }

    fn write_cursor(&self, table: &str, value: u64) -> Result<()> {
        let mut table = self.open_table(cursor_definition(table))?;
        table.insert(CURSOR_KEY, value)?;
        Ok(())
    }
}

impl RatingSource for ReadTransaction {
    fn count(&self, table: &str) -> Result<u64> {
        match self.open_table(ratings_definition(table)) {
            Ok(table) => Ok(table.len()?),
            Err(TableError::TableDoesNotExist(_)) => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    fn scan(&self, table: &str) -> Result<Vec<Rating>> {
        match self.open_table(ratings_definition(table)) {
            Ok(table) => collect_rows(&table),
            Err(TableError::TableDoesNotExist(_)) => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn list_tables_by_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for table in self.list_tables()? {
            if table.name().starts_with(prefix) {
                names.push(table.name().to_string());
            }
        }
        Ok(names)
    }

    fn cursor(&self, table: &str) -> Result<Option<u64>> {
        match self.open_table(cursor_definition(table)) {
            Ok(table) => {
                let value = table.get(CURSOR_KEY)?.map(|guard| guard.value());
                Ok(value)
            }
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
