//! Ratings file ingestion.
//!
//! Input lines look like `UserID::MovieID::Rating::Timestamp`. The timestamp
//! is checked for shape and then dropped; only the triple is stored.

use crate::config::PartitionConfig;
use crate::encoding::Rating;
use crate::error::{Error, Result};
use crate::store::RatingStore;
use std::io::BufRead;
use tracing::info;

const FIELD_SEPARATOR: &str = "::";

/// Parses one ratings line. `line_no` is 1-based and only used in errors.
pub fn parse_line(line: &str, line_no: usize) -> Result<Rating> {
    let malformed = |reason: String| Error::MalformedLine {
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    if fields.len() != 4 {
        return Err(malformed(format!(
            "expected 4 fields, found {}",
            fields.len()
        )));
    }

    let user_id = fields[0]
        .parse::<i64>()
        .map_err(|err| malformed(format!("user id {:?}: {}", fields[0], err)))?;
    let item_id = fields[1]
        .parse::<i64>()
        .map_err(|err| malformed(format!("item id {:?}: {}", fields[1], err)))?;
    let rating = fields[2]
        .parse::<f64>()
        .map_err(|err| malformed(format!("rating {:?}: {}", fields[2], err)))?;
    fields[3]
        .parse::<i64>()
        .map_err(|err| malformed(format!("timestamp {:?}: {}", fields[3], err)))?;

    let record = Rating::new(user_id, item_id, rating);
    if !record.in_domain() {
        return Err(malformed(format!("rating {} outside [0, 5]", rating)));
    }
    Ok(record)
}

/// Reads every record from `reader`, skipping blank lines.
pub fn read_ratings<R: BufRead>(reader: R) -> Result<Vec<Rating>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_line(&line, index + 1)?);
    }
    Ok(records)
}

/// Replaces the base table with `records`, keeping their order.
pub fn load_ratings<S, I>(store: &S, config: &PartitionConfig, records: I) -> Result<u64>
where
    S: RatingStore,
    I: IntoIterator<Item = Rating>,
{
    store.create_table(&config.base_table)?;
    let loaded = store.bulk_load(&config.base_table, records)?;
    info!(
        table = config.base_table.as_str(),
        loaded, "Loaded ratings into base table"
    );
    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let record = parse_line("1::122::5::838985046", 1).unwrap();
        assert_eq!(record, Rating::new(1, 122, 5.0));

        let record = parse_line("  15::4973::3.5::1215281337\n", 2).unwrap();
        assert_eq!(record, Rating::new(15, 4973, 3.5));
    }

    #[test]
    fn test_parse_line_errors() {
        match parse_line("1::122::5", 4) {
            Err(Error::MalformedLine { line, reason }) => {
                assert_eq!(line, 4);
                assert!(reason.contains("expected 4 fields"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(parse_line("x::122::5::838985046", 1).is_err());
        assert!(parse_line("1::122::five::838985046", 1).is_err());
        assert!(parse_line("1::122::5::later", 1).is_err());
        assert!(parse_line("1::122::5.5::838985046", 1).is_err());
    }

    #[test]
    fn test_read_ratings_skips_blank_lines() {
        let input = "1::122::5::838985046\n\n1::185::4.5::838983525\n";
        let records = read_ratings(input.as_bytes()).unwrap();
        assert_eq!(
            records,
            vec![Rating::new(1, 122, 5.0), Rating::new(1, 185, 4.5)]
        );
    }

    #[test]
    fn test_read_ratings_reports_line_number() {
        let input = "1::122::5::838985046\n\nbroken\n";
        match read_ratings(input.as_bytes()) {
            Err(Error::MalformedLine { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
