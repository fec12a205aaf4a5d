//! Record encoding for storage.
//!
//! Provides the stable on-disk layout shared by the base table and every
//! partition table.

pub mod rating;

pub use rating::{Rating, MAX_RATING};
