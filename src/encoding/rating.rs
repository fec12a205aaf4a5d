//! Rating record and its on-disk encoding.
//!
//! Record layout: [user_id: i64][item_id: i64][rating: f64], little-endian,
//! 24 bytes fixed width. Base and partition tables share this layout.

use redb::{TypeName, Value};

/// Width in bytes of an encoded [`Rating`].
pub const RATING_WIDTH: usize = 24;

/// Upper bound of the rating domain; the lower bound is 0.
pub const MAX_RATING: f64 = 5.0;

/// A single (user, item, rating) triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user_id: i64,
    pub item_id: i64,
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: i64, item_id: i64, rating: f64) -> Self {
        Self {
            user_id,
            item_id,
            rating,
        }
    }

    /// Whether the rating value lies in [0, 5]. NaN is never in range.
    pub fn in_domain(&self) -> bool {
        (0.0..=MAX_RATING).contains(&self.rating)
    }
}

fn read_8(data: &[u8], offset: usize) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    buf
}

impl Value for Rating {
    type SelfType<'a>
        = Rating
    where
        Self: 'a;

    type AsBytes<'a>
        = [u8; RATING_WIDTH]
    where
        Self: 'a;

    fn fixed_width() -> Option<usize> {
        Some(RATING_WIDTH)
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        if data.len() < RATING_WIDTH {
            panic!(
                "Rating data too short: expected {} bytes, got {}",
                RATING_WIDTH,
                data.len()
            );
        }

        Rating {
            user_id: i64::from_le_bytes(read_8(data, 0)),
            item_id: i64::from_le_bytes(read_8(data, 8)),
            rating: f64::from_le_bytes(read_8(data, 16)),
        }
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'a,
        Self: 'b,
    {
        let mut result = [0u8; RATING_WIDTH];
        result[0..8].copy_from_slice(&value.user_id.to_le_bytes());
        result[8..16].copy_from_slice(&value.item_id.to_le_bytes());
        result[16..24].copy_from_slice(&value.rating.to_le_bytes());
        result
    }

    fn type_name() -> TypeName {
        TypeName::new("redb_partitions::Rating")
    }
}
