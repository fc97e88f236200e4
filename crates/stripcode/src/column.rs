//! Bit columns and the standard data column builder.
//!
//! Every non-finder column of a chunk shares one row layout:
//!
//! | row | role |
//! |-----|------|
//! | 0   | primary clock, filled on even local columns |
//! | 1-4 | data nibble, MSB at row 1 |
//! | 5   | even parity over rows 1-4 |
//! | 6   | separator, always empty |
//! | 7   | secondary track (inverse clock, or timeline in the enhanced protocol) |

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Number of rows in every column.
pub const ROWS: usize = 8;
/// Primary clock row.
pub const ROW_CLOCK: usize = 0;
/// First data row (nibble MSB).
pub const ROW_DATA_FIRST: usize = 1;
/// Last data row (nibble LSB).
pub const ROW_DATA_LAST: usize = 4;
/// Parity row.
pub const ROW_PARITY: usize = 5;
/// Separator row.
pub const ROW_SEPARATOR: usize = 6;
/// Secondary clock / timeline row.
pub const ROW_TRACK: usize = 7;

/// One 8-cell vertical slice of a chunk. `true` is a filled cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Column([bool; ROWS]);

impl Column {
    /// An all-empty column (quiet zone).
    pub const EMPTY: Column = Column([false; ROWS]);

    /// Wrap raw bits, row 0 first.
    pub const fn from_bits(bits: [bool; ROWS]) -> Self {
        Self(bits)
    }

    /// Build from a sampled slice. Returns `None` unless it has exactly eight rows.
    pub fn from_slice(bits: &[bool]) -> Option<Self> {
        let bits: [bool; ROWS] = bits.try_into().ok()?;
        Some(Self(bits))
    }

    /// Raw bits, row 0 first.
    pub fn bits(&self) -> [bool; ROWS] {
        self.0
    }

    /// Copy of this column with one cell overridden.
    pub fn with(mut self, row: usize, bit: bool) -> Self {
        self.0[row] = bit;
        self
    }

    /// The 4-bit value stored in rows 1-4.
    pub fn nibble(&self) -> u8 {
        self.0[ROW_DATA_FIRST..=ROW_DATA_LAST]
            .iter()
            .fold(0u8, |acc, &bit| (acc << 1) | bit as u8)
    }

    /// True when the stored parity bit matches the XOR of rows 1-4.
    pub fn parity_ok(&self) -> bool {
        self.0[ROW_PARITY] == nibble_parity(self.nibble())
    }

    /// True when no cell is filled.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| !b)
    }
}

impl Index<usize> for Column {
    type Output = bool;

    fn index(&self, row: usize) -> &bool {
        &self.0[row]
    }
}

impl From<Column> for Vec<bool> {
    fn from(col: Column) -> Self {
        col.0.to_vec()
    }
}

/// Primary clock value for a local column index.
pub fn clock_bit(local_x: usize) -> bool {
    local_x % 2 == 0
}

/// Even parity of a nibble: XOR of its four bits.
pub fn nibble_parity(value: u8) -> bool {
    (value & 0x0F).count_ones() % 2 == 1
}

/// Standard data column: clock, nibble, parity, separator, and the given row-7 bit.
pub fn data_column(value: u8, local_x: usize, track: bool) -> Column {
    let value = value & 0x0F;
    let mut bits = [false; ROWS];
    bits[ROW_CLOCK] = clock_bit(local_x);
    for (i, row) in (ROW_DATA_FIRST..=ROW_DATA_LAST).enumerate() {
        bits[row] = (value >> (3 - i)) & 1 == 1;
    }
    bits[ROW_PARITY] = nibble_parity(value);
    bits[ROW_SEPARATOR] = false;
    bits[ROW_TRACK] = track;
    Column(bits)
}

/// Data column whose row 7 is the inverse clock. Used for metadata and ECC in every
/// protocol, and for payload in the base protocol.
pub fn standard_column(value: u8, local_x: usize) -> Column {
    data_column(value, local_x, !clock_bit(local_x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibble_msb_on_row_one() {
        let col = standard_column(0b1000, 4);
        assert!(col[1]);
        assert!(!col[2] && !col[3] && !col[4]);
        assert_eq!(col.nibble(), 8);
    }

    #[test]
    fn every_nibble_reads_back_with_valid_parity() {
        for v in 0u8..16 {
            let col = standard_column(v, v as usize);
            assert_eq!(col.nibble(), v);
            assert!(col.parity_ok(), "parity failed for {v}");
            assert!(!col[ROW_SEPARATOR]);
        }
    }

    #[test]
    fn clocks_alternate_in_antiphase() {
        let even = standard_column(5, 4);
        let odd = standard_column(5, 5);
        assert!(even[ROW_CLOCK] && !even[ROW_TRACK]);
        assert!(!odd[ROW_CLOCK] && odd[ROW_TRACK]);
    }

    #[test]
    fn flipped_data_bit_breaks_parity() {
        let col = standard_column(0b0110, 8).with(2, false);
        assert!(!col.parity_ok());
    }

    #[test]
    fn from_slice_rejects_wrong_height() {
        assert!(Column::from_slice(&[true; 7]).is_none());
        assert!(Column::from_slice(&[true; 9]).is_none());
        assert_eq!(Column::from_slice(&[false; 8]), Some(Column::EMPTY));
    }

    #[test]
    fn masks_values_above_fifteen() {
        assert_eq!(standard_column(0x1F, 0).nibble(), 0x0F);
    }
}
