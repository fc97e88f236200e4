//! Capacity solving and the shared chunk layout.
//!
//! `ChunkLayout::from_total_columns` is the single place where a column count is split
//! into payload and ECC spans. The encoder, the zone classifier and the decoder all go
//! through it so they cannot disagree on where the payload ends.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::column::ROWS;

/// Left finder width in columns.
pub const LEFT_FINDER_COLS: usize = 3;
/// Left quiet zone width in columns.
pub const LEFT_QUIET_COLS: usize = 1;
/// Metadata width in columns (index high/low, total high/low).
pub const METADATA_COLS: usize = 4;
/// Right quiet zone width in columns.
pub const RIGHT_QUIET_COLS: usize = 1;
/// Right finder width in columns.
pub const RIGHT_FINDER_COLS: usize = 2;
/// Fixed per-chunk overhead in columns.
pub const OVERHEAD_COLS: usize =
    LEFT_FINDER_COLS + LEFT_QUIET_COLS + METADATA_COLS + RIGHT_QUIET_COLS + RIGHT_FINDER_COLS;
/// First metadata column.
pub const METADATA_START: usize = LEFT_FINDER_COLS + LEFT_QUIET_COLS;
/// First payload column.
pub const PAYLOAD_START: usize = METADATA_START + METADATA_COLS;

/// ECC columns per payload column (K = ceil(N / 4), i.e. a 0.25 ratio).
const ECC_DIVISOR: usize = 4;

/// Number of ECC columns for a payload of `payload` nibbles.
pub fn ecc_len(payload: usize) -> usize {
    payload.div_ceil(ECC_DIVISOR)
}

/// Largest payload N with `N + ecc_len(N) <= useful`.
pub fn max_payload(useful: usize) -> usize {
    // floor(useful / 1.25) never undershoots, so only a downward correction is needed.
    let mut n = useful * ECC_DIVISOR / (ECC_DIVISOR + 1);
    while n + ecc_len(n) > useful {
        n -= 1;
    }
    n
}

/// Payload nibbles per chunk that fit a horizontal pixel budget at a given strip height.
///
/// Cells are square with side `row_height_px / 8`. Returns 0 when the budget cannot hold
/// the 11 overhead columns plus at least one payload column.
pub fn solve_capacity(available_px: u32, row_height_px: u32) -> usize {
    if available_px == 0 || row_height_px == 0 {
        return 0;
    }
    // floor(available / (height / 8)) without going through floats
    let max_total_cols = (u64::from(available_px) * ROWS as u64 / u64::from(row_height_px)) as usize;
    match max_total_cols.checked_sub(OVERHEAD_COLS) {
        Some(useful) if useful > 0 => max_payload(useful),
        _ => 0,
    }
}

/// Column spans of one chunk, derived from its payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkLayout {
    /// Total column count.
    pub total_columns: usize,
    /// Payload columns (N).
    pub payload: usize,
    /// ECC columns (K).
    pub ecc: usize,
}

impl ChunkLayout {
    /// Layout the encoder emits for a run of `payload` nibbles.
    pub fn for_payload(payload: usize) -> Self {
        let ecc = ecc_len(payload);
        Self {
            total_columns: OVERHEAD_COLS + payload + ecc,
            payload,
            ecc,
        }
    }

    /// Recover the layout from a column count. `None` if narrower than the overhead.
    ///
    /// Takes the largest payload that fits; any leftover column is counted as ECC, so
    /// widths the encoder never produces come back with `is_canonical() == false`.
    pub fn from_total_columns(total_columns: usize) -> Option<Self> {
        let useful = total_columns.checked_sub(OVERHEAD_COLS)?;
        let payload = max_payload(useful);
        Some(Self {
            total_columns,
            payload,
            ecc: useful - payload,
        })
    }

    /// True when the ECC span has exactly the length the encoder would give this payload.
    pub fn is_canonical(&self) -> bool {
        self.ecc == ecc_len(self.payload)
    }

    /// Left finder columns.
    pub fn left_finder(&self) -> Range<usize> {
        0..LEFT_FINDER_COLS
    }

    /// Left quiet column.
    pub fn left_quiet(&self) -> usize {
        LEFT_FINDER_COLS
    }

    /// Chunk index metadata columns (high, low).
    pub fn meta_index(&self) -> Range<usize> {
        METADATA_START..METADATA_START + 2
    }

    /// Total chunk count metadata columns (high, low).
    pub fn meta_total(&self) -> Range<usize> {
        METADATA_START + 2..PAYLOAD_START
    }

    /// Payload columns.
    pub fn payload_range(&self) -> Range<usize> {
        PAYLOAD_START..PAYLOAD_START + self.payload
    }

    /// ECC columns.
    pub fn ecc_range(&self) -> Range<usize> {
        let start = PAYLOAD_START + self.payload;
        start..start + self.ecc
    }

    /// Right quiet column.
    pub fn right_quiet(&self) -> usize {
        self.total_columns - RIGHT_FINDER_COLS - RIGHT_QUIET_COLS
    }

    /// Right finder columns.
    pub fn right_finder(&self) -> Range<usize> {
        self.total_columns - RIGHT_FINDER_COLS..self.total_columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overhead_is_eleven() {
        assert_eq!(OVERHEAD_COLS, 11);
        assert_eq!(PAYLOAD_START, 8);
    }

    #[test]
    fn wide_budget() {
        // 2000px / 4px cells = 500 columns, 489 useful, 391 + 98 = 489
        assert_eq!(solve_capacity(2000, 32), 391);
    }

    #[test]
    fn budget_too_small() {
        // 50px / 4px = 12 columns, one useful column cannot hold N=1 plus K=1
        assert_eq!(solve_capacity(50, 32), 0);
        assert_eq!(solve_capacity(44, 32), 0);
        assert_eq!(solve_capacity(0, 32), 0);
        assert_eq!(solve_capacity(2000, 0), 0);
    }

    #[test]
    fn smallest_viable_budget() {
        // 13 columns: 2 useful, N=1 K=1
        assert_eq!(solve_capacity(52, 32), 1);
    }

    #[test]
    fn max_payload_is_exact() {
        for useful in 0..500 {
            let n = max_payload(useful);
            assert!(n + ecc_len(n) <= useful);
            assert!(n + 1 + ecc_len(n + 1) > useful);
        }
    }

    #[test]
    fn layout_round_trips_through_width() {
        for n in 1..400 {
            let layout = ChunkLayout::for_payload(n);
            let recovered = ChunkLayout::from_total_columns(layout.total_columns).unwrap();
            assert_eq!(recovered, layout);
            assert!(recovered.is_canonical());
        }
    }

    #[test]
    fn non_canonical_width() {
        // 11 + 6: N=4 fits with K=1, leaving one spare column
        let layout = ChunkLayout::from_total_columns(17).unwrap();
        assert_eq!(layout.payload, 4);
        assert_eq!(layout.ecc, 2);
        assert!(!layout.is_canonical());
    }

    #[test]
    fn spans_tile_the_chunk() {
        let layout = ChunkLayout::for_payload(10);
        assert_eq!(layout.left_finder(), 0..3);
        assert_eq!(layout.left_quiet(), 3);
        assert_eq!(layout.meta_index(), 4..6);
        assert_eq!(layout.meta_total(), 6..8);
        assert_eq!(layout.payload_range(), 8..18);
        assert_eq!(layout.ecc_range(), 18..21);
        assert_eq!(layout.right_quiet(), 21);
        assert_eq!(layout.right_finder(), 22..24);
        assert_eq!(layout.total_columns, 24);
    }

    #[test]
    fn too_narrow_has_no_layout() {
        assert!(ChunkLayout::from_total_columns(10).is_none());
        assert_eq!(ChunkLayout::from_total_columns(11).unwrap().payload, 0);
    }
}
