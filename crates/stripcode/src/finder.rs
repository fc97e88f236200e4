//! Left and right finder patterns.
//!
//! The left finder is three columns of `[1,1,1,0,0,1,1,1]`. In the enhanced protocol
//! its middle column loses row 1 on the first chunk and row 6 on the last chunk.
//!
//! The right finder is two columns of `[1,1,0,c,c,0,1,1]` where `c` is a control bit
//! repeated on rows 3 and 4. The pair of control bits (one per column) selects
//! EVEN `(1,0)`, ODD `(0,1)` or END `(1,1)`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capacity::{LEFT_FINDER_COLS, RIGHT_FINDER_COLS};
use crate::column::{Column, ROWS};
use crate::error::{Result, StripError};

/// Anchor pattern shared by all three left finder columns.
pub const LEFT_ANCHOR: [bool; ROWS] = [true, true, true, false, false, true, true, true];
/// Right finder template with both control rows clear.
pub const RIGHT_ANCHOR: [bool; ROWS] = [true, true, false, false, false, false, true, true];

/// Left finder column that carries the sequence markers.
const MARKER_COLUMN: usize = 1;
/// Hole row signalling the first chunk.
const FIRST_HOLE_ROW: usize = 1;
/// Hole row signalling the last chunk.
const LAST_HOLE_ROW: usize = 6;
/// Control rows of the right finder.
const CONTROL_ROWS: [usize; 2] = [3, 4];

/// Chunk state carried by the right finder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RightFinderState {
    /// Non-final chunk with an even index
    Even,
    /// Non-final chunk with an odd index
    Odd,
    /// Final chunk of the message
    End,
}

impl RightFinderState {
    /// State for a chunk; final-chunk status wins over index parity.
    pub fn for_chunk(index: usize, is_last: bool) -> Self {
        if is_last {
            RightFinderState::End
        } else if index % 2 == 0 {
            RightFinderState::Even
        } else {
            RightFinderState::Odd
        }
    }

    fn control_bits(self) -> (bool, bool) {
        match self {
            RightFinderState::Even => (true, false),
            RightFinderState::Odd => (false, true),
            RightFinderState::End => (true, true),
        }
    }

    fn from_control_bits(bits: (bool, bool)) -> Option<Self> {
        match bits {
            (true, false) => Some(RightFinderState::Even),
            (false, true) => Some(RightFinderState::Odd),
            (true, true) => Some(RightFinderState::End),
            (false, false) => None,
        }
    }
}

impl fmt::Display for RightFinderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RightFinderState::Even => write!(f, "EVEN"),
            RightFinderState::Odd => write!(f, "ODD"),
            RightFinderState::End => write!(f, "END"),
        }
    }
}

/// First/last chunk holes found in the left finder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SequenceMarkers {
    /// Hole at row 1 of the middle column
    pub first: bool,
    /// Hole at row 6 of the middle column
    pub last: bool,
}

/// Build the left finder. Holes are punched only when `markers` is set.
pub fn left_finder(index: usize, total: usize, markers: bool) -> [Column; LEFT_FINDER_COLS] {
    let anchor = Column::from_bits(LEFT_ANCHOR);
    let mut cols = [anchor; LEFT_FINDER_COLS];
    if markers {
        if index == 0 {
            cols[MARKER_COLUMN] = cols[MARKER_COLUMN].with(FIRST_HOLE_ROW, false);
        }
        if index + 1 == total {
            cols[MARKER_COLUMN] = cols[MARKER_COLUMN].with(LAST_HOLE_ROW, false);
        }
    }
    cols
}

/// Build the right finder for a state.
pub fn right_finder(state: RightFinderState) -> [Column; RIGHT_FINDER_COLS] {
    let (bit0, bit1) = state.control_bits();
    let set = |bit: bool| {
        CONTROL_ROWS
            .iter()
            .fold(Column::from_bits(RIGHT_ANCHOR), |col, &row| col.with(row, bit))
    };
    [set(bit0), set(bit1)]
}

/// Validate a sampled left finder and read its sequence markers.
pub fn read_left_finder(cols: &[Column]) -> Result<SequenceMarkers> {
    if cols.len() != LEFT_FINDER_COLS {
        return Err(StripError::FinderNotFound(format!(
            "left finder needs {LEFT_FINDER_COLS} columns, got {}",
            cols.len()
        )));
    }
    for (x, col) in cols.iter().enumerate() {
        for (row, &expected) in LEFT_ANCHOR.iter().enumerate() {
            let may_be_hole =
                x == MARKER_COLUMN && (row == FIRST_HOLE_ROW || row == LAST_HOLE_ROW);
            if col[row] != expected && !may_be_hole {
                return Err(StripError::FinderNotFound(format!(
                    "left finder mismatch at column {x} row {row}"
                )));
            }
        }
    }
    let marker = cols[MARKER_COLUMN];
    Ok(SequenceMarkers {
        first: !marker[FIRST_HOLE_ROW],
        last: !marker[LAST_HOLE_ROW],
    })
}

/// Validate a sampled right finder and read its state.
pub fn read_right_finder(cols: &[Column]) -> Result<RightFinderState> {
    if cols.len() != RIGHT_FINDER_COLS {
        return Err(StripError::FinderNotFound(format!(
            "right finder needs {RIGHT_FINDER_COLS} columns, got {}",
            cols.len()
        )));
    }
    for (x, col) in cols.iter().enumerate() {
        for (row, &expected) in RIGHT_ANCHOR.iter().enumerate() {
            if !CONTROL_ROWS.contains(&row) && col[row] != expected {
                return Err(StripError::FinderNotFound(format!(
                    "right finder mismatch at column {x} row {row}"
                )));
            }
        }
        if col[CONTROL_ROWS[0]] != col[CONTROL_ROWS[1]] {
            return Err(StripError::FinderNotFound(format!(
                "right finder column {x} has split control rows"
            )));
        }
    }
    let bits = (cols[0][CONTROL_ROWS[0]], cols[1][CONTROL_ROWS[0]]);
    RightFinderState::from_control_bits(bits)
        .ok_or_else(|| StripError::FinderNotFound("right finder control bits are both clear".into()))
}

/// Read the right finder state without validating the anchor rows.
/// `None` when both control bits are clear or a column is missing.
pub(crate) fn peek_right_state(cols: &[Column]) -> Option<RightFinderState> {
    let bit0 = cols.first()?[CONTROL_ROWS[0]];
    let bit1 = cols.get(1)?[CONTROL_ROWS[0]];
    RightFinderState::from_control_bits((bit0, bit1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_precedence() {
        assert_eq!(RightFinderState::for_chunk(0, false), RightFinderState::Even);
        assert_eq!(RightFinderState::for_chunk(3, false), RightFinderState::Odd);
        assert_eq!(RightFinderState::for_chunk(4, true), RightFinderState::End);
        assert_eq!(RightFinderState::for_chunk(5, true), RightFinderState::End);
    }

    #[test]
    fn right_finder_round_trips() {
        for state in [RightFinderState::Even, RightFinderState::Odd, RightFinderState::End] {
            let cols = right_finder(state);
            assert_eq!(read_right_finder(&cols).unwrap(), state);
        }
    }

    #[test]
    fn right_finder_control_rows_repeat() {
        let [c0, c1] = right_finder(RightFinderState::Even);
        assert!(c0[3] && c0[4]);
        assert!(!c1[3] && !c1[4]);
    }

    #[test]
    fn cleared_control_bits_rejected() {
        let cols = [Column::from_bits(RIGHT_ANCHOR); 2];
        assert!(matches!(read_right_finder(&cols), Err(StripError::FinderNotFound(_))));
    }

    #[test]
    fn base_left_finder_has_no_holes() {
        let cols = left_finder(0, 1, false);
        assert!(cols.iter().all(|c| c.bits() == LEFT_ANCHOR));
        assert_eq!(read_left_finder(&cols).unwrap(), SequenceMarkers::default());
    }

    #[test]
    fn markers_follow_position() {
        let first = read_left_finder(&left_finder(0, 3, true)).unwrap();
        let middle = read_left_finder(&left_finder(1, 3, true)).unwrap();
        let last = read_left_finder(&left_finder(2, 3, true)).unwrap();
        let only = read_left_finder(&left_finder(0, 1, true)).unwrap();
        assert_eq!(first, SequenceMarkers { first: true, last: false });
        assert_eq!(middle, SequenceMarkers { first: false, last: false });
        assert_eq!(last, SequenceMarkers { first: false, last: true });
        assert_eq!(only, SequenceMarkers { first: true, last: true });
    }

    #[test]
    fn hole_outside_marker_cells_rejected() {
        let mut cols = left_finder(1, 3, true);
        cols[0] = cols[0].with(1, false);
        assert!(read_left_finder(&cols).is_err());
    }
}
