//! Structural zone classification of chunk cells.
//!
//! Precedence: full-height zones (finders, quiet columns) first, then the row bands
//! (clock, parity, separator, timeline) that run across the metadata, payload and ECC
//! span, then the data block the column belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capacity::{ChunkLayout, METADATA_START};
use crate::chunk::Chunk;
use crate::column::{ROWS, ROW_CLOCK, ROW_DATA_FIRST, ROW_PARITY, ROW_SEPARATOR, ROW_TRACK};
use crate::finder::{peek_right_state, RightFinderState};

/// Zone identifier for a chunk cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    /// Left finder columns
    FinderL,
    /// Left quiet column
    QuietL,
    /// Chunk index metadata
    MetaIdx,
    /// Total chunk count metadata
    MetaTot,
    /// Payload nibbles
    Payload,
    /// Rolling checksum block
    EccBlk,
    /// Right quiet column
    QuietR,
    /// Right finder, even chunk
    RfEven,
    /// Right finder, odd chunk
    RfOdd,
    /// Right finder, final chunk
    RfEnd,
    /// Row 0 band
    RowClock,
    /// Row 5 band
    RowParity,
    /// Row 6 band
    RowSeparator,
    /// Row 7 band
    RowTimeline,
}

impl Zone {
    /// Short uppercase identifier.
    pub fn label(self) -> &'static str {
        match self {
            Zone::FinderL => "FINDER_L",
            Zone::QuietL => "QUIET_L",
            Zone::MetaIdx => "META_IDX",
            Zone::MetaTot => "META_TOT",
            Zone::Payload => "PAYLOAD",
            Zone::EccBlk => "ECC_BLK",
            Zone::QuietR => "QUIET_R",
            Zone::RfEven => "RF_EVEN",
            Zone::RfOdd => "RF_ODD",
            Zone::RfEnd => "RF_END",
            Zone::RowClock => "ROW_CLOCK",
            Zone::RowParity => "ROW_PARITY",
            Zone::RowSeparator => "ROW_SEPARATOR",
            Zone::RowTimeline => "ROW_TIMELINE",
        }
    }

    /// Zones that cover all eight rows of their columns.
    pub fn is_full_height(self) -> bool {
        matches!(
            self,
            Zone::FinderL | Zone::QuietL | Zone::QuietR | Zone::RfEven | Zone::RfOdd | Zone::RfEnd
        )
    }

    /// Zones that are a single row across the data span.
    pub fn is_row_band(self) -> bool {
        matches!(
            self,
            Zone::RowClock | Zone::RowParity | Zone::RowSeparator | Zone::RowTimeline
        )
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<RightFinderState> for Zone {
    fn from(state: RightFinderState) -> Self {
        match state {
            RightFinderState::Even => Zone::RfEven,
            RightFinderState::Odd => Zone::RfOdd,
            RightFinderState::End => Zone::RfEnd,
        }
    }
}

/// Merged rectangle of one zone, in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneRect {
    /// Zone covered by the rectangle.
    pub zone: Zone,
    /// First column.
    pub x: usize,
    /// First row.
    pub y: usize,
    /// Width in columns.
    pub w: usize,
    /// Height in rows.
    pub h: usize,
}

/// Column-range zone of a column, ignoring rows.
///
/// The right finder is labelled from its control bits without validation so damaged
/// chunks can still be inspected. A finder with both control bits clear carries no
/// state; it is labelled [`Zone::RfOdd`], the state that sets only the second column.
pub fn column_zone(chunk: &Chunk, col: usize) -> Option<Zone> {
    let layout = chunk.layout()?;
    column_zone_in(chunk, &layout, col)
}

fn column_zone_in(chunk: &Chunk, layout: &ChunkLayout, col: usize) -> Option<Zone> {
    if col >= layout.total_columns {
        return None;
    }
    let zone = if layout.left_finder().contains(&col) {
        Zone::FinderL
    } else if col == layout.left_quiet() {
        Zone::QuietL
    } else if layout.meta_index().contains(&col) {
        Zone::MetaIdx
    } else if layout.meta_total().contains(&col) {
        Zone::MetaTot
    } else if col == layout.right_quiet() {
        Zone::QuietR
    } else if layout.right_finder().contains(&col) {
        peek_right_state(&chunk.columns()[layout.right_finder()])
            .unwrap_or(RightFinderState::Odd)
            .into()
    } else if layout.payload_range().contains(&col) {
        Zone::Payload
    } else {
        Zone::EccBlk
    };
    Some(zone)
}

fn row_band(row: usize) -> Option<Zone> {
    match row {
        ROW_CLOCK => Some(Zone::RowClock),
        ROW_PARITY => Some(Zone::RowParity),
        ROW_SEPARATOR => Some(Zone::RowSeparator),
        ROW_TRACK => Some(Zone::RowTimeline),
        _ => None,
    }
}

/// Zone of a single cell. `None` outside the chunk or for chunks narrower than the overhead.
pub fn classify(chunk: &Chunk, col: usize, row: usize) -> Option<Zone> {
    if row >= ROWS {
        return None;
    }
    let zone = column_zone(chunk, col)?;
    if zone.is_full_height() {
        return Some(zone);
    }
    Some(row_band(row).unwrap_or(zone))
}

/// Merged rectangle the cell belongs to, as drawn by an inspection overlay.
pub fn zone_rect(chunk: &Chunk, col: usize, row: usize) -> Option<ZoneRect> {
    let layout = chunk.layout()?;
    let zone = classify(chunk, col, row)?;
    let span = |range: std::ops::Range<usize>| (range.start, range.len());
    let (x, w) = match zone {
        Zone::FinderL => span(layout.left_finder()),
        Zone::QuietL => (layout.left_quiet(), 1),
        Zone::QuietR => (layout.right_quiet(), 1),
        Zone::RfEven | Zone::RfOdd | Zone::RfEnd => span(layout.right_finder()),
        Zone::RowClock | Zone::RowParity | Zone::RowSeparator | Zone::RowTimeline => {
            (METADATA_START, layout.right_quiet() - METADATA_START)
        }
        Zone::MetaIdx => span(layout.meta_index()),
        Zone::MetaTot => span(layout.meta_total()),
        Zone::Payload => span(layout.payload_range()),
        Zone::EccBlk => span(layout.ecc_range()),
    };
    let (y, h) = if zone.is_full_height() {
        (0, ROWS)
    } else if zone.is_row_band() {
        (row, 1)
    } else {
        (ROW_DATA_FIRST, 4)
    };
    Some(ZoneRect { zone, x, y, w, h })
}

/// Every distinct zone rectangle of a chunk, in column-major order of first appearance.
pub fn zone_map(chunk: &Chunk) -> Vec<ZoneRect> {
    let mut rects: Vec<ZoneRect> = Vec::new();
    for col in 0..chunk.width() {
        for row in 0..ROWS {
            if let Some(rect) = zone_rect(chunk, col, row) {
                if !rects.contains(&rect) {
                    rects.push(rect);
                }
            }
        }
    }
    rects
}
