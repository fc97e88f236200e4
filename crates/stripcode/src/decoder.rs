//! Chunk decoder: sampled bit matrix → decoded chunk record.
//!
//! Decoding is best effort. Structural problems (too few columns, ragged rows, missing
//! finders, impossible widths or metadata) reject the chunk; parity and ECC mismatches
//! are reported on the record and decoding carries on.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capacity::{ChunkLayout, OVERHEAD_COLS};
use crate::chunk::Chunk;
use crate::column::{Column, ROW_CLOCK, ROW_TRACK};
use crate::ecc;
use crate::error::{Result, StripError};
use crate::finder::{read_left_finder, read_right_finder, RightFinderState, SequenceMarkers};
use crate::nibble::text_from_nibbles;
use crate::timeline::{lock, TimelineLock};

/// Everything recovered from one sampled chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedChunk {
    /// Zero-based chunk index
    pub index: u8,
    /// Total chunk count of the message
    pub total: u8,
    /// Payload nibbles in order
    pub nibbles: Vec<u8>,
    /// Payload positions whose parity bit disagreed with their data rows
    pub suspect: Vec<usize>,
    /// All four metadata columns passed parity
    pub metadata_parity_ok: bool,
    /// The stored ECC block matches the one regenerated from the payload
    pub ecc_ok: bool,
    /// State read from the right finder
    pub right_finder: RightFinderState,
    /// First/last holes read from the left finder
    pub markers: SequenceMarkers,
    /// Timeline alignment, when the payload row 7 locks to a unique phase
    pub timeline: Option<TimelineLock>,
}

impl DecodedChunk {
    /// This chunk's own substring: its nibbles paired into characters.
    pub fn text(&self) -> String {
        text_from_nibbles(&self.nibbles)
    }

    /// True if the metadata says this is the final chunk.
    pub fn is_last(&self) -> bool {
        self.index as usize + 1 == self.total as usize
    }

    /// No parity failures and a matching ECC block.
    pub fn is_clean(&self) -> bool {
        self.suspect.is_empty() && self.metadata_parity_ok && self.ecc_ok
    }
}

/// Decode a `[column][row]` matrix, reporting why it was rejected.
pub fn try_decode(matrix: &[Vec<bool>]) -> Result<DecodedChunk> {
    if matrix.len() < OVERHEAD_COLS {
        return Err(StripError::TooFewColumns {
            columns: matrix.len(),
            minimum: OVERHEAD_COLS,
        });
    }
    let columns = matrix
        .iter()
        .enumerate()
        .map(|(column, bits)| {
            Column::from_slice(bits).ok_or(StripError::RaggedColumn {
                column,
                rows: bits.len(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    decode_columns(&columns)
}

/// Decode a sampled matrix; `None` for unrecoverable chunks.
pub fn decode(matrix: &[Vec<bool>]) -> Option<DecodedChunk> {
    match try_decode(matrix) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            debug!(error = %e, columns = matrix.len(), "chunk rejected");
            None
        }
    }
}

/// Decode an in-memory chunk, e.g. straight from the encoder.
pub fn decode_chunk(chunk: &Chunk) -> Result<DecodedChunk> {
    decode_columns(chunk.columns())
}

fn decode_columns(cols: &[Column]) -> Result<DecodedChunk> {
    let layout = ChunkLayout::from_total_columns(cols.len()).ok_or(StripError::TooFewColumns {
        columns: cols.len(),
        minimum: OVERHEAD_COLS,
    })?;
    if layout.payload == 0 {
        return Err(StripError::NoPayload {
            columns: cols.len(),
        });
    }
    if !layout.is_canonical() {
        return Err(StripError::Malformed(format!(
            "{} columns do not split into payload and ECC",
            cols.len()
        )));
    }

    let markers = read_left_finder(&cols[layout.left_finder()])?;
    let right_finder = read_right_finder(&cols[layout.right_finder()])?;

    let meta = &cols[layout.meta_index().start..layout.meta_total().end];
    let metadata_parity_ok = meta.iter().all(Column::parity_ok);
    let index = (meta[0].nibble() << 4) | meta[1].nibble();
    let total = (meta[2].nibble() << 4) | meta[3].nibble();
    if total == 0 || index >= total {
        return Err(StripError::Malformed(format!(
            "chunk index {index} outside total {total}"
        )));
    }

    let payload = &cols[layout.payload_range()];
    let nibbles: Vec<u8> = payload.iter().map(Column::nibble).collect();
    let suspect: Vec<usize> = payload
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.parity_ok())
        .map(|(i, _)| i)
        .collect();

    let stored_ecc: Vec<u8> = cols[layout.ecc_range()].iter().map(Column::nibble).collect();
    let ecc_ok = ecc::verify(&nibbles, &stored_ecc);

    let track: Vec<bool> = payload.iter().map(|c| c[ROW_TRACK]).collect();
    let clock: Vec<bool> = payload.iter().map(|c| c[ROW_CLOCK]).collect();
    let timeline = lock(&track, &clock);

    let decoded = DecodedChunk {
        index,
        total,
        nibbles,
        suspect,
        metadata_parity_ok,
        ecc_ok,
        right_finder,
        markers,
        timeline,
    };

    if !decoded.suspect.is_empty() || !metadata_parity_ok {
        warn!(
            index,
            suspect = decoded.suspect.len(),
            metadata_parity_ok,
            "parity mismatch in decoded chunk"
        );
    }
    if (right_finder == RightFinderState::End) != decoded.is_last() {
        warn!(index, total, state = %right_finder, "right finder disagrees with metadata");
    }
    debug!(
        index,
        total,
        payload = layout.payload,
        ecc_ok,
        locked = decoded.timeline.is_some(),
        "decoded chunk"
    );
    Ok(decoded)
}
