//! Chunk encoder: text → ordered chunk sequence.
//!
//! Layout of every chunk:
//! `[LeftFinder 3][LeftQuiet 1][Meta 4][Payload N][ECC K][RightQuiet 1][RightFinder 2]`

use tracing::{debug, instrument};

use crate::capacity::{solve_capacity, ChunkLayout};
use crate::chunk::Chunk;
use crate::column::{clock_bit, data_column, standard_column, Column};
use crate::config::EncoderConfig;
use crate::ecc::ecc_block;
use crate::error::{Result, StripError};
use crate::finder::{left_finder, right_finder, RightFinderState};
use crate::nibble::nibbles_from_text;
use crate::timeline::TimelineTrack;

/// Largest chunk count the one-byte metadata fields can carry.
pub const MAX_CHUNKS: usize = 0xFF;

/// Stateless chunk encoder. Safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    config: EncoderConfig,
}

/// Position of one payload run within the message.
struct RunPlacement {
    index: usize,
    total: usize,
    /// Global payload index of the run's first nibble.
    global_offset: usize,
}

impl Encoder {
    /// Create an encoder.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// The encoder's configuration.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode text into chunks sized for a pixel budget.
    ///
    /// Empty text yields `Ok(vec![])`. Non-empty text that does not fit a single
    /// payload nibble fails with [`StripError::CapacityExceeded`].
    #[instrument(skip(self, text), fields(chars = text.chars().count(), protocol = %self.config.protocol))]
    pub fn encode(&self, text: &str, available_px: u32, row_height_px: u32) -> Result<Vec<Chunk>> {
        let nibbles = nibbles_from_text(text)?;
        if nibbles.is_empty() {
            return Ok(Vec::new());
        }
        let capacity = solve_capacity(available_px, row_height_px);
        if capacity == 0 {
            return Err(StripError::CapacityExceeded {
                available_px,
                row_height_px,
            });
        }
        self.encode_nibbles(&nibbles, capacity)
    }

    /// Encode a nibble sequence into runs of at most `capacity` nibbles per chunk.
    pub fn encode_nibbles(&self, nibbles: &[u8], capacity: usize) -> Result<Vec<Chunk>> {
        if nibbles.is_empty() || capacity == 0 {
            return Ok(Vec::new());
        }
        let total = nibbles.len().div_ceil(capacity);
        if total > MAX_CHUNKS {
            return Err(StripError::TooManyChunks {
                needed: total,
                max: MAX_CHUNKS,
            });
        }

        let track = TimelineTrack::new(nibbles.len());
        let mut global_offset = 0;
        let mut chunks = Vec::with_capacity(total);
        for (index, run) in nibbles.chunks(capacity).enumerate() {
            let placement = RunPlacement {
                index,
                total,
                global_offset,
            };
            chunks.push(self.build_chunk(run, &placement, &track));
            global_offset += run.len();
        }
        debug!(
            nibbles = nibbles.len(),
            capacity,
            chunks = chunks.len(),
            "encoded message"
        );
        Ok(chunks)
    }

    fn build_chunk(&self, run: &[u8], at: &RunPlacement, track: &TimelineTrack) -> Chunk {
        let protocol = self.config.protocol;
        let layout = ChunkLayout::for_payload(run.len());
        let mut cols: Vec<Column> = Vec::with_capacity(layout.total_columns);

        cols.extend(left_finder(at.index, at.total, protocol.has_sequence_markers()));
        cols.push(Column::EMPTY);

        // Metadata: both fields are one byte, high nibble first
        for value in [at.index >> 4, at.index, at.total >> 4, at.total] {
            let x = cols.len();
            cols.push(standard_column((value & 0x0F) as u8, x));
        }

        for (i, &nibble) in run.iter().enumerate() {
            let x = cols.len();
            let row7 = if protocol.has_timeline() {
                track.bit(at.global_offset + i, x)
            } else {
                !clock_bit(x)
            };
            cols.push(data_column(nibble, x, row7));
        }

        for value in ecc_block(run) {
            let x = cols.len();
            cols.push(standard_column(value, x));
        }

        cols.push(Column::EMPTY);
        let is_last = at.index + 1 == at.total;
        cols.extend(right_finder(RightFinderState::for_chunk(at.index, is_last)));

        debug_assert_eq!(cols.len(), layout.total_columns);
        debug!(
            index = at.index,
            total = at.total,
            payload = layout.payload,
            ecc = layout.ecc,
            columns = cols.len(),
            "built chunk"
        );
        Chunk::from_columns(cols)
    }
}

/// Encode with the default (enhanced) protocol.
pub fn encode(text: &str, available_px: u32, row_height_px: u32) -> Result<Vec<Chunk>> {
    Encoder::default().encode(text, available_px, row_height_px)
}
