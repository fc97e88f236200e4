//! Row-7 timeline track of the enhanced protocol.
//!
//! Payload columns cycle through 19 slots keyed by their global payload index:
//! 12 clock slots (inverse of row 0), 3 SYNC slots (always filled) and 4 POS slots
//! carrying a coarse relative-position nibble, MSB first. The clock never produces
//! three filled cells in a row, so the SYNC burst is unambiguous.

use serde::{Deserialize, Serialize};

use crate::column::clock_bit;

/// Length of one timeline cycle in payload columns.
pub const CYCLE_LEN: usize = 19;
/// Clock slots at the start of each cycle.
pub const CLOCK_SLOTS: usize = 12;
/// SYNC slots following the clock.
pub const SYNC_SLOTS: usize = 3;
/// POS slots closing the cycle.
pub const POS_SLOTS: usize = 4;

const SYNC_START: usize = CLOCK_SLOTS;
const POS_START: usize = CLOCK_SLOTS + SYNC_SLOTS;
const MAX_POSITION: usize = 15;

/// Role of one slot in the timeline cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSlot {
    /// Inverse clock
    Clock,
    /// Filled sync cell
    Sync,
    /// One bit of the position nibble; `bit` counts down from 3 (MSB) to 0
    Position {
        /// Bit of the nibble carried by this slot.
        bit: u8,
    },
}

/// Slot for a cycle position in `0..CYCLE_LEN`.
pub fn slot(cycle_pos: usize) -> TrackSlot {
    match cycle_pos % CYCLE_LEN {
        p if p < SYNC_START => TrackSlot::Clock,
        p if p < POS_START => TrackSlot::Sync,
        p => TrackSlot::Position {
            bit: (POS_START + POS_SLOTS - 1 - p) as u8,
        },
    }
}

/// Timeline generator for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineTrack {
    total_nibbles: usize,
}

impl TimelineTrack {
    /// Track for a message of `total_nibbles` payload nibbles.
    pub fn new(total_nibbles: usize) -> Self {
        Self { total_nibbles }
    }

    /// Position nibble for a POS window starting at `window_start`:
    /// `floor(window_start / total * 15)`, clamped to 15.
    pub fn position_nibble(&self, window_start: usize) -> u8 {
        if self.total_nibbles == 0 {
            return 0;
        }
        (window_start * MAX_POSITION / self.total_nibbles).min(MAX_POSITION) as u8
    }

    /// Row-7 bit for the payload column at `global_index`, placed at `local_x` within its chunk.
    pub fn bit(&self, global_index: usize, local_x: usize) -> bool {
        let cycle_pos = global_index % CYCLE_LEN;
        match slot(cycle_pos) {
            TrackSlot::Clock => !clock_bit(local_x),
            TrackSlot::Sync => true,
            TrackSlot::Position { bit } => {
                let window_start = global_index - (cycle_pos - POS_START);
                (self.position_nibble(window_start) >> bit) & 1 == 1
            }
        }
    }
}

/// One POS window read back from a locked span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReading {
    /// Offset of the window's first column within the scanned span.
    pub offset: usize,
    /// Relative position, in sixteenths of the whole message.
    pub value: u8,
}

/// Cycle alignment recovered from a fragment's row-7 track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineLock {
    /// Cycle position of the span's first column.
    pub phase: usize,
    /// Complete POS windows found in the span, in order.
    pub positions: Vec<PositionReading>,
}

impl TimelineLock {
    /// Coarse relative position of the fragment: the first complete POS window.
    pub fn first_position(&self) -> Option<u8> {
        self.positions.first().map(|p| p.value)
    }
}

/// Find the unique cycle phase that explains a span of payload columns.
///
/// `track` holds the row-7 bits and `clock` the row-0 bits of the same columns. A phase
/// is consistent when every clock slot carries the inverse of row 0 and every SYNC slot
/// is filled. A candidate phase must also place one complete SYNC burst inside the span;
/// partial bursts at the edges are not enough to anchor on. Returns `None` when no phase
/// qualifies (short spans, base-protocol spans) or when several do.
pub fn lock(track: &[bool], clock: &[bool]) -> Option<TimelineLock> {
    if track.len() != clock.len() || track.len() < SYNC_SLOTS {
        return None;
    }
    let mut found = None;
    for phase in 0..CYCLE_LEN {
        let has_burst =
            (0..=track.len() - SYNC_SLOTS).any(|j| (phase + j) % CYCLE_LEN == SYNC_START);
        if !has_burst {
            continue;
        }
        let consistent = track
            .iter()
            .zip(clock)
            .enumerate()
            .all(|(j, (&t, &c))| match slot(phase + j) {
                TrackSlot::Clock => t == !c,
                TrackSlot::Sync => t,
                TrackSlot::Position { .. } => true,
            });
        if consistent {
            if found.is_some() {
                return None;
            }
            found = Some(phase);
        }
    }
    let phase = found?;
    let positions = (0..track.len())
        .filter(|&j| (phase + j) % CYCLE_LEN == POS_START && j + POS_SLOTS <= track.len())
        .map(|j| PositionReading {
            offset: j,
            value: track[j..j + POS_SLOTS]
                .iter()
                .fold(0u8, |acc, &b| (acc << 1) | b as u8),
        })
        .collect();
    Some(TimelineLock { phase, positions })
}
