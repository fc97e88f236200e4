#![warn(missing_docs)]

//! Stripcode engine: a 1-D/2-D hybrid optical encoding of text into 8-row chunks
//!
//! Encode path: Text → Nibbles (split-byte) → Runs (capacity solver) → Chunks
//!   (finders, metadata, payload + timeline, rolling ECC)
//! Decode path: Sampled matrix → Layout → Finders/Metadata/Payload → Reassembler → Text

pub mod assemble;
pub mod capacity;
pub mod chunk;
pub mod column;
pub mod config;
pub mod decoder;
pub mod ecc;
pub mod encoder;
pub mod error;
pub mod finder;
pub mod nibble;
pub mod timeline;
pub mod zone;

pub use assemble::{assemble, Reassembler};
pub use capacity::{solve_capacity, ChunkLayout, OVERHEAD_COLS};
pub use chunk::Chunk;
pub use column::{Column, ROWS};
pub use config::{EncoderConfig, Protocol};
pub use decoder::{decode, decode_chunk, try_decode, DecodedChunk};
pub use encoder::{encode, Encoder, MAX_CHUNKS};
pub use error::{Result, StripError};
pub use finder::{RightFinderState, SequenceMarkers};
pub use nibble::{nibbles_from_text, text_from_nibbles};
pub use timeline::{PositionReading, TimelineLock, TimelineTrack};
pub use zone::{classify, column_zone, zone_map, zone_rect, Zone, ZoneRect};
