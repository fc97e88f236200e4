//! Sequence reassembly of decoded chunks.
//!
//! Chunks may arrive in any order and some may never arrive. The reassembler keeps the
//! first chunk seen for each index, concatenates what it has in index order and never
//! pads gaps; completeness is something callers query, not an error.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::decoder::DecodedChunk;
use crate::nibble::text_from_nibbles;

/// Streaming accumulator for the chunks of one message.
#[derive(Debug, Default, Clone)]
pub struct Reassembler {
    chunks: BTreeMap<u8, DecodedChunk>,
    expected_total: Option<u8>,
}

impl Reassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a chunk. Returns false if it was rejected: a duplicate index (first seen
    /// wins), a total that disagrees with earlier chunks, or an index outside its total.
    pub fn push(&mut self, chunk: DecodedChunk) -> bool {
        if chunk.index >= chunk.total {
            warn!(index = chunk.index, total = chunk.total, "chunk index outside its total");
            return false;
        }
        if let Some(expected) = self.expected_total {
            if expected != chunk.total {
                warn!(
                    index = chunk.index,
                    total = chunk.total,
                    expected,
                    "chunk belongs to a different message"
                );
                return false;
            }
        }
        if self.chunks.contains_key(&chunk.index) {
            debug!(index = chunk.index, "duplicate chunk ignored");
            return false;
        }
        self.expected_total = Some(chunk.total);
        self.chunks.insert(chunk.index, chunk);
        true
    }

    /// Offer several chunks in arrival order; returns how many were accepted.
    pub fn extend<I: IntoIterator<Item = DecodedChunk>>(&mut self, chunks: I) -> usize {
        chunks
            .into_iter()
            .map(|c| self.push(c))
            .filter(|&accepted| accepted)
            .count()
    }

    /// Number of distinct chunks held.
    pub fn present_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total announced by the accepted chunks, once any has arrived.
    pub fn expected_total(&self) -> Option<usize> {
        self.expected_total.map(usize::from)
    }

    /// True once every index of the message is present.
    pub fn is_complete(&self) -> bool {
        self.expected_total() == Some(self.present_count())
    }

    /// Indices still missing, ascending. Empty before the first chunk arrives.
    pub fn missing_indices(&self) -> Vec<u8> {
        match self.expected_total {
            Some(total) => (0..total).filter(|i| !self.chunks.contains_key(i)).collect(),
            None => Vec::new(),
        }
    }

    /// Accepted chunks in index order.
    pub fn chunks(&self) -> impl Iterator<Item = &DecodedChunk> {
        self.chunks.values()
    }

    /// Per-chunk payload capacity, known from any non-final chunk.
    fn stride(&self) -> Option<usize> {
        self.chunks
            .values()
            .find(|c| !c.is_last())
            .map(|c| c.nibbles.len())
    }

    /// Best-effort text from the chunks present, in index order.
    ///
    /// Contiguous indices are joined at the nibble level, so characters split across
    /// a chunk boundary survive. Across a gap, orphaned half characters are dropped.
    pub fn assemble(&self) -> String {
        let stride = self.stride();
        let mut out = String::new();
        let mut run: Vec<u8> = Vec::new();
        let mut run_offset = 0;
        let mut prev: Option<usize> = None;

        for (&index, chunk) in &self.chunks {
            let index = usize::from(index);
            if prev.map_or(true, |p| p + 1 != index) {
                flush_run(&mut out, &run, run_offset);
                run.clear();
                run_offset = stride.map_or(0, |s| index * s);
            }
            run.extend_from_slice(&chunk.nibbles);
            prev = Some(index);
        }
        flush_run(&mut out, &run, run_offset);
        out
    }
}

/// Append a run of contiguous nibbles, skipping a leading low nibble when the run
/// starts mid-character.
fn flush_run(out: &mut String, run: &[u8], offset: usize) {
    let skip = (offset % 2).min(run.len());
    out.push_str(&text_from_nibbles(&run[skip..]));
}

/// Reassemble a batch of decoded chunks (first seen wins per index).
pub fn assemble(chunks: &[DecodedChunk]) -> String {
    let mut reassembler = Reassembler::new();
    reassembler.extend(chunks.iter().cloned());
    reassembler.assemble()
}
