//! Immutable chunk: the unit of rendering and scanning

use serde::{Deserialize, Serialize};

use crate::capacity::ChunkLayout;
use crate::column::{Column, ROWS};

/// One self-contained strip segment, an ordered list of 8-row columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chunk {
    columns: Vec<Column>,
}

impl Chunk {
    /// Wrap a column sequence.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// All columns, left to right.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Cell value, or `None` outside the chunk.
    pub fn bit(&self, col: usize, row: usize) -> Option<bool> {
        if row >= ROWS {
            return None;
        }
        self.columns.get(col).map(|c| c[row])
    }

    /// Zone layout derived from the column count.
    pub fn layout(&self) -> Option<ChunkLayout> {
        ChunkLayout::from_total_columns(self.columns.len())
    }

    /// Payload nibbles as stored in rows 1-4 of the payload span.
    pub fn payload_nibbles(&self) -> Vec<u8> {
        self.layout()
            .map(|layout| {
                self.columns[layout.payload_range()]
                    .iter()
                    .map(Column::nibble)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `[column][row]` boolean matrix, the shape the decoder consumes.
    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        self.columns.iter().map(|&c| c.into()).collect()
    }
}
