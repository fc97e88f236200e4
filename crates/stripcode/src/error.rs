//! Error types for the stripcode engine

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, StripError>;

/// All errors that can occur while encoding or decoding a strip
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StripError {
    /// The width budget cannot hold the fixed overhead plus one payload nibble
    #[error("Capacity exceeded: {available_px}px at row height {row_height_px}px cannot hold any payload")]
    CapacityExceeded {
        /// Horizontal pixel budget that was requested.
        available_px: u32,
        /// Height of one strip in pixels.
        row_height_px: u32,
    },
    /// A character does not fit in a single byte
    #[error("Unsupported character {ch:?} at position {position}: only code points up to U+00FF can be encoded")]
    UnsupportedCharacter {
        /// The offending character.
        ch: char,
        /// Character index within the input text.
        position: usize,
    },
    /// The message would need more chunks than the one-byte metadata fields can address
    #[error("Too many chunks: message needs {needed}, metadata can address at most {max}")]
    TooManyChunks {
        /// Chunks the message would need.
        needed: usize,
        /// Largest addressable chunk count.
        max: usize,
    },
    /// Sampled matrix is narrower than the fixed overhead
    #[error("Too few columns: got {columns}, need at least {minimum}")]
    TooFewColumns {
        /// Columns present in the sampled matrix.
        columns: usize,
        /// Minimum viable column count.
        minimum: usize,
    },
    /// A sampled column does not have exactly eight rows
    #[error("Ragged matrix: column {column} has {rows} rows, expected 8")]
    RaggedColumn {
        /// Index of the offending column.
        column: usize,
        /// Number of rows it carried.
        rows: usize,
    },
    /// The layout derived from the column count leaves no room for payload
    #[error("No payload: {columns} columns leave no payload span")]
    NoPayload {
        /// Columns present in the sampled matrix.
        columns: usize,
    },
    /// A finder pattern is missing or damaged
    #[error("Finder not found: {0}")]
    FinderNotFound(String),
    /// Structurally plausible but inconsistent chunk contents
    #[error("Malformed chunk: {0}")]
    Malformed(String),
}

impl StripError {
    /// True for errors caused by the sampled input rather than by the caller's text or budget.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            StripError::TooFewColumns { .. }
                | StripError::RaggedColumn { .. }
                | StripError::NoPayload { .. }
                | StripError::FinderNotFound(_)
                | StripError::Malformed(_)
        )
    }
}
