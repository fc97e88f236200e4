#![warn(missing_docs)]

//! Stripcode raster adapters
//!
//! Render path: Chunk → cells (cell_px square, optional margin) → GrayImage → PNG
//! Scan path:   Image → dark-pixel bounds → cell-centre sampling → bit matrix → decoder

pub mod error;
pub mod render;
pub mod sample;

pub use error::{RasterError, Result};
pub use render::{render_chunk, render_sequence, save_png, RenderOptions};
pub use sample::{load_matrix, sample_matrix, sample_matrix_with, SampleOptions};
