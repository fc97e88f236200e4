#![warn(missing_docs)]

//! Stripcode command line front end
//!
//! encode:   Text → chunks → ASCII grids or chunk_XX.png files
//! decode:   PNG files → (blocking pool) sample + decode → reassemble → text
//! inspect:  Text → chunks → zone map per chunk
//! capacity: Pixel budget → payload, ECC and column counts

pub mod cli;
pub mod config;

pub use cli::{Cli, Command};
pub use config::StripConfig;
