//! Subcommand parsing and execution

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use stripcode::capacity::{ecc_len, ChunkLayout};
use stripcode::column::ROWS;
use stripcode::zone::zone_map;
use stripcode::{solve_capacity, try_decode, Chunk, DecodedChunk, Encoder, Protocol, Reassembler};
use stripcode_raster::{load_matrix, save_png, SampleOptions};

use crate::config::StripConfig;

/// Top-level command line
#[derive(Parser, Debug)]
#[command(name = "stripcode")]
#[command(about = "Encode text into stripcode chunks and scan them back", long_about = None)]
pub struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(short, long, global = true, env = "STRIPCODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Budget flags shared by the text subcommands
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Budget {
    /// Horizontal pixel budget per chunk
    #[arg(short = 'w', long)]
    pub width: Option<u32>,
    /// Strip height in pixels
    #[arg(short = 'H', long)]
    pub height: Option<u32>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode text into chunks
    Encode {
        /// Text to encode
        text: String,
        /// Pixel budget overrides
        #[command(flatten)]
        budget: Budget,
        /// Protocol revision (base or enhanced)
        #[arg(short, long)]
        protocol: Option<Protocol>,
        /// Write chunk_XX.png files here instead of printing grids
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Pixels per cell in written images
        #[arg(long)]
        cell_px: Option<u32>,
    },
    /// Decode chunk images and reassemble the text
    Decode {
        /// Chunk images, in any order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the zone map of each chunk
    Inspect {
        /// Text to encode and inspect
        text: String,
        /// Pixel budget overrides
        #[command(flatten)]
        budget: Budget,
        /// Protocol revision (base or enhanced)
        #[arg(short, long)]
        protocol: Option<Protocol>,
    },
    /// Show per-chunk capacity for a pixel budget
    Capacity {
        /// Pixel budget overrides
        #[command(flatten)]
        budget: Budget,
    },
}

/// Result of scanning one image file
#[derive(Debug)]
pub struct FileOutcome {
    /// Image path
    pub path: PathBuf,
    /// Decoded chunk, or why the file yielded none
    pub chunk: Result<DecodedChunk>,
}

impl Cli {
    /// Execute the parsed command.
    pub async fn run(self) -> Result<()> {
        let config = StripConfig::load(self.config.as_deref())?;
        match self.command {
            Command::Encode {
                ref text,
                ref budget,
                protocol,
                ref out_dir,
                cell_px,
            } => {
                let chunks = encode_with(&config, text, budget, protocol)?;
                match out_dir {
                    Some(dir) => write_pngs(&config, &chunks, dir, cell_px),
                    None => {
                        for (i, chunk) in chunks.iter().enumerate() {
                            println!("CHUNK_{i:02} ({} columns)", chunk.width());
                            print!("{}", ascii_grid(chunk));
                        }
                        Ok(())
                    }
                }
            }
            Command::Decode { ref files } => {
                let outcomes = decode_files(files.clone(), config.sample).await;
                print!("{}", report(&outcomes));
                if outcomes.iter().all(|o| o.chunk.is_err()) {
                    anyhow::bail!("No chunk could be decoded from {} file(s)", outcomes.len());
                }
                Ok(())
            }
            Command::Inspect {
                ref text,
                ref budget,
                protocol,
            } => {
                let chunks = encode_with(&config, text, budget, protocol)?;
                for (i, chunk) in chunks.iter().enumerate() {
                    println!("CHUNK_{i:02}");
                    print!("{}", zone_listing(chunk));
                }
                Ok(())
            }
            Command::Capacity { ref budget } => {
                let (width, height) = resolve_budget(&config, budget);
                println!("{}", capacity_line(width, height));
                Ok(())
            }
        }
    }
}

fn resolve_budget(config: &StripConfig, budget: &Budget) -> (u32, u32) {
    (
        budget.width.unwrap_or(config.width_px),
        budget.height.unwrap_or(config.height_px),
    )
}

fn encode_with(
    config: &StripConfig,
    text: &str,
    budget: &Budget,
    protocol: Option<Protocol>,
) -> Result<Vec<Chunk>> {
    let (width, height) = resolve_budget(config, budget);
    let mut encoder_config = config.encoder_config();
    if let Some(p) = protocol {
        encoder_config.protocol = p;
    }
    let chunks = Encoder::new(encoder_config).encode(text, width, height)?;
    info!(
        chunks = chunks.len(),
        width,
        height,
        protocol = %encoder_config.protocol,
        "encoded text"
    );
    Ok(chunks)
}

fn write_pngs(
    config: &StripConfig,
    chunks: &[Chunk],
    dir: &Path,
    cell_px: Option<u32>,
) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    let mut opts = config.render;
    if let Some(cell) = cell_px {
        opts.cell_px = cell;
    }
    for (i, chunk) in chunks.iter().enumerate() {
        let path = dir.join(format!("chunk_{i:02}.png"));
        save_png(chunk, &opts, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{}", path.display());
    }
    info!(files = chunks.len(), dir = %dir.display(), "wrote chunk images");
    Ok(())
}

/// Eight text lines per chunk, `#` for filled cells and `.` for empty ones.
pub fn ascii_grid(chunk: &Chunk) -> String {
    let mut out = String::with_capacity((chunk.width() + 1) * ROWS);
    for row in 0..ROWS {
        out.extend(
            chunk
                .columns()
                .iter()
                .map(|c| if c[row] { '#' } else { '.' }),
        );
        out.push('\n');
    }
    out
}

/// One line per zone rectangle: label, column span and row span.
pub fn zone_listing(chunk: &Chunk) -> String {
    let mut out = String::new();
    for rect in zone_map(chunk) {
        let _ = writeln!(
            out,
            "  {:<14} cols {:>3}..{:<3} rows {}..{}",
            rect.zone.label(),
            rect.x,
            rect.x + rect.w,
            rect.y,
            rect.y + rect.h
        );
    }
    out
}

/// Payload, ECC and total column counts for a budget.
pub fn capacity_line(width: u32, height: u32) -> String {
    let payload = solve_capacity(width, height);
    if payload == 0 {
        return format!("{width}px x {height}px: no payload fits");
    }
    let layout = ChunkLayout::for_payload(payload);
    format!(
        "{width}px x {height}px: payload {payload} nibbles, ecc {}, {} columns",
        ecc_len(payload),
        layout.total_columns
    )
}

/// Sample and decode every file on the blocking pool, preserving input order.
pub async fn decode_files(files: Vec<PathBuf>, sample: SampleOptions) -> Vec<FileOutcome> {
    let tasks = files
        .into_iter()
        .map(|path| {
            let task_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || decode_file(&task_path, &sample));
            (path, handle)
        })
        .collect();
    gather(tasks).await
}

/// Join per-file tasks in order. A task that panics or is cancelled still yields an
/// outcome for its file.
async fn gather(tasks: Vec<(PathBuf, JoinHandle<Result<DecodedChunk>>)>) -> Vec<FileOutcome> {
    let mut outcomes = Vec::with_capacity(tasks.len());
    for (path, handle) in tasks {
        let chunk = match handle.await {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(path = %path.display(), "Decode task failed: {}", e);
                Err(anyhow::Error::new(e).context("decode task failed"))
            }
        };
        outcomes.push(FileOutcome { path, chunk });
    }
    outcomes
}

fn decode_file(path: &Path, sample: &SampleOptions) -> Result<DecodedChunk> {
    let matrix = load_matrix(path, sample)?;
    let chunk = try_decode(&matrix)?;
    if !chunk.suspect.is_empty() {
        warn!(path = %path.display(), suspect = ?chunk.suspect, "parity mismatch in payload");
    }
    if !chunk.ecc_ok {
        warn!(path = %path.display(), index = chunk.index, "ECC block mismatch");
    }
    Ok(chunk)
}

/// Per-file status lines, the reassembled text and a completeness line.
pub fn report(outcomes: &[FileOutcome]) -> String {
    let mut out = String::new();
    let mut reassembler = Reassembler::new();
    for outcome in outcomes {
        match &outcome.chunk {
            Ok(chunk) => {
                let _ = writeln!(out, "{}: CHUNK_{:02}", outcome.path.display(), chunk.index);
                reassembler.push(chunk.clone());
            }
            Err(e) => {
                let _ = writeln!(out, "{}: FAIL ({e})", outcome.path.display());
            }
        }
    }
    let _ = writeln!(out, "{}", reassembler.assemble());
    let expected = reassembler
        .expected_total()
        .map_or_else(|| "?".to_string(), |t| t.to_string());
    let _ = writeln!(out, "{}/{} chunks", reassembler.present_count(), expected);
    let missing = reassembler.missing_indices();
    if !missing.is_empty() {
        let _ = writeln!(out, "missing: {missing:?}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use stripcode::{decode_chunk, encode};

    fn decode_in_memory(chunks: &[Chunk]) -> Vec<Result<DecodedChunk>> {
        chunks
            .iter()
            .map(|c| decode_chunk(c).map_err(anyhow::Error::from))
            .collect()
    }

    #[test]
    fn test_cli_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "stripcode", "encode", "hello", "--width", "640", "-p", "base", "--cell-px", "6",
        ])
        .unwrap();
        match cli.command {
            Command::Encode {
                text,
                budget,
                protocol,
                out_dir,
                cell_px,
            } => {
                assert_eq!(text, "hello");
                assert_eq!(budget.width, Some(640));
                assert_eq!(budget.height, None);
                assert_eq!(protocol, Some(Protocol::Base));
                assert!(out_dir.is_none());
                assert_eq!(cell_px, Some(6));
            }
            _ => panic!("Expected Encode command"),
        }
    }

    #[test]
    fn test_cli_protocol_revision_alias() {
        let cli = Cli::try_parse_from(["stripcode", "inspect", "x", "--protocol", "v9"]).unwrap();
        match cli.command {
            Command::Inspect { protocol, .. } => assert_eq!(protocol, Some(Protocol::Enhanced)),
            _ => panic!("Expected Inspect command"),
        }
        assert!(Cli::try_parse_from(["stripcode", "inspect", "x", "-p", "v7"]).is_err());
    }

    #[test]
    fn test_cli_decode_requires_files() {
        assert!(Cli::try_parse_from(["stripcode", "decode"]).is_err());
        let cli = Cli::try_parse_from(["stripcode", "decode", "a.png", "b.png"]).unwrap();
        match cli.command {
            Command::Decode { files } => assert_eq!(files.len(), 2),
            _ => panic!("Expected Decode command"),
        }
    }

    #[test]
    fn test_cli_global_config() {
        let cli =
            Cli::try_parse_from(["stripcode", "capacity", "-H", "16", "--config", "s.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("s.toml")));
        match cli.command {
            Command::Capacity { budget } => assert_eq!(budget.height, Some(16)),
            _ => panic!("Expected Capacity command"),
        }
    }

    #[test]
    fn test_ascii_grid_shape() {
        let chunk = encode("AB", 2000, 32).unwrap().remove(0);
        let grid = ascii_grid(&chunk);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines.iter().all(|l| l.chars().count() == 16));
        // left anchor column reads 1,1,1,0,0,1,1,1 top to bottom
        let first: String = lines.iter().map(|l| &l[..1]).collect();
        assert_eq!(first, "###..###");
    }

    #[test]
    fn test_capacity_line() {
        assert_eq!(
            capacity_line(2000, 32),
            "2000px x 32px: payload 391 nibbles, ecc 98, 500 columns"
        );
        assert_eq!(capacity_line(50, 32), "50px x 32px: no payload fits");
    }

    #[test]
    fn test_zone_listing_names_regions() {
        let chunk = encode("Hello", 2000, 32).unwrap().remove(0);
        let listing = zone_listing(&chunk);
        for label in ["FINDER_L", "META_IDX", "PAYLOAD", "ECC_BLK", "RF_END", "ROW_TIMELINE"] {
            assert!(listing.contains(label), "missing {label}");
        }
    }

    #[test]
    fn test_report_counts_present_and_expected() {
        let chunks = encode("abcdefgh", 60, 32).unwrap();
        assert!(chunks.len() > 2);
        let outcomes: Vec<FileOutcome> = decode_in_memory(&chunks)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(i, chunk)| FileOutcome {
                path: PathBuf::from(format!("chunk_{i:02}.png")),
                chunk,
            })
            .collect();
        let text = report(&outcomes);
        assert!(text.contains("chunk_00.png: CHUNK_00"));
        assert!(text.contains(&format!("{}/{} chunks", chunks.len() - 1, chunks.len())));
        assert!(text.contains("missing: [1]"));
    }

    #[tokio::test]
    async fn test_failed_task_still_reported() {
        let ok_path = PathBuf::from("chunk_00.png");
        let bad_path = PathBuf::from("chunk_01.png");
        let chunk = decode_in_memory(&encode("AB", 2000, 32).unwrap()).remove(0);
        let crashing = || -> Result<DecodedChunk> { panic!("sampler crashed") };
        let tasks = vec![
            (ok_path, tokio::task::spawn_blocking(move || chunk)),
            (bad_path, tokio::task::spawn_blocking(crashing)),
        ];
        let outcomes = gather(tasks).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].chunk.is_ok());
        assert!(outcomes[1].chunk.is_err());
        let text = report(&outcomes);
        assert!(text.contains("chunk_00.png: CHUNK_00"));
        assert!(text.contains("chunk_01.png: FAIL"));
    }

    #[tokio::test]
    async fn test_decode_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = StripConfig::default();
        let chunks = encode("scan me back", 120, 16).unwrap();
        write_pngs(&config, &chunks, dir.path(), None).unwrap();

        let mut files: Vec<PathBuf> = (0..chunks.len())
            .map(|i| dir.path().join(format!("chunk_{i:02}.png")))
            .collect();
        files.reverse();
        files.push(dir.path().join("missing.png"));

        let outcomes = decode_files(files, config.sample).await;
        assert_eq!(outcomes.len(), chunks.len() + 1);
        assert!(outcomes.last().unwrap().chunk.is_err());
        let text = report(&outcomes);
        assert!(text.contains("scan me back"));
        assert!(text.contains("FAIL"));
    }
}
