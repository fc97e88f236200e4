//! Chunk rendering: one square cell per bit, black on white.

use std::path::Path;

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stripcode::column::ROWS;
use stripcode::Chunk;

use crate::error::{RasterError, Result};

const INK: Luma<u8> = Luma([0]);
const PAPER: Luma<u8> = Luma([255]);

/// Pixel geometry of rendered chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Side length of one cell in pixels.
    pub cell_px: u32,
    /// White border around the chunk in pixels.
    pub margin_px: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_px: 4,
            margin_px: 8,
        }
    }
}

impl RenderOptions {
    /// Options with the margin expressed in cells.
    pub fn with_margin_cells(cell_px: u32, margin_cells: u32) -> Self {
        Self {
            cell_px,
            margin_px: cell_px.saturating_mul(margin_cells),
        }
    }

    /// Image size in pixels for a chunk of `columns` columns.
    ///
    /// Fails when `cell_px` is zero or the size does not fit in `u32`.
    pub fn image_size(&self, columns: usize) -> Result<(u32, u32)> {
        if self.cell_px == 0 {
            return Err(RasterError::InvalidOptions("cell_px must be at least 1".into()));
        }
        let overflow = || RasterError::InvalidOptions("image dimensions overflow u32".into());
        let border = self.margin_px.checked_mul(2).ok_or_else(overflow)?;
        let extent = |cells: usize| {
            u32::try_from(cells)
                .ok()
                .and_then(|n| n.checked_mul(self.cell_px))
                .and_then(|px| px.checked_add(border))
                .ok_or_else(overflow)
        };
        Ok((extent(columns)?, extent(ROWS)?))
    }
}

/// Render a chunk.
pub fn render_chunk(chunk: &Chunk, opts: &RenderOptions) -> Result<GrayImage> {
    let (width, height) = opts.image_size(chunk.width())?;
    let cell = opts.cell_px;
    let margin = opts.margin_px;

    let mut img = GrayImage::from_pixel(width, height, PAPER);
    for (x, column) in chunk.columns().iter().enumerate() {
        for (y, &filled) in column.bits().iter().enumerate() {
            if !filled {
                continue;
            }
            // in range: image_size bounded the whole grid
            let left = margin + x as u32 * cell;
            let top = margin + y as u32 * cell;
            for py in top..top + cell {
                for px in left..left + cell {
                    img.put_pixel(px, py, INK);
                }
            }
        }
    }
    debug!(columns = chunk.width(), width, height, "rendered chunk");
    Ok(img)
}

/// Render every chunk of a sequence in order.
pub fn render_sequence(chunks: &[Chunk], opts: &RenderOptions) -> Result<Vec<GrayImage>> {
    chunks.iter().map(|c| render_chunk(c, opts)).collect()
}

/// Render a chunk and write it as PNG.
pub fn save_png(chunk: &Chunk, opts: &RenderOptions, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    render_chunk(chunk, opts)?.save_with_format(path, image::ImageFormat::Png)?;
    debug!(path = %path.display(), "wrote chunk image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stripcode::encode;

    fn hello() -> Chunk {
        encode("Hello", 2000, 32).unwrap().remove(0)
    }

    #[test]
    fn image_dimensions_follow_cells_and_margin() {
        let chunk = hello();
        let img = render_chunk(&chunk, &RenderOptions { cell_px: 3, margin_px: 5 }).unwrap();
        assert_eq!(img.width(), 24 * 3 + 10);
        assert_eq!(img.height(), 8 * 3 + 10);
    }

    #[test]
    fn cells_are_black_on_white() {
        let chunk = hello();
        let opts = RenderOptions { cell_px: 2, margin_px: 0 };
        let img = render_chunk(&chunk, &opts).unwrap();
        // left anchor row 0 filled, row 3 empty
        assert_eq!(img.get_pixel(0, 0), &INK);
        assert_eq!(img.get_pixel(1, 1), &INK);
        assert_eq!(img.get_pixel(0, 6), &PAPER);
        // left quiet column is blank throughout
        assert!((0..16).all(|y| img.get_pixel(3 * 2, y) == &PAPER));
    }

    #[test]
    fn margin_is_white() {
        let img = render_chunk(&hello(), &RenderOptions::default()).unwrap();
        assert!((0..img.width()).all(|x| img.get_pixel(x, 0) == &PAPER));
        assert!((0..img.height()).all(|y| img.get_pixel(0, y) == &PAPER));
    }

    #[test]
    fn margin_in_cells() {
        assert_eq!(
            RenderOptions::with_margin_cells(4, 2),
            RenderOptions { cell_px: 4, margin_px: 8 }
        );
    }

    #[test]
    fn sequence_renders_each_chunk() {
        let chunks = encode("a longer message spread over chunks", 120, 16).unwrap();
        let images = render_sequence(&chunks, &RenderOptions::default()).unwrap();
        assert_eq!(images.len(), chunks.len());
    }

    #[test]
    fn save_rejects_zero_cell() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_png(
            &hello(),
            &RenderOptions { cell_px: 0, margin_px: 0 },
            dir.path().join("x.png"),
        )
        .unwrap_err();
        assert!(matches!(err, RasterError::InvalidOptions(_)));
    }

    #[test]
    fn render_rejects_zero_cell() {
        let opts = RenderOptions { cell_px: 0, margin_px: 4 };
        let err = render_chunk(&hello(), &opts).unwrap_err();
        assert!(matches!(err, RasterError::InvalidOptions(_)));
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        let huge_cell = RenderOptions { cell_px: u32::MAX / 4, margin_px: 0 };
        assert!(matches!(
            render_chunk(&hello(), &huge_cell),
            Err(RasterError::InvalidOptions(_))
        ));
        let huge_margin = RenderOptions { cell_px: 1, margin_px: u32::MAX };
        assert!(huge_margin.image_size(24).is_err());
        assert_eq!(RenderOptions { cell_px: 2, margin_px: 3 }.image_size(24).unwrap(), (54, 22));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: RenderOptions = serde_json::from_str(r#"{"cell_px": 6}"#).unwrap();
        assert_eq!(opts, RenderOptions { cell_px: 6, margin_px: 8 });
    }
}
