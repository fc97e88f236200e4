//! Image sampling: a cropped chunk image → `[column][row]` bit matrix.
//!
//! The scanner assumes one chunk per image, roughly square cells, and a white or
//! transparent background. It trims to the bounding box of dark pixels, derives the
//! cell size from the content height and reads the pixel at each cell centre.

use std::path::Path;

use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use stripcode::column::ROWS;

use crate::error::{RasterError, Result};

/// Darkness thresholds used while scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleOptions {
    /// Mean RGB strictly below this counts as dark.
    pub dark_threshold: u8,
    /// Alpha strictly above this counts as opaque.
    pub alpha_threshold: u8,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            dark_threshold: 128,
            alpha_threshold: 50,
        }
    }
}

impl SampleOptions {
    fn is_dark(&self, px: &Rgba<u8>) -> bool {
        let [r, g, b, a] = px.0;
        let mean = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
        mean < u16::from(self.dark_threshold) && a > self.alpha_threshold
    }
}

struct Bounds {
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

fn dark_bounds(img: &RgbaImage, opts: &SampleOptions) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    for (x, y, px) in img.enumerate_pixels() {
        if !opts.is_dark(px) {
            continue;
        }
        let b = bounds.get_or_insert(Bounds {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        });
        b.min_x = b.min_x.min(x);
        b.max_x = b.max_x.max(x);
        b.min_y = b.min_y.min(y);
        b.max_y = b.max_y.max(y);
    }
    bounds
}

/// Sample with the default thresholds.
pub fn sample_matrix(img: &DynamicImage) -> Option<Vec<Vec<bool>>> {
    sample_matrix_with(img, &SampleOptions::default())
}

/// Sample an image into a `[column][row]` matrix; `None` when nothing dark is present.
pub fn sample_matrix_with(img: &DynamicImage, opts: &SampleOptions) -> Option<Vec<Vec<bool>>> {
    let rgba = img.to_rgba8();
    let bounds = dark_bounds(&rgba, opts)?;

    let content_w = f64::from(bounds.max_x - bounds.min_x + 1);
    let content_h = f64::from(bounds.max_y - bounds.min_y + 1);
    let cell = content_h / ROWS as f64;
    let estimated_cols = (content_w / cell).round() as usize;

    let mut matrix = Vec::with_capacity(estimated_cols);
    for c in 0..estimated_cols {
        let centre_x = f64::from(bounds.min_x) + c as f64 * cell + cell / 2.0;
        if centre_x > f64::from(bounds.max_x) {
            break;
        }
        let column = (0..ROWS)
            .map(|r| {
                let centre_y = f64::from(bounds.min_y) + r as f64 * cell + cell / 2.0;
                opts.is_dark(rgba.get_pixel(centre_x as u32, centre_y as u32))
            })
            .collect();
        matrix.push(column);
    }
    debug!(
        content_w,
        content_h,
        cell,
        columns = matrix.len(),
        "sampled image"
    );
    Some(matrix)
}

/// Open an image file and sample it with the given thresholds.
pub fn load_matrix(path: impl AsRef<Path>, opts: &SampleOptions) -> Result<Vec<Vec<bool>>> {
    let img = image::open(path.as_ref())?;
    sample_matrix_with(&img, opts).ok_or(RasterError::NoContent)
}
