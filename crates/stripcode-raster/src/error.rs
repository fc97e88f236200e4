//! Error types for the raster adapters

/// Result alias for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;

/// All errors that can occur while rendering or scanning chunk images
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The image holds no dark pixels to sample
    #[error("No strip content found in image")]
    NoContent,
    /// Rendering options that cannot produce an image
    #[error("Invalid render options: {0}")]
    InvalidOptions(String),
}
