//! Error types for the item mesher.

use thiserror::Error;

/// Result type alias using MesherError.
pub type Result<T> = std::result::Result<T, MesherError>;

/// Main error type for item meshing operations.
#[derive(Error, Debug)]
pub enum MesherError {
    /// A pixel surface or region has a zero-sized dimension.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// An atlas region is malformed or lies outside the atlas.
    #[error("Invalid atlas region: {0}")]
    InvalidRegion(String),

    /// A geometric or configuration parameter is out of range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Pixel data does not match its declared dimensions.
    #[error("Pixel data error: {0}")]
    PixelData(String),

    /// Reading a region out of a pixel source failed.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A renderer backend refused to allocate a resource.
    #[error("Allocation error: {0}")]
    Allocation(String),

    /// Failed to read or process an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to export mesh.
    #[error("Export error: {0}")]
    Export(String),
}

impl MesherError {
    /// Whether this error is caused by the caller passing bad input,
    /// as opposed to a failure while building geometry.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MesherError::InvalidDimensions { .. }
                | MesherError::InvalidRegion(_)
                | MesherError::InvalidParameter(_)
        )
    }
}
