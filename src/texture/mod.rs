//! Texture pixel data and silhouette extraction.

mod pixel_buffer;
pub mod silhouette;

pub use pixel_buffer::PixelBuffer;
pub use silhouette::{Silhouette, DEFAULT_ALPHA_THRESHOLD};
