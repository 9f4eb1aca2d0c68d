//! Texture atlases.
//!
//! Items live in sub-regions of a shared atlas image. This module maps the
//! normalized regions onto pixels and copies them out for meshing.

mod builder;
mod region;
mod source;

pub use builder::{AtlasBuilder, TextureAtlas};
pub use region::{AtlasRegion, PixelRect};
pub use source::{extract_rect, PixelSource};
