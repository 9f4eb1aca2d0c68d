//! Pixel sources that item regions can be read from.

use super::{AtlasRegion, PixelRect, TextureAtlas};
use crate::error::{MesherError, Result};
use crate::texture::PixelBuffer;

/// Anything that can hand out the RGBA pixels of an atlas region.
pub trait PixelSource {
    /// Dimensions of the full source image in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Copy a normalized region out into a standalone buffer.
    fn read_region(&self, region: &AtlasRegion) -> Result<PixelBuffer>;
}

impl PixelSource for PixelBuffer {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn read_region(&self, region: &AtlasRegion) -> Result<PixelBuffer> {
        let rect = region.to_pixel_rect(self.width(), self.height())?;
        extract_rect(self, rect, rect.width, rect.height)
    }
}

impl PixelSource for TextureAtlas {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn read_region(&self, region: &AtlasRegion) -> Result<PixelBuffer> {
        self.image.read_region(region)
    }
}

/// Copy `rect` out of `source`, resampled to `out_width` x `out_height`
/// with nearest-neighbour sampling so pixel-art edges stay hard.
pub fn extract_rect(
    source: &PixelBuffer,
    rect: PixelRect,
    out_width: u32,
    out_height: u32,
) -> Result<PixelBuffer> {
    if out_width == 0 || out_height == 0 {
        return Err(MesherError::InvalidDimensions {
            width: out_width,
            height: out_height,
        });
    }
    if rect.width == 0
        || rect.height == 0
        || rect.x + rect.width > source.width()
        || rect.y + rect.height > source.height()
    {
        return Err(MesherError::Extraction(format!(
            "rect {:?} does not fit in {}x{} source",
            rect,
            source.width(),
            source.height()
        )));
    }

    let src = source.pixels();
    let src_stride = source.width() as usize * 4;
    let mut pixels = Vec::with_capacity(out_width as usize * out_height as usize * 4);

    for dy in 0..out_height as u64 {
        let sy = rect.y as u64 + (dy * 2 + 1) * rect.height as u64 / (out_height as u64 * 2);
        let row = sy as usize * src_stride;
        for dx in 0..out_width as u64 {
            let sx = rect.x as u64 + (dx * 2 + 1) * rect.width as u64 / (out_width as u64 * 2);
            let idx = row + sx as usize * 4;
            pixels.extend_from_slice(&src[idx..idx + 4]);
        }
    }

    PixelBuffer::new(out_width, out_height, pixels)
}
