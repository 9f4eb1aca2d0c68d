//! Texture atlas with named item regions, and a row-packing builder.

use super::AtlasRegion;
use crate::error::{MesherError, Result};
use crate::texture::PixelBuffer;
use std::collections::HashMap;

/// A texture atlas: one image plus named normalized regions.
#[derive(Debug, Clone)]
pub struct TextureAtlas {
    /// The atlas image.
    pub image: PixelBuffer,
    /// Mapping from item name to atlas region.
    pub regions: HashMap<String, AtlasRegion>,
}

impl TextureAtlas {
    /// Wrap an existing image and region table.
    pub fn new(image: PixelBuffer, regions: HashMap<String, AtlasRegion>) -> Self {
        Self { image, regions }
    }

    /// Load an atlas image with a JSON region table (`{"name": {"u_min": ..}}`).
    pub fn from_png_and_json(png: &[u8], regions_json: &str) -> Result<Self> {
        let image = PixelBuffer::from_png_bytes(png)?;
        let regions: HashMap<String, AtlasRegion> = serde_json::from_str(regions_json)?;
        for (name, region) in &regions {
            region.validate().map_err(|e| {
                MesherError::InvalidRegion(format!("region '{}': {}", name, e))
            })?;
        }
        Ok(Self { image, regions })
    }

    /// Width of the atlas in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height of the atlas in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Get the region for an item.
    pub fn get_region(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.get(name)
    }

    /// Check if the atlas contains an item.
    pub fn contains(&self, name: &str) -> bool {
        self.regions.contains_key(name)
    }

    /// Serialize the region table as JSON.
    pub fn regions_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.regions)?)
    }
}

/// Builder for packing item textures into an atlas.
pub struct AtlasBuilder {
    max_size: u32,
    padding: u32,
    textures: HashMap<String, PixelBuffer>,
}

impl AtlasBuilder {
    /// Create a new atlas builder.
    pub fn new(max_size: u32, padding: u32) -> Self {
        Self {
            max_size,
            padding,
            textures: HashMap::new(),
        }
    }

    /// Add a texture to the atlas.
    pub fn add_texture(&mut self, name: String, texture: PixelBuffer) {
        self.textures.insert(name, texture);
    }

    /// Number of textures queued.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Build the atlas using simple row packing, doubling the size until
    /// everything fits or `max_size` is exceeded.
    pub fn build(self) -> Result<TextureAtlas> {
        if self.textures.is_empty() {
            return Err(MesherError::InvalidParameter(
                "cannot build an atlas without textures".to_string(),
            ));
        }

        let padding = self.padding;
        let max_size = self.max_size;

        // Tallest first, then by name so packing is deterministic
        let mut textures: Vec<_> = self.textures.into_iter().collect();
        textures.sort_by(|a, b| b.1.height().cmp(&a.1.height()).then_with(|| a.0.cmp(&b.0)));

        let total_area: u64 = textures
            .iter()
            .map(|(_, t)| {
                (t.width() + padding * 2) as u64 * (t.height() + padding * 2) as u64
            })
            .sum();

        let min_size = (total_area as f64).sqrt().ceil() as u32;
        let mut atlas_size = 16u32;
        while atlas_size < min_size && atlas_size < max_size {
            atlas_size *= 2;
        }

        loop {
            if atlas_size > max_size {
                return Err(MesherError::InvalidParameter(format!(
                    "failed to pack {} textures into {}x{} atlas",
                    textures.len(),
                    max_size,
                    max_size
                )));
            }

            if let Some((pixels, regions)) = try_pack(&textures, atlas_size, padding) {
                log::debug!(
                    "packed {} textures into {}x{} atlas",
                    regions.len(),
                    atlas_size,
                    atlas_size
                );
                let image = PixelBuffer::new(atlas_size, atlas_size, pixels)?;
                return Ok(TextureAtlas { image, regions });
            }

            atlas_size *= 2;
        }
    }
}

/// Try to pack textures into an atlas of the given size.
///
/// Padding stays fully transparent so no stray opaque pixels end up next
/// to an item when its region is read back.
fn try_pack(
    textures: &[(String, PixelBuffer)],
    atlas_size: u32,
    padding: u32,
) -> Option<(Vec<u8>, HashMap<String, AtlasRegion>)> {
    let stride = atlas_size as usize * 4;
    let mut pixels = vec![0u8; stride * atlas_size as usize];
    let mut regions = HashMap::new();

    let mut current_x = 0u32;
    let mut current_y = 0u32;
    let mut row_height = 0u32;

    for (name, texture) in textures {
        let cell_width = texture.width() + padding * 2;
        let cell_height = texture.height() + padding * 2;

        if cell_width > atlas_size {
            return None;
        }
        if current_x + cell_width > atlas_size {
            current_x = 0;
            current_y += row_height;
            row_height = 0;
        }
        if current_y + cell_height > atlas_size {
            return None;
        }

        let x = current_x + padding;
        let y = current_y + padding;

        let row_bytes = texture.width() as usize * 4;
        for (ty, row) in texture.pixels().chunks(row_bytes).enumerate() {
            let dst = (y as usize + ty) * stride + x as usize * 4;
            pixels[dst..dst + row_bytes].copy_from_slice(row);
        }

        let size = atlas_size as f32;
        regions.insert(
            name.clone(),
            AtlasRegion {
                u_min: x as f32 / size,
                v_min: y as f32 / size,
                u_max: (x + texture.width()) as f32 / size,
                v_max: (y + texture.height()) as f32 / size,
            },
        );

        current_x += cell_width;
        row_height = row_height.max(cell_height);
    }

    Some((pixels, regions))
}
