//! Normalized atlas regions and their pixel-space equivalents.

use crate::error::{MesherError, Result};
use serde::{Deserialize, Serialize};

/// Slack allowed when checking that a region lies inside `[0, 1]`.
const UV_EPSILON: f32 = 1e-4;

/// A region within a texture atlas, in normalized coordinates with the
/// origin at the top-left of the atlas image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtlasRegion {
    /// U coordinate of the left edge (0-1).
    pub u_min: f32,
    /// V coordinate of the top edge (0-1).
    pub v_min: f32,
    /// U coordinate of the right edge (0-1).
    pub u_max: f32,
    /// V coordinate of the bottom edge (0-1).
    pub v_max: f32,
}

impl AtlasRegion {
    /// Region from its top-left corner and size.
    pub fn from_size(u: f32, v: f32, size_x: f32, size_y: f32) -> Self {
        Self {
            u_min: u,
            v_min: v,
            u_max: u + size_x,
            v_max: v + size_y,
        }
    }

    /// The whole atlas.
    pub fn full() -> Self {
        Self::from_size(0.0, 0.0, 1.0, 1.0)
    }

    /// Get the width of this region in UV space.
    pub fn width(&self) -> f32 {
        self.u_max - self.u_min
    }

    /// Get the height of this region in UV space.
    pub fn height(&self) -> f32 {
        self.v_max - self.v_min
    }

    /// Check that the region is finite, non-empty and inside the atlas.
    pub fn validate(&self) -> Result<()> {
        let coords = [self.u_min, self.v_min, self.u_max, self.v_max];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(MesherError::InvalidRegion(format!(
                "non-finite coordinates {:?}",
                coords
            )));
        }
        if self.width() <= 0.0 || self.height() <= 0.0 {
            return Err(MesherError::InvalidRegion(format!(
                "non-positive size {}x{}",
                self.width(),
                self.height()
            )));
        }
        let lo = -UV_EPSILON;
        let hi = 1.0 + UV_EPSILON;
        if coords.iter().any(|&c| c < lo || c > hi) {
            return Err(MesherError::InvalidRegion(format!(
                "coordinates {:?} fall outside the atlas",
                coords
            )));
        }
        Ok(())
    }

    /// Map this region onto an atlas of the given pixel size.
    pub fn to_pixel_rect(&self, atlas_width: u32, atlas_height: u32) -> Result<PixelRect> {
        if atlas_width == 0 || atlas_height == 0 {
            return Err(MesherError::InvalidDimensions {
                width: atlas_width,
                height: atlas_height,
            });
        }
        self.validate()?;

        let aw = atlas_width as f32;
        let ah = atlas_height as f32;
        let x0 = ((self.u_min * aw).round().max(0.0) as u32).min(atlas_width);
        let y0 = ((self.v_min * ah).round().max(0.0) as u32).min(atlas_height);
        let x1 = ((self.u_max * aw).round().max(0.0) as u32).min(atlas_width);
        let y1 = ((self.v_max * ah).round().max(0.0) as u32).min(atlas_height);

        let width = x1.saturating_sub(x0);
        let height = y1.saturating_sub(y0);
        if width == 0 || height == 0 {
            return Err(MesherError::InvalidDimensions { width, height });
        }

        Ok(PixelRect {
            x: x0,
            y: y0,
            width,
            height,
        })
    }
}

/// An integer pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_rect_for_quarter_region() {
        let region = AtlasRegion::from_size(0.5, 0.25, 0.25, 0.25);
        let rect = region.to_pixel_rect(64, 64).unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 32,
                y: 16,
                width: 16,
                height: 16
            }
        );
    }

    #[test]
    fn test_zero_size_region_is_invalid() {
        let region = AtlasRegion::from_size(0.5, 0.5, 0.0, 0.25);
        assert!(matches!(
            region.validate(),
            Err(MesherError::InvalidRegion(_))
        ));
    }

    #[test]
    fn test_region_smaller_than_a_pixel_is_invalid() {
        let region = AtlasRegion::from_size(0.0, 0.0, 0.001, 0.5);
        let err = region.to_pixel_rect(16, 16).unwrap_err();
        assert!(matches!(err, MesherError::InvalidDimensions { width: 0, .. }));
    }

    #[test]
    fn test_region_outside_atlas_is_invalid() {
        let region = AtlasRegion::from_size(0.9, 0.0, 0.5, 0.5);
        assert!(region.validate().is_err());
    }

    #[test]
    fn test_zero_sized_atlas_is_invalid() {
        let err = AtlasRegion::full().to_pixel_rect(0, 16).unwrap_err();
        assert!(matches!(err, MesherError::InvalidDimensions { width: 0, height: 16 }));
    }
}
