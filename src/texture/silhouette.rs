//! Opaque-pixel classification.

use super::PixelBuffer;

/// Default alpha threshold: a pixel is opaque when its alpha exceeds this.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;

/// Opacity oracle over a pixel buffer.
///
/// Coordinates are signed so that neighbours of border pixels can be queried
/// directly; anything outside `[0, width) x [0, height)` is transparent.
#[derive(Debug, Clone, Copy)]
pub struct Silhouette<'a> {
    buffer: &'a PixelBuffer,
    threshold: u8,
}

impl<'a> Silhouette<'a> {
    pub fn new(buffer: &'a PixelBuffer, threshold: u8) -> Self {
        Self { buffer, threshold }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Whether the pixel at (x, y) is opaque.
    pub fn opaque(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return false;
        }
        self.buffer
            .alpha(x as u32, y as u32)
            .map_or(false, |a| a > self.threshold)
    }

    /// Number of opaque pixels.
    pub fn opaque_count(&self) -> usize {
        self.buffer
            .pixels()
            .chunks(4)
            .filter(|p| p[3] > self.threshold)
            .count()
    }

    /// True when no pixel is opaque.
    pub fn is_empty(&self) -> bool {
        !self.buffer.pixels().chunks(4).any(|p| p[3] > self.threshold)
    }

    /// Whether any of the (up to four) pixels sharing corner (cx, cy) is opaque.
    pub fn corner_touches_opaque(&self, cx: i64, cy: i64) -> bool {
        self.opaque(cx - 1, cy - 1)
            || self.opaque(cx, cy - 1)
            || self.opaque(cx - 1, cy)
            || self.opaque(cx, cy)
    }
}
