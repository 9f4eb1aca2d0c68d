//! Mesh generation from item textures.
//!
//! [`build_extruded_mesh`] turns the opaque pixels of a texture into a closed
//! solid: shared-vertex front and back faces plus per-pixel edge walls along
//! the silhouette boundary.

pub mod extrude;
pub mod flat;
pub mod geometry;
pub mod grid;

pub use extrude::EdgeSide;
pub use geometry::{Mesh, Vertex};

use crate::error::{MesherError, Result};
use crate::texture::{PixelBuffer, Silhouette, DEFAULT_ALPHA_THRESHOLD};
use grid::{GridLayout, VertexGrid};
use serde::{Deserialize, Serialize};

/// Extrusion configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrusionConfig {
    /// Thickness of the solid in world units.
    pub depth: f32,
    /// World units per source pixel. `None` scales the longer side to one unit.
    pub pixel_size: Option<f32>,
    /// A pixel is opaque when its alpha is strictly greater than this.
    pub alpha_threshold: u8,
    /// Replace authored normals with area-weighted smooth normals.
    pub smooth_normals: bool,
}

impl Default for ExtrusionConfig {
    fn default() -> Self {
        Self {
            depth: 1.0 / 16.0,
            pixel_size: None,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            smooth_normals: false,
        }
    }
}

impl ExtrusionConfig {
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: f32) -> Self {
        self.pixel_size = Some(pixel_size);
        self
    }

    pub fn with_alpha_threshold(mut self, threshold: u8) -> Self {
        self.alpha_threshold = threshold;
        self
    }

    pub fn with_smooth_normals(mut self, smooth: bool) -> Self {
        self.smooth_normals = smooth;
        self
    }

    /// Check the geometric parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.depth.is_finite() || self.depth < 0.0 {
            return Err(MesherError::InvalidParameter(format!(
                "depth must be finite and non-negative, got {}",
                self.depth
            )));
        }
        if let Some(size) = self.pixel_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(MesherError::InvalidParameter(format!(
                    "pixel size must be finite and positive, got {}",
                    size
                )));
            }
        }
        Ok(())
    }

    /// Check the parameters against a `width` x `height` texture: on top of
    /// [`validate`](Self::validate), the extruded solid must have finite
    /// extents.
    pub fn validate_for(&self, width: u32, height: u32) -> Result<()> {
        self.validate()?;
        let extent = self.resolved_pixel_size(width, height) * width.max(height) as f32;
        if !extent.is_finite() {
            return Err(MesherError::InvalidParameter(format!(
                "pixel size {} overflows a {}x{} texture",
                self.resolved_pixel_size(width, height),
                width,
                height
            )));
        }
        Ok(())
    }

    /// Pixel size to use for a `width` x `height` texture.
    pub fn resolved_pixel_size(&self, width: u32, height: u32) -> f32 {
        self.pixel_size
            .unwrap_or_else(|| 1.0 / width.max(height).max(1) as f32)
    }
}

/// Diagnostics for one extrusion build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Vertices on the shared front/back corner grid.
    pub grid_vertices: usize,
    /// Vertices created for edge walls.
    pub wall_vertices: usize,
    pub front_triangles: usize,
    pub back_triangles: usize,
    pub wall_triangles: usize,
    /// Quads dropped because a grid corner was missing.
    pub skipped_quads: usize,
}

impl MeshStats {
    pub fn total_vertices(&self) -> usize {
        self.grid_vertices + self.wall_vertices
    }

    pub fn total_triangles(&self) -> usize {
        self.front_triangles + self.back_triangles + self.wall_triangles
    }
}

/// Output of [`build_extruded_mesh`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudedMesh {
    pub mesh: Mesh,
    pub stats: MeshStats,
    /// Source texture width in pixels.
    pub width: u32,
    /// Source texture height in pixels.
    pub height: u32,
}

impl ExtrudedMesh {
    pub fn total_vertices(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn total_triangles(&self) -> usize {
        self.mesh.triangle_count()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

/// Extrude the opaque pixels of `pixels` into a closed solid.
///
/// A fully transparent texture yields an empty mesh. The build is a pure
/// function of its inputs.
pub fn build_extruded_mesh(pixels: &PixelBuffer, config: &ExtrusionConfig) -> Result<ExtrudedMesh> {
    let (width, height) = (pixels.width(), pixels.height());
    if width == 0 || height == 0 {
        return Err(MesherError::InvalidDimensions { width, height });
    }
    config.validate_for(width, height)?;

    let silhouette = Silhouette::new(pixels, config.alpha_threshold);
    let layout = GridLayout {
        width,
        height,
        pixel_size: config.resolved_pixel_size(width, height),
        half_depth: config.depth / 2.0,
    };

    let mut mesh = Mesh::new();
    let grid = VertexGrid::build(&silhouette, &layout, &mut mesh);
    let grid_vertices = mesh.vertex_count();

    let counts = extrude::assemble(&silhouette, &layout, &grid, &mut mesh);
    if counts.skipped_quads > 0 {
        log::warn!(
            "skipped {} quads with missing grid corners on {}x{} texture",
            counts.skipped_quads,
            width,
            height
        );
    }

    if config.smooth_normals {
        mesh.recompute_normals();
    }

    let stats = MeshStats {
        grid_vertices,
        wall_vertices: mesh.vertex_count() - grid_vertices,
        front_triangles: counts.front_quads * 2,
        back_triangles: counts.back_quads * 2,
        wall_triangles: counts.wall_quads * 2,
        skipped_quads: counts.skipped_quads,
    };

    log::debug!(
        "extruded {}x{} texture: {} vertices ({} grid, {} wall), {} triangles",
        width,
        height,
        stats.total_vertices(),
        stats.grid_vertices,
        stats.wall_vertices,
        stats.total_triangles()
    );

    Ok(ExtrudedMesh {
        mesh,
        stats,
        width,
        height,
    })
}
