//! Shared front/back vertex grid at pixel corners.

use super::geometry::{Mesh, Vertex};
use crate::texture::Silhouette;

/// Maps pixel-space coordinates to item-local world space.
///
/// The grid is centred on the origin, image row 0 ends up at the top
/// (+Y), and the front face sits at `+half_depth`.
#[derive(Debug, Clone, Copy)]
pub struct GridLayout {
    pub width: u32,
    pub height: u32,
    pub pixel_size: f32,
    pub half_depth: f32,
}

impl GridLayout {
    pub fn world_x(&self, px: f32) -> f32 {
        let w = self.width as f32;
        (px / w - 0.5) * self.pixel_size * w
    }

    pub fn world_y(&self, py: f32) -> f32 {
        let h = self.height as f32;
        -(py / h - 0.5) * self.pixel_size * h
    }

    /// UV of a pixel corner.
    pub fn corner_uv(&self, px: u32, py: u32) -> [f32; 2] {
        [px as f32 / self.width as f32, py as f32 / self.height as f32]
    }

    /// UV of a pixel centre.
    pub fn center_uv(&self, px: u32, py: u32) -> [f32; 2] {
        [
            (px as f32 + 0.5) / self.width as f32,
            (py as f32 + 0.5) / self.height as f32,
        ]
    }
}

/// Lazily populated corner vertices. A cell is `None` until some opaque
/// pixel touching that corner needs it, and is never populated twice.
#[derive(Debug, Clone)]
pub struct VertexGrid {
    columns: usize,
    front: Vec<Option<u32>>,
    back: Vec<Option<u32>>,
}

impl VertexGrid {
    /// Build the grid, appending the needed corner vertices to `mesh`.
    pub fn build(silhouette: &Silhouette<'_>, layout: &GridLayout, mesh: &mut Mesh) -> Self {
        let columns = layout.width as usize + 1;
        let rows = layout.height as usize + 1;
        let mut grid = Self {
            columns,
            front: vec![None; columns * rows],
            back: vec![None; columns * rows],
        };

        for py in 0..=layout.height {
            for px in 0..=layout.width {
                if !silhouette.corner_touches_opaque(px as i64, py as i64) {
                    continue;
                }
                let x = layout.world_x(px as f32);
                let y = layout.world_y(py as f32);
                let uv = layout.corner_uv(px, py);

                let cell = py as usize * columns + px as usize;
                grid.front[cell] = Some(mesh.add_vertex(Vertex::new(
                    [x, y, layout.half_depth],
                    [0.0, 0.0, 1.0],
                    uv,
                )));
                grid.back[cell] = Some(mesh.add_vertex(Vertex::new(
                    [x, y, -layout.half_depth],
                    [0.0, 0.0, -1.0],
                    uv,
                )));
            }
        }

        grid
    }

    /// Front vertex at corner (px, py), if allocated.
    pub fn front(&self, px: u32, py: u32) -> Option<u32> {
        self.cell(px, py).and_then(|c| self.front[c])
    }

    /// Back vertex at corner (px, py), if allocated.
    pub fn back(&self, px: u32, py: u32) -> Option<u32> {
        self.cell(px, py).and_then(|c| self.back[c])
    }

    /// Number of allocated corners (each has a front and a back vertex).
    pub fn allocated_corners(&self) -> usize {
        self.front.iter().filter(|c| c.is_some()).count()
    }

    fn cell(&self, px: u32, py: u32) -> Option<usize> {
        let px = px as usize;
        let py = py as usize;
        let rows = self.front.len() / self.columns;
        (px < self.columns && py < rows).then(|| py * self.columns + px)
    }
}
