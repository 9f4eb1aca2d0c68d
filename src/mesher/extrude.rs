//! Pixel-art extrusion: front and back faces plus edge walls.
//!
//! Every opaque pixel contributes a front quad and a back quad built from the
//! shared corner grid, so neighbouring faces share edges. Wherever an opaque
//! pixel borders a transparent (or out-of-bounds) neighbour, a wall quad with
//! its own four vertices closes the gap. Walls sample the pixel's centre so
//! the whole strip shows that pixel's colour.

use super::geometry::Mesh;
use super::grid::{GridLayout, VertexGrid};
use crate::texture::Silhouette;

/// A side of a pixel, in image space (rows grow downward).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl EdgeSide {
    pub const ALL: [EdgeSide; 4] = [
        EdgeSide::Left,
        EdgeSide::Right,
        EdgeSide::Top,
        EdgeSide::Bottom,
    ];

    /// Pixel offset of the neighbour across this side.
    pub fn offset(&self) -> (i64, i64) {
        match self {
            EdgeSide::Left => (-1, 0),
            EdgeSide::Right => (1, 0),
            EdgeSide::Top => (0, -1),
            EdgeSide::Bottom => (0, 1),
        }
    }

    /// Outward world-space normal. World Y points up, so the image's top
    /// side faces +Y.
    pub fn normal(&self) -> [f32; 3] {
        match self {
            EdgeSide::Left => [-1.0, 0.0, 0.0],
            EdgeSide::Right => [1.0, 0.0, 0.0],
            EdgeSide::Top => [0.0, 1.0, 0.0],
            EdgeSide::Bottom => [0.0, -1.0, 0.0],
        }
    }
}

/// Triangle counts per part of the solid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyCounts {
    pub front_quads: usize,
    pub back_quads: usize,
    pub wall_quads: usize,
    pub skipped_quads: usize,
}

/// Emit all faces and walls for the silhouette into `mesh`.
pub fn assemble(
    silhouette: &Silhouette<'_>,
    layout: &GridLayout,
    grid: &VertexGrid,
    mesh: &mut Mesh,
) -> AssemblyCounts {
    let mut counts = AssemblyCounts::default();

    for py in 0..layout.height {
        for px in 0..layout.width {
            if !silhouette.opaque(px as i64, py as i64) {
                continue;
            }

            let front = [
                grid.front(px, py),
                grid.front(px + 1, py),
                grid.front(px + 1, py + 1),
                grid.front(px, py + 1),
            ];
            match front {
                [Some(v00), Some(v10), Some(v11), Some(v01)] => {
                    mesh.add_quad(v00, v10, v11, v01);
                    counts.front_quads += 1;
                }
                _ => {
                    log::debug!("front quad at ({}, {}) missing grid corners", px, py);
                    counts.skipped_quads += 1;
                }
            }

            let back = [
                grid.back(px, py),
                grid.back(px + 1, py),
                grid.back(px + 1, py + 1),
                grid.back(px, py + 1),
            ];
            match back {
                [Some(v00), Some(v10), Some(v11), Some(v01)] => {
                    mesh.add_quad(v10, v00, v01, v11);
                    counts.back_quads += 1;
                }
                _ => {
                    log::debug!("back quad at ({}, {}) missing grid corners", px, py);
                    counts.skipped_quads += 1;
                }
            }

            for side in EdgeSide::ALL {
                let (dx, dy) = side.offset();
                if silhouette.opaque(px as i64 + dx, py as i64 + dy) {
                    continue;
                }
                add_wall(mesh, layout, px, py, side);
                counts.wall_quads += 1;
            }
        }
    }

    counts
}

/// Add one wall quad on `side` of pixel (px, py), with fresh vertices.
///
/// Corners are listed clockwise as seen from outside the wall, which is
/// what `Mesh::add_quad` expects.
fn add_wall(mesh: &mut Mesh, layout: &GridLayout, px: u32, py: u32, side: EdgeSide) {
    let x0 = layout.world_x(px as f32);
    let x1 = layout.world_x(px as f32 + 1.0);
    let y_top = layout.world_y(py as f32);
    let y_bottom = layout.world_y(py as f32 + 1.0);
    let zf = layout.half_depth;
    let zb = -layout.half_depth;

    let corners = match side {
        EdgeSide::Left => [
            [x0, y_top, zb],
            [x0, y_top, zf],
            [x0, y_bottom, zf],
            [x0, y_bottom, zb],
        ],
        EdgeSide::Right => [
            [x1, y_top, zf],
            [x1, y_top, zb],
            [x1, y_bottom, zb],
            [x1, y_bottom, zf],
        ],
        EdgeSide::Top => [
            [x0, y_top, zb],
            [x1, y_top, zb],
            [x1, y_top, zf],
            [x0, y_top, zf],
        ],
        EdgeSide::Bottom => [
            [x0, y_bottom, zf],
            [x1, y_bottom, zf],
            [x1, y_bottom, zb],
            [x0, y_bottom, zb],
        ],
    };

    let uv = layout.center_uv(px, py);
    mesh.push_quad(corners, [uv; 4], side.normal());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::PixelBuffer;

    fn layout(width: u32, height: u32) -> GridLayout {
        GridLayout {
            width,
            height,
            pixel_size: 1.0 / width.max(height) as f32,
            half_depth: 0.05,
        }
    }

    #[test]
    fn test_each_wall_winding_matches_its_normal() {
        for side in EdgeSide::ALL {
            let mut mesh = Mesh::new();
            add_wall(&mut mesh, &layout(1, 1), 0, 0, side);

            assert_eq!(mesh.vertex_count(), 4);
            assert_eq!(mesh.triangle_count(), 2);
            for t in 0..2 {
                let n = mesh.face_normal(t);
                let expected = side.normal();
                let dot: f32 = (0..3).map(|i| n[i] * expected[i]).sum();
                assert!(dot > 0.999, "{:?} triangle {} has normal {:?}", side, t, n);
            }
        }
    }

    #[test]
    fn test_wall_uses_pixel_centre_uv() {
        let mut mesh = Mesh::new();
        add_wall(&mut mesh, &layout(4, 4), 1, 2, EdgeSide::Top);
        for v in &mesh.vertices {
            assert_eq!(v.uv, [0.375, 0.625]);
        }
    }

    #[test]
    fn test_interior_neighbours_get_no_walls() {
        // Two pixels side by side: the shared edge must not get walls
        let buffer = PixelBuffer::filled(2, 1, [9, 9, 9, 255]).unwrap();
        let silhouette = Silhouette::new(&buffer, 128);
        let layout = layout(2, 1);
        let mut mesh = Mesh::new();
        let grid = VertexGrid::build(&silhouette, &layout, &mut mesh);
        let counts = assemble(&silhouette, &layout, &grid, &mut mesh);

        assert_eq!(counts.front_quads, 2);
        assert_eq!(counts.back_quads, 2);
        // Left of pixel 0, right of pixel 1, top and bottom of both
        assert_eq!(counts.wall_quads, 6);
        assert_eq!(counts.skipped_quads, 0);
    }

    #[test]
    fn test_missing_grid_corners_skip_quads() {
        // A grid built for a transparent buffer has no corners at all
        let empty = PixelBuffer::filled(1, 1, [0, 0, 0, 0]).unwrap();
        let opaque = PixelBuffer::filled(1, 1, [0, 0, 0, 255]).unwrap();
        let layout = layout(1, 1);

        let mut mesh = Mesh::new();
        let grid = VertexGrid::build(&Silhouette::new(&empty, 128), &layout, &mut mesh);
        let counts = assemble(&Silhouette::new(&opaque, 128), &layout, &grid, &mut mesh);

        assert_eq!(counts.front_quads, 0);
        assert_eq!(counts.back_quads, 0);
        assert_eq!(counts.skipped_quads, 2);
        assert_eq!(counts.wall_quads, 4);
        assert!(mesh.indices_in_bounds());
    }
}
