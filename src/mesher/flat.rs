//! Flat item geometry: sprite plane and the two-sided fallback plane.
//!
//! UVs here use a bottom-left origin (v = 0 at the bottom edge). The
//! texture transforms attached by the factory map them back onto the
//! top-left-addressed atlas.

use super::geometry::Mesh;
use std::ops::Range;

/// Half extents of a plane whose longer side is one unit.
fn half_extents(width: u32, height: u32) -> (f32, f32) {
    let longest = width.max(height).max(1) as f32;
    (
        width as f32 / longest * 0.5,
        height as f32 / longest * 0.5,
    )
}

/// A single +Z facing quad sized to the item's aspect ratio.
pub fn sprite_plane(width: u32, height: u32) -> Mesh {
    let (hx, hy) = half_extents(width, height);
    let mut mesh = Mesh::with_capacity(4, 6);
    mesh.push_quad(
        [[-hx, hy, 0.0], [hx, hy, 0.0], [hx, -hy, 0.0], [-hx, -hy, 0.0]],
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        [0.0, 0.0, 1.0],
    );
    mesh
}

/// Geometry of the zero-depth fallback: a front and a back face at z = 0.
#[derive(Debug, Clone)]
pub struct DualPlane {
    pub mesh: Mesh,
    /// Index range of the +Z face.
    pub front: Range<usize>,
    /// Index range of the -Z face.
    pub back: Range<usize>,
}

/// Build the two-sided plane. The back face's U runs right-to-left in
/// world space; paired with a horizontally mirrored texture this lines
/// each texel up with the same texel on the front.
pub fn dual_plane(width: u32, height: u32) -> DualPlane {
    let (hx, hy) = half_extents(width, height);
    let mut mesh = Mesh::with_capacity(8, 12);

    mesh.push_quad(
        [[-hx, hy, 0.0], [hx, hy, 0.0], [hx, -hy, 0.0], [-hx, -hy, 0.0]],
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        [0.0, 0.0, 1.0],
    );
    let front = 0..mesh.indices.len();

    mesh.push_quad(
        [[hx, hy, 0.0], [-hx, hy, 0.0], [-hx, -hy, 0.0], [hx, -hy, 0.0]],
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        [0.0, 0.0, -1.0],
    );
    let back = front.end..mesh.indices.len();

    DualPlane { mesh, front, back }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_plane_aspect() {
        let mesh = sprite_plane(8, 16);
        let (min, max) = mesh.bounds();
        assert_eq!(min, [-0.25, -0.5, 0.0]);
        assert_eq!(max, [0.25, 0.5, 0.0]);
        assert_eq!(mesh.face_normal(0), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_dual_plane_faces_point_opposite_ways() {
        let plane = dual_plane(16, 16);
        assert_eq!(plane.mesh.vertex_count(), 8);
        assert_eq!(plane.front, 0..6);
        assert_eq!(plane.back, 6..12);
        assert_eq!(plane.mesh.face_normal(0), [0.0, 0.0, 1.0]);
        assert_eq!(plane.mesh.face_normal(2), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_dual_plane_has_zero_depth() {
        let plane = dual_plane(4, 2);
        let (min, max) = plane.mesh.bounds();
        assert_eq!(min[2], 0.0);
        assert_eq!(max[2], 0.0);
        assert_eq!(max[0] - min[0], 1.0);
        assert_eq!(max[1] - min[1], 0.5);
    }
}
