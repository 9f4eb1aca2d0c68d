//! Wavefront OBJ export.
//!
//! Produces an OBJ, a matching MTL and the PNG it references. OBJ texture
//! coordinates have a bottom-left origin, so V is flipped on the way out.

use crate::error::{MesherError, Result};
use crate::mesher::geometry::Mesh;
use crate::texture::PixelBuffer;
use std::fmt::Write;

/// Export a mesh to OBJ format.
/// Returns (obj_content, mtl_content); the MTL references `{name}.png`.
pub fn export_obj(mesh: &Mesh, name: &str) -> Result<(String, String)> {
    let mut obj = String::with_capacity(256 + mesh.vertex_count() * 120 + mesh.triangle_count() * 40);
    let mut mtl = String::with_capacity(256);

    write_obj(&mut obj, mesh, name)
        .and_then(|_| write_mtl(&mut mtl, name))
        .map_err(|e| MesherError::Export(format!("Failed to format OBJ: {}", e)))?;

    Ok((obj, mtl))
}

fn write_obj(obj: &mut String, mesh: &Mesh, name: &str) -> std::fmt::Result {
    writeln!(obj, "# Item Mesher OBJ Export")?;
    writeln!(obj, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(obj, "# Triangles: {}", mesh.triangle_count())?;
    writeln!(obj)?;
    writeln!(obj, "mtllib {}.mtl", name)?;
    writeln!(obj, "o {}", name)?;
    writeln!(obj)?;

    for vertex in &mesh.vertices {
        let [x, y, z] = vertex.position;
        writeln!(obj, "v {} {} {}", x, y, z)?;
    }
    for vertex in &mesh.vertices {
        writeln!(obj, "vt {} {}", vertex.uv[0], 1.0 - vertex.uv[1])?;
    }
    for vertex in &mesh.vertices {
        let [x, y, z] = vertex.normal;
        writeln!(obj, "vn {} {} {}", x, y, z)?;
    }
    writeln!(obj)?;

    writeln!(obj, "usemtl {}_material", name)?;
    for tri in mesh.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
        writeln!(
            obj,
            "f {}/{}/{} {}/{}/{} {}/{}/{}",
            i0, i0, i0, i1, i1, i1, i2, i2, i2
        )?;
    }
    Ok(())
}

fn write_mtl(mtl: &mut String, name: &str) -> std::fmt::Result {
    writeln!(mtl, "# Item Mesher Material")?;
    writeln!(mtl)?;
    writeln!(mtl, "newmtl {}_material", name)?;
    writeln!(mtl, "Ka 1.0 1.0 1.0")?;
    writeln!(mtl, "Kd 1.0 1.0 1.0")?;
    writeln!(mtl, "Ks 0.0 0.0 0.0")?;
    writeln!(mtl, "Ns 10.0")?;
    writeln!(mtl, "d 1.0")?;
    writeln!(mtl, "illum 1")?;
    writeln!(mtl, "map_Kd {}.png", name)?;
    writeln!(mtl, "map_d {}.png", name)?;
    Ok(())
}

/// OBJ, MTL and texture bytes ready to be written side by side.
#[derive(Debug, Clone)]
pub struct ObjExport {
    pub name: String,
    pub obj: String,
    pub mtl: String,
    pub texture_png: Vec<u8>,
}

impl ObjExport {
    pub fn new(mesh: &Mesh, texture: &PixelBuffer, name: &str) -> Result<Self> {
        let (obj, mtl) = export_obj(mesh, name)?;
        Ok(Self {
            name: name.to_string(),
            obj,
            mtl,
            texture_png: texture.to_png()?,
        })
    }

    /// Write `{name}.obj`, `{name}.mtl` and `{name}.png` into `dir`.
    pub fn write_to_dir<P: AsRef<std::path::Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::write(dir.join(format!("{}.obj", self.name)), &self.obj)?;
        std::fs::write(dir.join(format!("{}.mtl", self.name)), &self.mtl)?;
        std::fs::write(dir.join(format!("{}.png", self.name)), &self.texture_png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesher::geometry::Vertex;
    use crate::mesher::{build_extruded_mesh, ExtrusionConfig};

    #[test]
    fn test_export_simple_obj() {
        let mut mesh = Mesh::new();
        let v0 = mesh.add_vertex(Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]));
        let v1 = mesh.add_vertex(Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0]));
        let v2 = mesh.add_vertex(Vertex::new([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 1.0]));
        mesh.add_triangle(v0, v1, v2);

        let (obj, mtl) = export_obj(&mesh, "test").unwrap();

        assert!(obj.contains("v 0 0 0"));
        // Top-left origin (0, 0) becomes bottom-left (0, 1)
        assert!(obj.contains("vt 0 1"));
        assert!(obj.contains("vt 0 0"));
        assert!(obj.contains("vn 0 1 0"));
        assert!(obj.contains("f 1/1/1 2/2/2 3/3/3"));
        assert!(mtl.contains("newmtl test_material"));
        assert!(mtl.contains("map_Kd test.png"));
    }

    #[test]
    fn test_face_count_matches_triangles() {
        let texture = PixelBuffer::filled(3, 2, [1, 2, 3, 255]).unwrap();
        let extruded = build_extruded_mesh(&texture, &ExtrusionConfig::default()).unwrap();
        let export = ObjExport::new(&extruded.mesh, &texture, "item").unwrap();

        let faces = export.obj.lines().filter(|l| l.starts_with("f ")).count();
        let positions = export.obj.lines().filter(|l| l.starts_with("v ")).count();
        assert_eq!(faces, extruded.total_triangles());
        assert_eq!(positions, extruded.total_vertices());
        assert_eq!(&export.texture_png[1..4], b"PNG");
    }

    #[test]
    fn test_write_to_dir() {
        let texture = PixelBuffer::filled(2, 2, [1, 2, 3, 255]).unwrap();
        let extruded = build_extruded_mesh(&texture, &ExtrusionConfig::default()).unwrap();
        let export = ObjExport::new(&extruded.mesh, &texture, "sword").unwrap();

        let dir = tempfile::tempdir().unwrap();
        export.write_to_dir(dir.path()).unwrap();
        for ext in ["obj", "mtl", "png"] {
            assert!(dir.path().join(format!("sword.{}", ext)).exists());
        }
    }
}
