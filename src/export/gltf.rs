//! glTF/GLB export.

use crate::error::{MesherError, Result};
use crate::mesher::geometry::Mesh;
use crate::texture::PixelBuffer;
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use std::collections::BTreeMap;

/// Alpha cutoff of the exported material; matches the default silhouette
/// threshold of 128.
pub const ALPHA_CUTOFF: f32 = 0.5;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// Export a mesh to GLB (binary glTF) with `texture` embedded as PNG.
///
/// The single material is double sided, alpha-masked and sampled with
/// nearest filtering so pixel art stays crisp.
pub fn export_glb(mesh: &Mesh, texture: &PixelBuffer) -> Result<Vec<u8>> {
    if mesh.is_empty() {
        return Err(MesherError::Export("Cannot export empty mesh".to_string()));
    }

    let texture_png = texture.to_png()?;

    let mut buffer_data: Vec<u8> = Vec::new();
    let pos_offset = buffer_data.len();
    extend_f32(&mut buffer_data, &mesh.positions_flat());
    let norm_offset = buffer_data.len();
    extend_f32(&mut buffer_data, &mesh.normals_flat());
    let uv_offset = buffer_data.len();
    extend_f32(&mut buffer_data, &mesh.uvs_flat());
    let idx_offset = buffer_data.len();
    for index in &mesh.indices {
        buffer_data.extend_from_slice(&index.to_le_bytes());
    }
    let idx_end = buffer_data.len();

    // Image data is 4-byte aligned
    let texture_padding = (4 - (buffer_data.len() % 4)) % 4;
    buffer_data.extend(std::iter::repeat(0u8).take(texture_padding));
    let texture_offset = buffer_data.len();
    buffer_data.extend_from_slice(&texture_png);

    let vertex_count = mesh.vertex_count();
    let (min, max) = mesh.bounds();

    let buffer_views = vec![
        create_buffer_view(pos_offset, norm_offset - pos_offset, Some(json::buffer::Target::ArrayBuffer)),
        create_buffer_view(norm_offset, uv_offset - norm_offset, Some(json::buffer::Target::ArrayBuffer)),
        create_buffer_view(uv_offset, idx_offset - uv_offset, Some(json::buffer::Target::ArrayBuffer)),
        create_buffer_view(idx_offset, idx_end - idx_offset, Some(json::buffer::Target::ElementArrayBuffer)),
        create_buffer_view(texture_offset, texture_png.len(), None),
    ];

    let accessors = vec![
        create_accessor(0, vertex_count, json::accessor::Type::Vec3, json::accessor::ComponentType::F32, Some(min), Some(max)),
        create_accessor(1, vertex_count, json::accessor::Type::Vec3, json::accessor::ComponentType::F32, None, None),
        create_accessor(2, vertex_count, json::accessor::Type::Vec2, json::accessor::ComponentType::F32, None, None),
        create_accessor(3, mesh.indices.len(), json::accessor::Type::Scalar, json::accessor::ComponentType::U32, None, None),
    ];

    let root = json::Root {
        accessors,
        buffers: vec![json::Buffer {
            byte_length: USize64(buffer_data.len() as u64),
            extensions: Default::default(),
            extras: Default::default(),
            uri: None,
        }],
        buffer_views,
        images: vec![json::Image {
            buffer_view: Some(json::Index::new(4)),
            mime_type: Some(json::image::MimeType("image/png".to_string())),
            uri: None,
            extensions: Default::default(),
            extras: Default::default(),
        }],
        samplers: vec![json::texture::Sampler {
            mag_filter: Some(Valid(json::texture::MagFilter::Nearest)),
            min_filter: Some(Valid(json::texture::MinFilter::Nearest)),
            wrap_s: Valid(json::texture::WrappingMode::ClampToEdge),
            wrap_t: Valid(json::texture::WrappingMode::ClampToEdge),
            extensions: Default::default(),
            extras: Default::default(),
        }],
        textures: vec![json::Texture {
            sampler: Some(json::Index::new(0)),
            source: json::Index::new(0),
            extensions: Default::default(),
            extras: Default::default(),
        }],
        materials: vec![create_masked_material(0)],
        meshes: vec![json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            primitives: vec![create_primitive(0, 3, 0)],
            weights: None,
        }],
        nodes: vec![json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(0)),
            rotation: None,
            scale: None,
            translation: None,
            skin: None,
            weights: None,
        }],
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            nodes: vec![json::Index::new(0)],
        }],
        scene: Some(json::Index::new(0)),
        ..Default::default()
    };

    let json_string = json::serialize::to_string(&root)
        .map_err(|e| MesherError::Export(format!("Failed to serialize glTF JSON: {}", e)))?;

    Ok(assemble_glb(json_string.as_bytes(), &buffer_data))
}

/// Lay out the GLB container: header, JSON chunk, BIN chunk.
fn assemble_glb(json_bytes: &[u8], buffer_data: &[u8]) -> Vec<u8> {
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let padded_buffer_len = buffer_data.len() + buffer_padding;

    let total_size = 12 + 8 + padded_json_len + 8 + padded_buffer_len;
    let mut glb = Vec::with_capacity(total_size);

    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_size as u32).to_le_bytes());

    glb.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.extend(std::iter::repeat(0x20u8).take(json_padding));

    glb.extend_from_slice(&(padded_buffer_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat(0u8).take(buffer_padding));

    glb
}

fn extend_f32(buffer: &mut Vec<u8>, values: &[f32]) {
    buffer.reserve(values.len() * 4);
    for value in values {
        buffer.extend_from_slice(&value.to_le_bytes());
    }
}

fn create_buffer_view(
    offset: usize,
    size: usize,
    target: Option<json::buffer::Target>,
) -> json::buffer::View {
    json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: USize64(size as u64),
        byte_offset: Some(USize64(offset as u64)),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        target: target.map(Valid),
    }
}

fn create_accessor(
    buffer_view: u32,
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    min: Option<[f32; 3]>,
    max: Option<[f32; 3]>,
) -> json::Accessor {
    json::Accessor {
        buffer_view: Some(json::Index::new(buffer_view)),
        byte_offset: Some(USize64(0)),
        count: USize64(count as u64),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min: min.map(|m| json::Value::from(m.to_vec())),
        max: max.map(|m| json::Value::from(m.to_vec())),
        normalized: false,
        sparse: None,
    }
}

/// Primitive whose position, normal and uv accessors follow each other.
fn create_primitive(
    positions_accessor: u32,
    indices_accessor: u32,
    material: u32,
) -> json::mesh::Primitive {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        Valid(json::mesh::Semantic::Positions),
        json::Index::new(positions_accessor),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::Normals),
        json::Index::new(positions_accessor + 1),
    );
    attributes.insert(
        Valid(json::mesh::Semantic::TexCoords(0)),
        json::Index::new(positions_accessor + 2),
    );

    json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: Some(json::Index::new(indices_accessor)),
        material: Some(json::Index::new(material)),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    }
}

fn create_masked_material(texture_idx: u32) -> json::Material {
    json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: Some(json::texture::Info {
                index: json::Index::new(texture_idx),
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            }),
            base_color_factor: json::material::PbrBaseColorFactor([1.0, 1.0, 1.0, 1.0]),
            metallic_factor: json::material::StrengthFactor(0.0),
            roughness_factor: json::material::StrengthFactor(1.0),
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        },
        alpha_mode: Valid(json::material::AlphaMode::Mask),
        alpha_cutoff: Some(json::material::AlphaCutoff(ALPHA_CUTOFF)),
        double_sided: true,
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: json::material::EmissiveFactor([0.0, 0.0, 0.0]),
        extensions: Default::default(),
        extras: Default::default(),
    }
}
