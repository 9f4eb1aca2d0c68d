//! WASM bindings for item-mesher.
//!
//! This module provides JavaScript-friendly APIs for use in the browser.

use crate::atlas::{AtlasRegion, PixelSource};
use crate::export::{export_glb, export_raw, RawMeshData};
use crate::mesher::{build_extruded_mesh, ExtrudedMesh, ExtrusionConfig};
use crate::texture::PixelBuffer;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
}

/// Extrusion options.
#[wasm_bindgen]
#[derive(Default)]
pub struct ExtrusionOptions {
    config: ExtrusionConfig,
}

#[wasm_bindgen]
impl ExtrusionOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ExtrusionOptions {
        ExtrusionOptions::default()
    }

    #[wasm_bindgen(setter)]
    pub fn set_depth(&mut self, value: f32) {
        self.config.depth = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_pixel_size(&mut self, value: f32) {
        self.config.pixel_size = Some(value);
    }

    #[wasm_bindgen(setter)]
    pub fn set_alpha_threshold(&mut self, value: u8) {
        self.config.alpha_threshold = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_smooth_normals(&mut self, value: bool) {
        self.config.smooth_normals = value;
    }
}

/// An extruded item as flat vertex arrays.
#[wasm_bindgen]
pub struct ItemMeshResult {
    raw: RawMeshData,
    grid_vertices: usize,
    wall_vertices: usize,
}

#[wasm_bindgen]
impl ItemMeshResult {
    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.raw.positions_flat()[..])
    }

    #[wasm_bindgen(getter)]
    pub fn normals(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.raw.normals_flat()[..])
    }

    /// Texture coordinates with a top-left origin.
    #[wasm_bindgen(getter)]
    pub fn uvs(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(&self.raw.uvs_flat()[..])
    }

    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(&self.raw.indices[..])
    }

    #[wasm_bindgen(getter)]
    pub fn vertex_count(&self) -> usize {
        self.raw.vertex_count()
    }

    #[wasm_bindgen(getter)]
    pub fn triangle_count(&self) -> usize {
        self.raw.triangle_count()
    }

    /// Vertices shared by the front and back faces.
    #[wasm_bindgen(getter)]
    pub fn grid_vertices(&self) -> usize {
        self.grid_vertices
    }

    /// Vertices owned by edge walls.
    #[wasm_bindgen(getter)]
    pub fn wall_vertices(&self) -> usize {
        self.wall_vertices
    }
}

fn extrude(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    options: Option<ExtrusionOptions>,
) -> Result<(PixelBuffer, ExtrudedMesh), JsError> {
    let config = options.unwrap_or_default().config;
    let buffer = PixelBuffer::new(width, height, pixels).map_err(|e| JsError::new(&e.to_string()))?;
    let extruded = build_extruded_mesh(&buffer, &config).map_err(|e| JsError::new(&e.to_string()))?;
    Ok((buffer, extruded))
}

/// Extrude an RGBA8 texture into a solid item mesh.
#[wasm_bindgen]
pub fn extrude_item(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    options: Option<ExtrusionOptions>,
) -> Result<ItemMeshResult, JsError> {
    let (buffer, extruded) = extrude(pixels, width, height, options)?;
    Ok(ItemMeshResult {
        raw: export_raw(&extruded.mesh, &buffer),
        grid_vertices: extruded.stats.grid_vertices,
        wall_vertices: extruded.stats.wall_vertices,
    })
}

/// Extrude an RGBA8 texture and return it as GLB bytes.
#[wasm_bindgen]
pub fn extrude_item_glb(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    options: Option<ExtrusionOptions>,
) -> Result<Vec<u8>, JsError> {
    let (buffer, extruded) = extrude(pixels, width, height, options)?;
    export_glb(&extruded.mesh, &buffer).map_err(|e| JsError::new(&e.to_string()))
}

/// Extrude one region of a PNG atlas and return it as GLB bytes.
///
/// The region is given in normalized atlas coordinates from the top-left.
#[wasm_bindgen]
pub fn extrude_atlas_region_glb(
    atlas_png: &[u8],
    u: f32,
    v: f32,
    size_x: f32,
    size_y: f32,
    options: Option<ExtrusionOptions>,
) -> Result<Vec<u8>, JsError> {
    let config = options.unwrap_or_default().config;
    let atlas = PixelBuffer::from_png_bytes(atlas_png).map_err(|e| JsError::new(&e.to_string()))?;
    let texture = atlas
        .read_region(&AtlasRegion::from_size(u, v, size_x, size_y))
        .map_err(|e| JsError::new(&e.to_string()))?;
    let extruded = build_extruded_mesh(&texture, &config).map_err(|e| JsError::new(&e.to_string()))?;
    export_glb(&extruded.mesh, &texture).map_err(|e| JsError::new(&e.to_string()))
}
