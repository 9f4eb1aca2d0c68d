//! # Item Mesher
//!
//! A Rust library for turning pixel-art item textures into renderable meshes.
//!
//! ## Overview
//!
//! Given a texture atlas and the region an item occupies in it, this library
//! builds one of three renderables: a camera-facing sprite, a flat two-sided
//! plane, or a solid extrusion of the texture's opaque pixels whose edges
//! are closed by per-pixel walls.
//!
//! ## Quick Start
//!
//! ```ignore
//! use item_mesher::{build_extruded_mesh, export_glb, ExtrusionConfig, PixelBuffer};
//!
//! let texture = PixelBuffer::load("diamond_sword.png")?;
//! let extruded = build_extruded_mesh(&texture, &ExtrusionConfig::default())?;
//!
//! let glb_bytes = export_glb(&extruded.mesh, &texture)?;
//! ```
//!
//! ## Renderer Integration
//!
//! [`ItemMeshFactory`] describes textures, materials and geometry through the
//! [`ResourceAllocator`] trait, so any renderer can back it. Each renderable
//! owns the resources it allocated and releases them on `dispose`:
//!
//! ```ignore
//! use item_mesher::{ItemMeshFactory, RenderStrategy, ResourceRegistry};
//!
//! let atlas = item_mesher::load_atlas("items.png", Some("items.json"))?;
//! let region = *atlas.get_region("diamond_sword").unwrap();
//!
//! let mut registry = ResourceRegistry::new();
//! let item = ItemMeshFactory::default()
//!     .create(&atlas, &region, RenderStrategy::Extruded, &mut registry)?;
//! // ... draw ...
//! item.dispose(&mut registry);
//! ```

pub mod error;
pub mod texture;
pub mod atlas;
pub mod mesher;
pub mod factory;
pub mod export;

// Re-export main types for convenience
pub use error::{MesherError, Result};
pub use texture::{PixelBuffer, Silhouette, DEFAULT_ALPHA_THRESHOLD};
pub use atlas::{AtlasBuilder, AtlasRegion, PixelSource, TextureAtlas};
pub use mesher::{build_extruded_mesh, ExtrudedMesh, ExtrusionConfig, Mesh, MeshStats, Vertex};
pub use factory::{
    FactoryConfig, ItemMeshFactory, ItemNode, ItemRenderable, RenderKind, RenderStrategy,
    ResourceAllocator, ResourceRegistry,
};
pub use export::gltf::export_glb;
pub use export::obj::{export_obj, ObjExport};
pub use export::raw::{export_raw, RawMeshData};

/// Load an atlas image, with its named regions if a JSON table is given.
pub fn load_atlas<P: AsRef<std::path::Path>>(
    png_path: P,
    regions_path: Option<P>,
) -> Result<TextureAtlas> {
    let png = std::fs::read(png_path)?;
    match regions_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            TextureAtlas::from_png_and_json(&png, &json)
        }
        None => Ok(TextureAtlas::new(
            PixelBuffer::from_png_bytes(&png)?,
            Default::default(),
        )),
    }
}

#[cfg(feature = "wasm")]
pub mod wasm;
