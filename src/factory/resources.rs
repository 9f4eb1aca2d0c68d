//! Renderer resources allocated for item renderables.
//!
//! The factory never talks to a GPU directly. It describes textures,
//! materials and geometry and hands them to a [`ResourceAllocator`]; every
//! handle it gets back is recorded in a [`ResourceBundle`] so the whole set
//! can be released in one call.

use crate::error::Result;
use crate::mesher::Mesh;
use crate::texture::PixelBuffer;
use std::collections::HashMap;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u32);

/// Any allocated resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceHandle {
    Texture(TextureId),
    Material(MaterialId),
    Geometry(GeometryId),
}

/// Maps mesh UVs onto a texture image.
///
/// `sampled = offset + uv * repeat` in bottom-left-origin space; when
/// `flip_y` is set the image rows are addressed top-down, so the final V
/// is `1 - sampled.v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub offset: [f32; 2],
    pub repeat: [f32; 2],
    pub flip_y: bool,
}

impl UvTransform {
    /// UVs address the image directly with a top-left origin.
    pub const IDENTITY: UvTransform = UvTransform {
        offset: [0.0, 0.0],
        repeat: [1.0, 1.0],
        flip_y: false,
    };

    /// Top-left-origin image coordinate sampled for a mesh UV.
    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        let u = self.offset[0] + uv[0] * self.repeat[0];
        let v = self.offset[1] + uv[1] * self.repeat[1];
        if self.flip_y {
            [u, 1.0 - v]
        } else {
            [u, v]
        }
    }
}

/// Where a texture's texels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// A view onto the shared atlas image (the atlas itself is not copied).
    Atlas,
    /// Texels generated by the factory.
    Pixels(PixelBuffer),
}

/// A texture to create. Item textures are always sampled with nearest
/// filtering so pixel edges stay hard.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub source: TextureSource,
    pub transform: UvTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Camera-facing billboard.
    Sprite,
    /// Regular lit mesh material.
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceSide {
    Front,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDesc {
    pub kind: MaterialKind,
    pub texture: TextureId,
    pub side: FaceSide,
    /// Fragments with alpha below this are discarded.
    pub alpha_test: f32,
    pub transparent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDesc {
    pub mesh: Mesh,
    /// Index ranges drawn with separate material slots; empty means one
    /// slot covering all indices.
    pub groups: Vec<Range<usize>>,
}

impl GeometryDesc {
    pub fn single(mesh: Mesh) -> Self {
        Self {
            mesh,
            groups: Vec::new(),
        }
    }
}

/// Renderer backend seam.
pub trait ResourceAllocator {
    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureId>;
    fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialId>;
    fn create_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryId>;
    fn release(&mut self, handle: ResourceHandle);
}

/// Every resource allocated for one renderable.
///
/// Allocation goes through the bundle, so the release list can never miss
/// a resource. `release` consumes the bundle.
#[derive(Debug, Default)]
#[must_use = "resources leak unless the bundle is released"]
pub struct ResourceBundle {
    handles: Vec<ResourceHandle>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture<A: ResourceAllocator + ?Sized>(
        &mut self,
        alloc: &mut A,
        desc: TextureDesc,
    ) -> Result<TextureId> {
        let id = alloc.create_texture(desc)?;
        self.handles.push(ResourceHandle::Texture(id));
        Ok(id)
    }

    pub fn material<A: ResourceAllocator + ?Sized>(
        &mut self,
        alloc: &mut A,
        desc: MaterialDesc,
    ) -> Result<MaterialId> {
        let id = alloc.create_material(desc)?;
        self.handles.push(ResourceHandle::Material(id));
        Ok(id)
    }

    pub fn geometry<A: ResourceAllocator + ?Sized>(
        &mut self,
        alloc: &mut A,
        desc: GeometryDesc,
    ) -> Result<GeometryId> {
        let id = alloc.create_geometry(desc)?;
        self.handles.push(ResourceHandle::Geometry(id));
        Ok(id)
    }

    pub fn handles(&self) -> &[ResourceHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Release everything, most recently allocated first.
    pub fn release<A: ResourceAllocator + ?Sized>(self, alloc: &mut A) {
        for handle in self.handles.into_iter().rev() {
            alloc.release(handle);
        }
    }
}

/// A stored resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Texture(TextureDesc),
    Material(MaterialDesc),
    Geometry(GeometryDesc),
}

/// In-memory allocator that keeps every live resource.
///
/// Useful for headless pipelines (export, inspection) and for checking
/// that renderables release what they allocate.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    next_id: u32,
    textures: HashMap<TextureId, TextureDesc>,
    materials: HashMap<MaterialId, MaterialDesc>,
    geometries: HashMap<GeometryId, GeometryDesc>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn texture(&self, id: TextureId) -> Option<&TextureDesc> {
        self.textures.get(&id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialDesc> {
        self.materials.get(&id)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&GeometryDesc> {
        self.geometries.get(&id)
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<Resource> {
        match handle {
            ResourceHandle::Texture(id) => self.texture(id).cloned().map(Resource::Texture),
            ResourceHandle::Material(id) => self.material(id).copied().map(Resource::Material),
            ResourceHandle::Geometry(id) => self.geometry(id).cloned().map(Resource::Geometry),
        }
    }

    /// Number of resources not yet released.
    pub fn live_count(&self) -> usize {
        self.textures.len() + self.materials.len() + self.geometries.len()
    }
}

impl ResourceAllocator for ResourceRegistry {
    fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureId> {
        let id = TextureId(self.allocate_id());
        self.textures.insert(id, desc);
        Ok(id)
    }

    fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialId> {
        let id = MaterialId(self.allocate_id());
        self.materials.insert(id, desc);
        Ok(id)
    }

    fn create_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryId> {
        let id = GeometryId(self.allocate_id());
        self.geometries.insert(id, desc);
        Ok(id)
    }

    fn release(&mut self, handle: ResourceHandle) {
        let removed = match handle {
            ResourceHandle::Texture(id) => self.textures.remove(&id).is_some(),
            ResourceHandle::Material(id) => self.materials.remove(&id).is_some(),
            ResourceHandle::Geometry(id) => self.geometries.remove(&id).is_some(),
        };
        if !removed {
            log::warn!("release of unknown resource {:?}", handle);
        }
    }
}
