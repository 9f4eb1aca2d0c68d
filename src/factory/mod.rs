//! Renderable item construction.
//!
//! [`ItemMeshFactory`] turns an atlas region into one of three renderables:
//! a camera-facing sprite, an extruded solid, or a two-sided flat plane. The
//! extruded path degrades to the flat plane when anything goes wrong after
//! input validation, so a valid request always produces something drawable.

pub mod resources;

pub use resources::{
    FaceSide, GeometryDesc, GeometryId, MaterialDesc, MaterialId, MaterialKind, Resource,
    ResourceAllocator, ResourceBundle, ResourceHandle, ResourceRegistry, TextureDesc,
    TextureId, TextureSource, UvTransform,
};

use crate::atlas::{AtlasRegion, PixelRect, PixelSource};
use crate::error::Result;
use crate::mesher::{build_extruded_mesh, flat, ExtrusionConfig, MeshStats};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Which kind of renderable to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Billboard that always faces the camera.
    FaceCamera,
    /// Extruded pixel-art solid.
    Extruded,
    /// Two opposite-facing textured quads.
    Flat,
}

/// Factory configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    pub extrusion: ExtrusionConfig,
    /// When false, `Extruded` requests are served with the flat plane.
    pub enable_extrusion: bool,
    /// Alpha-test cutoff for every material the factory creates.
    pub alpha_test: f32,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            extrusion: ExtrusionConfig::default(),
            enable_extrusion: true,
            alpha_test: 0.1,
        }
    }
}

impl FactoryConfig {
    pub fn with_extrusion(mut self, extrusion: ExtrusionConfig) -> Self {
        self.extrusion = extrusion;
        self
    }

    pub fn with_extrusion_enabled(mut self, enabled: bool) -> Self {
        self.enable_extrusion = enabled;
        self
    }

    pub fn with_alpha_test(mut self, alpha_test: f32) -> Self {
        self.alpha_test = alpha_test;
        self
    }
}

/// The scene node a renderable consists of.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemNode {
    Sprite {
        geometry: GeometryId,
        material: MaterialId,
    },
    Extruded {
        geometry: GeometryId,
        material: MaterialId,
        stats: MeshStats,
    },
    DualPlane {
        geometry: GeometryId,
        front_material: MaterialId,
        back_material: MaterialId,
    },
}

/// Discriminant of [`ItemNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    Sprite,
    Extruded,
    DualPlane,
}

/// A ready-to-insert renderable plus the resources it owns.
#[derive(Debug)]
#[must_use = "renderables own renderer resources and must be disposed"]
pub struct ItemRenderable {
    pub node: ItemNode,
    /// Local transform; the factory always leaves this at identity.
    pub transform: Mat4,
    /// Why the extruded path fell back to the flat plane, if it did.
    pub fallback_reason: Option<String>,
    resources: ResourceBundle,
}

impl ItemRenderable {
    fn new(node: ItemNode, resources: ResourceBundle) -> Self {
        Self {
            node,
            transform: Mat4::IDENTITY,
            fallback_reason: None,
            resources,
        }
    }

    pub fn kind(&self) -> RenderKind {
        match self.node {
            ItemNode::Sprite { .. } => RenderKind::Sprite,
            ItemNode::Extruded { .. } => RenderKind::Extruded,
            ItemNode::DualPlane { .. } => RenderKind::DualPlane,
        }
    }

    /// Handles of every resource this renderable allocated.
    pub fn resources(&self) -> &[ResourceHandle] {
        self.resources.handles()
    }

    /// Release every texture, material and geometry this renderable owns.
    pub fn dispose<A: ResourceAllocator + ?Sized>(self, alloc: &mut A) {
        self.resources.release(alloc);
    }
}

/// Builds item renderables from atlas regions.
#[derive(Debug, Clone, Default)]
pub struct ItemMeshFactory {
    config: FactoryConfig,
}

impl ItemMeshFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Build a renderable for `region` of `source`.
    ///
    /// Invalid input (an empty or out-of-range region, a zero-sized source,
    /// bad extrusion parameters) is returned as an error. Failures while
    /// extracting or extruding are logged and answered with the flat plane.
    /// If the allocator also fails on the flat-plane path, its error
    /// (usually [`MesherError::Allocation`]) is returned and nothing stays
    /// allocated.
    pub fn create<S, A>(
        &self,
        source: &S,
        region: &AtlasRegion,
        strategy: RenderStrategy,
        alloc: &mut A,
    ) -> Result<ItemRenderable>
    where
        S: PixelSource + ?Sized,
        A: ResourceAllocator + ?Sized,
    {
        let (atlas_width, atlas_height) = source.dimensions();
        let rect = region.to_pixel_rect(atlas_width, atlas_height)?;

        match strategy {
            RenderStrategy::FaceCamera => self.build_sprite(region, rect, alloc),
            RenderStrategy::Extruded if self.config.enable_extrusion => {
                self.config.extrusion.validate_for(rect.width, rect.height)?;
                match self.build_extruded(source, region, alloc) {
                    Ok(item) => Ok(item),
                    Err(e) => {
                        log::warn!(
                            "3D extrusion of region {:?} failed, using flat plane: {}",
                            region,
                            e
                        );
                        let mut item = self.build_dual_plane(region, rect, alloc)?;
                        item.fallback_reason = Some(e.to_string());
                        Ok(item)
                    }
                }
            }
            RenderStrategy::Extruded | RenderStrategy::Flat => {
                self.build_dual_plane(region, rect, alloc)
            }
        }
    }

    /// Atlas transform for a region: the mesh UVs have a bottom-left origin
    /// while the atlas is addressed from the top-left.
    fn region_transform(region: &AtlasRegion, mirrored: bool) -> UvTransform {
        let (u, v) = (region.u_min, region.v_min);
        let (size_x, size_y) = (region.width(), region.height());
        if mirrored {
            UvTransform {
                offset: [u + size_x, 1.0 - v - size_y],
                repeat: [-size_x, size_y],
                flip_y: true,
            }
        } else {
            UvTransform {
                offset: [u, 1.0 - v - size_y],
                repeat: [size_x, size_y],
                flip_y: true,
            }
        }
    }

    fn build_sprite<A: ResourceAllocator + ?Sized>(
        &self,
        region: &AtlasRegion,
        rect: PixelRect,
        alloc: &mut A,
    ) -> Result<ItemRenderable> {
        let mut bundle = ResourceBundle::new();
        let result = (|| -> Result<ItemNode> {
            let texture = bundle.texture(
                alloc,
                TextureDesc {
                    source: TextureSource::Atlas,
                    transform: Self::region_transform(region, false),
                },
            )?;
            let material = bundle.material(
                alloc,
                MaterialDesc {
                    kind: MaterialKind::Sprite,
                    texture,
                    side: FaceSide::Front,
                    alpha_test: self.config.alpha_test,
                    transparent: true,
                },
            )?;
            let geometry = bundle.geometry(
                alloc,
                GeometryDesc::single(flat::sprite_plane(rect.width, rect.height)),
            )?;
            Ok(ItemNode::Sprite { geometry, material })
        })();
        finish(result, bundle, alloc)
    }

    fn build_extruded<S, A>(
        &self,
        source: &S,
        region: &AtlasRegion,
        alloc: &mut A,
    ) -> Result<ItemRenderable>
    where
        S: PixelSource + ?Sized,
        A: ResourceAllocator + ?Sized,
    {
        let pixels = source.read_region(region)?;
        let extruded = build_extruded_mesh(&pixels, &self.config.extrusion)?;
        let stats = extruded.stats;

        let mut bundle = ResourceBundle::new();
        let result = (|| -> Result<ItemNode> {
            let texture = bundle.texture(
                alloc,
                TextureDesc {
                    source: TextureSource::Pixels(pixels),
                    transform: UvTransform::IDENTITY,
                },
            )?;
            let material = bundle.material(
                alloc,
                MaterialDesc {
                    kind: MaterialKind::Standard,
                    texture,
                    side: FaceSide::Double,
                    alpha_test: self.config.alpha_test,
                    transparent: false,
                },
            )?;
            let geometry = bundle.geometry(alloc, GeometryDesc::single(extruded.mesh))?;
            Ok(ItemNode::Extruded {
                geometry,
                material,
                stats,
            })
        })();
        finish(result, bundle, alloc)
    }

    fn build_dual_plane<A: ResourceAllocator + ?Sized>(
        &self,
        region: &AtlasRegion,
        rect: PixelRect,
        alloc: &mut A,
    ) -> Result<ItemRenderable> {
        let mut bundle = ResourceBundle::new();
        let result = (|| -> Result<ItemNode> {
            let mut materials = Vec::with_capacity(2);
            for mirrored in [false, true] {
                let texture = bundle.texture(
                    alloc,
                    TextureDesc {
                        source: TextureSource::Atlas,
                        transform: Self::region_transform(region, mirrored),
                    },
                )?;
                materials.push(bundle.material(
                    alloc,
                    MaterialDesc {
                        kind: MaterialKind::Standard,
                        texture,
                        side: FaceSide::Front,
                        alpha_test: self.config.alpha_test,
                        transparent: true,
                    },
                )?);
            }

            let plane = flat::dual_plane(rect.width, rect.height);
            let geometry = bundle.geometry(
                alloc,
                GeometryDesc {
                    mesh: plane.mesh,
                    groups: vec![plane.front, plane.back],
                },
            )?;
            Ok(ItemNode::DualPlane {
                geometry,
                front_material: materials[0],
                back_material: materials[1],
            })
        })();
        finish(result, bundle, alloc)
    }
}

/// Wrap a built node, or release whatever was allocated before the failure.
fn finish<A: ResourceAllocator + ?Sized>(
    result: Result<ItemNode>,
    bundle: ResourceBundle,
    alloc: &mut A,
) -> Result<ItemRenderable> {
    match result {
        Ok(node) => Ok(ItemRenderable::new(node, bundle)),
        Err(e) => {
            bundle.release(alloc);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MesherError;
    use crate::texture::PixelBuffer;

    /// 32x16 atlas: left half an opaque 16x16 item with a transparent
    /// border, right half fully transparent.
    fn test_atlas() -> PixelBuffer {
        let mut pixels = vec![0u8; 32 * 16 * 4];
        for y in 2..14 {
            for x in 2..14 {
                let idx = (y * 32 + x) * 4;
                pixels[idx..idx + 4].copy_from_slice(&[90, 60, 30, 255]);
            }
        }
        PixelBuffer::new(32, 16, pixels).unwrap()
    }

    fn left_item() -> AtlasRegion {
        AtlasRegion::from_size(0.0, 0.0, 0.5, 1.0)
    }

    #[test]
    fn test_extruded_item() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();
        let factory = ItemMeshFactory::default();

        let item = factory
            .create(&atlas, &left_item(), RenderStrategy::Extruded, &mut registry)
            .unwrap();

        assert_eq!(item.kind(), RenderKind::Extruded);
        assert_eq!(item.transform, Mat4::IDENTITY);
        assert!(item.fallback_reason.is_none());
        let ItemNode::Extruded {
            geometry,
            material,
            stats,
        } = item.node.clone()
        else {
            panic!("expected extruded node");
        };
        assert_eq!(stats.front_triangles, 2 * 12 * 12);
        assert_eq!(stats.wall_triangles, 2 * 4 * 12);

        let material = registry.material(material).unwrap();
        assert_eq!(material.side, FaceSide::Double);
        assert_eq!(material.alpha_test, 0.1);
        let texture = registry.texture(material.texture).unwrap();
        match &texture.source {
            TextureSource::Pixels(p) => assert_eq!((p.width(), p.height()), (16, 16)),
            other => panic!("unexpected texture source {:?}", other),
        }
        assert!(registry.geometry(geometry).is_some());

        assert_eq!(registry.live_count(), 3);
        item.dispose(&mut registry);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_sprite_uses_flipped_atlas_region() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();
        let region = AtlasRegion::from_size(0.5, 0.25, 0.25, 0.5);

        let item = ItemMeshFactory::default()
            .create(&atlas, &region, RenderStrategy::FaceCamera, &mut registry)
            .unwrap();
        let ItemNode::Sprite { material, .. } = item.node.clone() else {
            panic!("expected sprite node");
        };

        let material = registry.material(material).unwrap();
        assert_eq!(material.kind, MaterialKind::Sprite);
        let texture = registry.texture(material.texture).unwrap();
        assert_eq!(texture.source, TextureSource::Atlas);
        assert_eq!(texture.transform.offset, [0.5, 0.25]);
        assert_eq!(texture.transform.repeat, [0.25, 0.5]);
        assert!(texture.transform.flip_y);

        // Top-left of the sprite samples the region's top-left corner
        assert_eq!(texture.transform.apply([0.0, 1.0]), [0.5, 0.25]);
        assert_eq!(texture.transform.apply([1.0, 0.0]), [0.75, 0.75]);

        item.dispose(&mut registry);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_flat_strategy_builds_dual_plane() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();

        let item = ItemMeshFactory::default()
            .create(&atlas, &left_item(), RenderStrategy::Flat, &mut registry)
            .unwrap();
        let ItemNode::DualPlane {
            geometry,
            front_material,
            back_material,
        } = item.node.clone()
        else {
            panic!("expected dual plane node");
        };

        let geometry = registry.geometry(geometry).unwrap();
        assert_eq!(geometry.groups, vec![0..6, 6..12]);

        let front = registry.texture(registry.material(front_material).unwrap().texture).unwrap();
        let back = registry.texture(registry.material(back_material).unwrap().texture).unwrap();
        assert_eq!(front.transform.repeat, [0.5, 1.0]);
        assert_eq!(back.transform.repeat, [-0.5, 1.0]);
        assert_eq!(back.transform.offset, [0.5, 0.0]);

        assert_eq!(registry.live_count(), 5);
        item.dispose(&mut registry);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_disabled_extrusion_uses_dual_plane() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();
        let factory = ItemMeshFactory::new(FactoryConfig::default().with_extrusion_enabled(false));

        let item = factory
            .create(&atlas, &left_item(), RenderStrategy::Extruded, &mut registry)
            .unwrap();
        assert_eq!(item.kind(), RenderKind::DualPlane);
        assert!(item.fallback_reason.is_none());
        item.dispose(&mut registry);
    }

    struct BrokenSource;

    impl PixelSource for BrokenSource {
        fn dimensions(&self) -> (u32, u32) {
            (16, 16)
        }

        fn read_region(&self, _region: &AtlasRegion) -> Result<PixelBuffer> {
            Err(MesherError::Extraction("surface lost".to_string()))
        }
    }

    #[test]
    fn test_extraction_failure_falls_back() {
        let mut registry = ResourceRegistry::new();
        let item = ItemMeshFactory::default()
            .create(
                &BrokenSource,
                &AtlasRegion::full(),
                RenderStrategy::Extruded,
                &mut registry,
            )
            .unwrap();

        assert_eq!(item.kind(), RenderKind::DualPlane);
        assert!(item.fallback_reason.as_deref().unwrap().contains("surface lost"));
        item.dispose(&mut registry);
        assert_eq!(registry.live_count(), 0);
    }

    /// Registry that refuses to create geometry.
    #[derive(Default)]
    struct NoGeometry {
        inner: ResourceRegistry,
        refuse: bool,
    }

    impl ResourceAllocator for NoGeometry {
        fn create_texture(&mut self, desc: TextureDesc) -> Result<TextureId> {
            self.inner.create_texture(desc)
        }

        fn create_material(&mut self, desc: MaterialDesc) -> Result<MaterialId> {
            self.inner.create_material(desc)
        }

        fn create_geometry(&mut self, desc: GeometryDesc) -> Result<GeometryId> {
            if self.refuse {
                return Err(MesherError::Allocation("out of buffers".to_string()));
            }
            self.inner.create_geometry(desc)
        }

        fn release(&mut self, handle: ResourceHandle) {
            self.inner.release(handle)
        }
    }

    #[test]
    fn test_failed_allocation_releases_partial_resources() {
        let atlas = test_atlas();
        let mut alloc = NoGeometry {
            refuse: true,
            ..Default::default()
        };

        let result = ItemMeshFactory::default().create(
            &atlas,
            &left_item(),
            RenderStrategy::FaceCamera,
            &mut alloc,
        );
        assert!(result.is_err());
        assert_eq!(alloc.inner.live_count(), 0);
    }

    #[test]
    fn test_allocator_failure_on_both_paths() {
        let atlas = test_atlas();
        let mut alloc = NoGeometry {
            refuse: true,
            ..Default::default()
        };

        let err = ItemMeshFactory::default()
            .create(&atlas, &left_item(), RenderStrategy::Extruded, &mut alloc)
            .unwrap_err();
        assert!(matches!(err, MesherError::Allocation(_)));
        assert!(!err.is_invalid_input());
        assert_eq!(alloc.inner.live_count(), 0);
    }

    #[test]
    fn test_oversized_pixel_size_is_an_error() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();
        let factory = ItemMeshFactory::new(
            FactoryConfig::default().with_extrusion(ExtrusionConfig::default().with_pixel_size(1e38)),
        );

        let err = factory
            .create(&atlas, &left_item(), RenderStrategy::Extruded, &mut registry)
            .unwrap_err();
        assert!(matches!(err, MesherError::InvalidParameter(_)));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_invalid_region_is_an_error() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();
        let factory = ItemMeshFactory::default();

        for strategy in [
            RenderStrategy::FaceCamera,
            RenderStrategy::Extruded,
            RenderStrategy::Flat,
        ] {
            let err = factory
                .create(
                    &atlas,
                    &AtlasRegion::from_size(0.0, 0.0, 0.0, 0.5),
                    strategy,
                    &mut registry,
                )
                .unwrap_err();
            assert!(err.is_invalid_input());
        }
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_invalid_extrusion_config_is_an_error() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();
        let factory = ItemMeshFactory::new(
            FactoryConfig::default().with_extrusion(ExtrusionConfig::default().with_depth(-1.0)),
        );

        let err = factory
            .create(&atlas, &left_item(), RenderStrategy::Extruded, &mut registry)
            .unwrap_err();
        assert!(matches!(err, MesherError::InvalidParameter(_)));
    }

    #[test]
    fn test_transparent_region_extrudes_to_empty_mesh() {
        let atlas = test_atlas();
        let mut registry = ResourceRegistry::new();
        let right = AtlasRegion::from_size(0.5, 0.0, 0.5, 1.0);

        let item = ItemMeshFactory::default()
            .create(&atlas, &right, RenderStrategy::Extruded, &mut registry)
            .unwrap();
        let ItemNode::Extruded { geometry, stats, .. } = &item.node else {
            panic!("expected extruded node");
        };
        assert_eq!(stats.total_triangles(), 0);
        assert!(registry.geometry(*geometry).unwrap().mesh.is_empty());
        item.dispose(&mut registry);
    }

    #[test]
    fn test_strategy_from_json() {
        let strategy: RenderStrategy = serde_json::from_str("\"facecamera\"").unwrap();
        assert_eq!(strategy, RenderStrategy::FaceCamera);
        let config: FactoryConfig =
            serde_json::from_str(r#"{"enable_extrusion": false, "extrusion": {"depth": 0.2}}"#)
                .unwrap();
        assert!(!config.enable_extrusion);
        assert_eq!(config.extrusion.depth, 0.2);
        assert_eq!(config.alpha_test, 0.1);
    }
}
