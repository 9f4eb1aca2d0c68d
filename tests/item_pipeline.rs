//! End-to-end tests: pack textures, load the atlas back, build renderables
//! and export them.

use item_mesher::factory::{ItemNode, RenderKind, TextureSource};
use item_mesher::{
    build_extruded_mesh, export_glb, load_atlas, AtlasBuilder, ExtrusionConfig, ItemMeshFactory,
    Mesh, ObjExport, PixelBuffer, PixelSource, RenderStrategy, ResourceRegistry,
};
use std::collections::HashMap;

fn solid(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::filled(width, height, [120, 80, 40, 255]).unwrap()
}

/// 16x16 sword-like shape: a diagonal band two pixels wide, plus a hilt.
/// Pixels touch only along edges, never only at a corner.
fn blade() -> PixelBuffer {
    let mut pixels = vec![0u8; 16 * 16 * 4];
    let mut set = |x: usize, y: usize| {
        let idx = (y * 16 + x) * 4;
        pixels[idx..idx + 4].copy_from_slice(&[200, 200, 220, 255]);
    };
    for i in 2..14 {
        set(i, 15 - i);
        set(i + 1, 15 - i);
    }
    for x in 1..6 {
        set(x, 11);
    }
    PixelBuffer::new(16, 16, pixels).unwrap()
}

/// Every directed edge must be matched by exactly one reversed edge.
fn assert_closed_and_consistent(mesh: &Mesh) {
    let key = |i: u32| {
        let p = mesh.vertices[i as usize].position;
        [
            (p[0] * 10_000.0).round() as i64,
            (p[1] * 10_000.0).round() as i64,
            (p[2] * 10_000.0).round() as i64,
        ]
    };

    let mut edges: HashMap<([i64; 3], [i64; 3]), usize> = HashMap::new();
    for tri in mesh.indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            *edges.entry((key(a), key(b))).or_insert(0) += 1;
        }
    }

    for ((a, b), count) in &edges {
        assert_eq!(*count, 1, "directed edge {:?} -> {:?} used {} times", a, b, count);
        assert_eq!(
            edges.get(&(*b, *a)),
            Some(&1),
            "edge {:?} -> {:?} has no opposite",
            a,
            b
        );
    }
}

#[test]
fn test_full_tile_counts() {
    let extruded = build_extruded_mesh(&solid(16, 16), &ExtrusionConfig::default()).unwrap();

    assert_eq!(extruded.stats.grid_vertices, 2 * 17 * 17);
    assert_eq!(extruded.stats.wall_vertices, 4 * 64);
    assert_eq!(extruded.total_vertices(), 834);
    assert_eq!(extruded.stats.front_triangles, 512);
    assert_eq!(extruded.stats.back_triangles, 512);
    assert_eq!(extruded.stats.wall_triangles, 128);
    assert_eq!(extruded.total_triangles(), 1152);
    assert!(extruded.mesh.indices_in_bounds());
}

#[test]
fn test_full_tile_bounds() {
    let extruded = build_extruded_mesh(&solid(16, 16), &ExtrusionConfig::default()).unwrap();
    let (min, max) = extruded.mesh.bounds();

    for (got, want) in min.iter().zip([-0.5, -0.5, -1.0 / 32.0]) {
        assert!((got - want).abs() < 1e-6, "min {:?}", min);
    }
    for (got, want) in max.iter().zip([0.5, 0.5, 1.0 / 32.0]) {
        assert!((got - want).abs() < 1e-6, "max {:?}", max);
    }
}

#[test]
fn test_solids_are_closed() {
    for texture in [solid(16, 16), solid(3, 7), blade()] {
        let extruded = build_extruded_mesh(&texture, &ExtrusionConfig::default()).unwrap();
        assert!(!extruded.is_empty());
        assert_closed_and_consistent(&extruded.mesh);
    }
}

#[test]
fn test_build_is_deterministic() {
    let config = ExtrusionConfig::default().with_depth(0.2);
    let a = build_extruded_mesh(&blade(), &config).unwrap();
    let b = build_extruded_mesh(&blade(), &config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_pack_load_and_render() {
    let mut builder = AtlasBuilder::new(256, 1);
    builder.add_texture("blade".to_string(), blade());
    builder.add_texture("ingot".to_string(), solid(8, 4));
    let atlas = builder.build().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let png_path = dir.path().join("items.png");
    let json_path = dir.path().join("items.json");
    std::fs::write(&png_path, atlas.image.to_png().unwrap()).unwrap();
    std::fs::write(&json_path, atlas.regions_json().unwrap()).unwrap();

    let loaded = load_atlas(png_path.as_path(), Some(json_path.as_path())).unwrap();
    assert_eq!(loaded.regions.len(), 2);

    let region = *loaded.get_region("blade").unwrap();
    assert_eq!(loaded.read_region(&region).unwrap(), blade());

    let mut registry = ResourceRegistry::new();
    let factory = ItemMeshFactory::default();
    for (strategy, kind) in [
        (RenderStrategy::FaceCamera, RenderKind::Sprite),
        (RenderStrategy::Extruded, RenderKind::Extruded),
        (RenderStrategy::Flat, RenderKind::DualPlane),
    ] {
        let item = factory.create(&loaded, &region, strategy, &mut registry).unwrap();
        assert_eq!(item.kind(), kind);
        assert!(registry.live_count() > 0);
        item.dispose(&mut registry);
        assert_eq!(registry.live_count(), 0);
    }
}

#[test]
fn test_extruded_renderable_matches_direct_build() {
    let mut builder = AtlasBuilder::new(64, 0);
    builder.add_texture("blade".to_string(), blade());
    let atlas = builder.build().unwrap();
    let region = *atlas.get_region("blade").unwrap();

    let mut registry = ResourceRegistry::new();
    let item = ItemMeshFactory::default()
        .create(&atlas, &region, RenderStrategy::Extruded, &mut registry)
        .unwrap();
    let ItemNode::Extruded {
        geometry, material, ..
    } = item.node.clone()
    else {
        panic!("expected extruded node");
    };

    let direct = build_extruded_mesh(&blade(), &ExtrusionConfig::default()).unwrap();
    assert_eq!(registry.geometry(geometry).unwrap().mesh, direct.mesh);

    let texture = registry.material(material).unwrap().texture;
    assert_eq!(
        registry.texture(texture).unwrap().source,
        TextureSource::Pixels(blade())
    );
    item.dispose(&mut registry);
}

#[test]
fn test_export_files() {
    let texture = blade();
    let extruded = build_extruded_mesh(&texture, &ExtrusionConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let glb = export_glb(&extruded.mesh, &texture).unwrap();
    let glb_path = dir.path().join("blade.glb");
    std::fs::write(&glb_path, &glb).unwrap();
    let written = std::fs::read(&glb_path).unwrap();
    assert_eq!(&written[0..4], b"glTF");
    assert_eq!(
        u32::from_le_bytes([written[8], written[9], written[10], written[11]]) as usize,
        written.len()
    );

    let obj = ObjExport::new(&extruded.mesh, &texture, "blade").unwrap();
    obj.write_to_dir(dir.path()).unwrap();
    let obj_text = std::fs::read_to_string(dir.path().join("blade.obj")).unwrap();
    assert_eq!(
        obj_text.lines().filter(|l| l.starts_with("f ")).count(),
        extruded.total_triangles()
    );
    let png = PixelBuffer::load(dir.path().join("blade.png")).unwrap();
    assert_eq!(png, texture);
}
