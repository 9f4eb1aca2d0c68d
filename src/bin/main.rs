//! Item Mesher CLI
//!
//! Generate 3D item meshes from pixel-art textures.

use clap::{Parser, Subcommand, ValueEnum};
use item_mesher::{
    build_extruded_mesh, export_glb, load_atlas, AtlasBuilder, AtlasRegion, ExtrusionConfig,
    FactoryConfig, ItemMeshFactory, ItemNode, ObjExport, PixelBuffer, PixelSource,
    RenderStrategy, ResourceRegistry, Silhouette, TextureAtlas,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "item-mesher")]
#[command(author, version, about = "Generate 3D meshes from pixel-art item textures", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which part of the atlas to use.
#[derive(clap::Args)]
struct RegionArgs {
    /// Atlas (or single texture) PNG
    #[arg(short, long)]
    atlas: PathBuf,

    /// Normalized region as "u,v,width,height" from the top-left
    #[arg(short, long, value_parser = parse_region, conflicts_with = "item")]
    region: Option<AtlasRegion>,

    /// Item name looked up in the regions JSON
    #[arg(short, long, requires = "regions")]
    item: Option<String>,

    /// JSON region table written by `pack`
    #[arg(long)]
    regions: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extrude an item texture into a solid mesh
    Extrude {
        #[command(flatten)]
        source: RegionArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "glb")]
        format: OutputFormat,

        /// Extrusion config JSON; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Thickness in world units
        #[arg(long)]
        depth: Option<f32>,

        /// World units per pixel
        #[arg(long)]
        pixel_size: Option<f32>,

        /// Alpha above which a pixel is solid
        #[arg(long)]
        alpha_threshold: Option<u8>,

        /// Recompute smooth normals
        #[arg(long)]
        smooth_normals: bool,
    },

    /// Run the item factory and report what it built
    Render {
        #[command(flatten)]
        source: RegionArgs,

        /// Render strategy
        #[arg(short, long, value_enum, default_value = "extruded")]
        strategy: StrategyArg,

        /// Factory config JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show information about a texture
    Info {
        /// Texture PNG
        #[arg(short, long)]
        atlas: PathBuf,

        /// Alpha above which a pixel is solid
        #[arg(long, default_value = "128")]
        alpha_threshold: u8,
    },

    /// Pack item PNGs into an atlas plus a regions JSON
    Pack {
        /// Item textures; each is named after its file stem
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output atlas PNG; the regions JSON is written next to it
        #[arg(short, long)]
        output: PathBuf,

        /// Maximum atlas size
        #[arg(long, default_value = "4096")]
        max_size: u32,

        /// Transparent padding around each texture
        #[arg(long, default_value = "1")]
        padding: u32,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Binary glTF format
    Glb,
    /// Wavefront OBJ format
    Obj,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Sprite,
    Extruded,
    Flat,
}

impl From<StrategyArg> for RenderStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sprite => RenderStrategy::FaceCamera,
            StrategyArg::Extruded => RenderStrategy::Extruded,
            StrategyArg::Flat => RenderStrategy::Flat,
        }
    }
}

fn parse_region(s: &str) -> Result<AtlasRegion, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("Invalid region '{}': {}", s, e))?;
    match parts[..] {
        [u, v, w, h] => Ok(AtlasRegion::from_size(u, v, w, h)),
        _ => Err(format!("Invalid region format: '{}'. Use u,v,width,height", s)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Extrude {
            source,
            output,
            format,
            config,
            depth,
            pixel_size,
            alpha_threshold,
            smooth_normals,
        } => {
            let mut extrusion: ExtrusionConfig = match config {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => ExtrusionConfig::default(),
            };
            if let Some(depth) = depth {
                extrusion = extrusion.with_depth(depth);
            }
            if let Some(pixel_size) = pixel_size {
                extrusion = extrusion.with_pixel_size(pixel_size);
            }
            if let Some(threshold) = alpha_threshold {
                extrusion = extrusion.with_alpha_threshold(threshold);
            }
            if smooth_normals {
                extrusion = extrusion.with_smooth_normals(true);
            }
            extrude_item(&source, &output, format, &extrusion)?;
        }
        Commands::Render {
            source,
            strategy,
            config,
        } => {
            let config: FactoryConfig = match config {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => FactoryConfig::default(),
            };
            render_item(&source, strategy.into(), config)?;
        }
        Commands::Info {
            atlas,
            alpha_threshold,
        } => {
            show_texture_info(&atlas, alpha_threshold)?;
        }
        Commands::Pack {
            inputs,
            output,
            max_size,
            padding,
        } => {
            pack_atlas(&inputs, &output, max_size, padding)?;
        }
    }

    Ok(())
}

/// Load the atlas and resolve the requested region (the whole image by default).
fn load_source(args: &RegionArgs) -> Result<(TextureAtlas, AtlasRegion), Box<dyn std::error::Error>> {
    println!("Loading atlas from {:?}...", args.atlas);
    let atlas = load_atlas(args.atlas.as_path(), args.regions.as_deref())?;
    println!(
        "  {}x{} with {} named regions",
        atlas.width(),
        atlas.height(),
        atlas.regions.len()
    );

    let region = match (&args.region, &args.item) {
        (Some(region), _) => *region,
        (None, Some(item)) => *atlas
            .get_region(item)
            .ok_or_else(|| format!("Item '{}' not found in regions table", item))?,
        (None, None) => AtlasRegion::full(),
    };
    Ok((atlas, region))
}

fn extrude_item(
    source: &RegionArgs,
    output_path: &Path,
    format: OutputFormat,
    config: &ExtrusionConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (atlas, region) = load_source(source)?;
    let texture = atlas.read_region(&region)?;
    println!("Extruding {}x{} texture...", texture.width(), texture.height());

    let extruded = build_extruded_mesh(&texture, config)?;
    println!(
        "  Generated {} vertices ({} grid, {} wall), {} triangles",
        extruded.total_vertices(),
        extruded.stats.grid_vertices,
        extruded.stats.wall_vertices,
        extruded.total_triangles()
    );

    match format {
        OutputFormat::Glb => {
            let glb_path = if output_path.extension().is_some() {
                output_path.to_path_buf()
            } else {
                output_path.with_extension("glb")
            };
            let glb_data = export_glb(&extruded.mesh, &texture)?;
            fs::write(&glb_path, &glb_data)?;
            println!("Exported GLB ({} bytes) to {:?}", glb_data.len(), glb_path);
        }
        OutputFormat::Obj => {
            let name = output_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("item");
            let obj_export = ObjExport::new(&extruded.mesh, &texture, name)?;
            let dir = match output_path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            obj_export.write_to_dir(dir)?;
            println!("Exported OBJ to {:?}", dir.join(format!("{}.obj", name)));
        }
    }

    Ok(())
}

fn render_item(
    source: &RegionArgs,
    strategy: RenderStrategy,
    config: FactoryConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (atlas, region) = load_source(source)?;

    let mut registry = ResourceRegistry::new();
    let item = ItemMeshFactory::new(config).create(&atlas, &region, strategy, &mut registry)?;

    println!("Built {:?} renderable", item.kind());
    if let Some(reason) = &item.fallback_reason {
        println!("  Fell back to flat plane: {}", reason);
    }
    match &item.node {
        ItemNode::Sprite { geometry, .. } | ItemNode::DualPlane { geometry, .. } => {
            if let Some(desc) = registry.geometry(*geometry) {
                println!(
                    "  {} vertices, {} triangles",
                    desc.mesh.vertex_count(),
                    desc.mesh.triangle_count()
                );
            }
        }
        ItemNode::Extruded { stats, .. } => {
            println!(
                "  {} vertices, {} triangles ({} wall)",
                stats.total_vertices(),
                stats.total_triangles(),
                stats.wall_triangles
            );
        }
    }
    println!("  {} resources allocated", item.resources().len());

    item.dispose(&mut registry);
    if registry.live_count() != 0 {
        return Err(format!("{} resources still live after dispose", registry.live_count()).into());
    }
    println!("  All resources released");

    Ok(())
}

fn show_texture_info(path: &Path, alpha_threshold: u8) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading texture from {:?}...", path);
    let texture = PixelBuffer::load(path)?;
    let silhouette = Silhouette::new(&texture, alpha_threshold);

    println!("\nTexture Info:");
    println!("  Size: {}x{}", texture.width(), texture.height());
    println!(
        "  Opaque pixels: {} of {}",
        silhouette.opaque_count(),
        texture.width() as u64 * texture.height() as u64
    );
    println!("  Has transparency: {}", texture.has_transparency());

    Ok(())
}

fn pack_atlas(
    inputs: &[PathBuf],
    output_path: &Path,
    max_size: u32,
    padding: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = AtlasBuilder::new(max_size, padding);
    for input in inputs {
        let name = input
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| format!("Cannot derive item name from {:?}", input))?;
        builder.add_texture(name.to_string(), PixelBuffer::load(input)?);
    }
    println!("Packing {} textures...", builder.len());

    let atlas = builder.build()?;
    let png_path = output_path.with_extension("png");
    let json_path = output_path.with_extension("json");
    fs::write(&png_path, atlas.image.to_png()?)?;
    fs::write(&json_path, atlas.regions_json()?)?;

    println!(
        "Exported {}x{} atlas to {:?}",
        atlas.width(),
        atlas.height(),
        png_path
    );
    println!("  Regions: {:?}", json_path);

    Ok(())
}
