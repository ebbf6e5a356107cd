mod scene;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use scene::{DemoAction, KeyScript, PhysicsSystem, SceneConfig};
use std::path::{Path, PathBuf};
use tessel_assets::AssetRoot;
use tessel_common::{Camera2D, Color, Transform2D};
use tessel_ecs::World;
use tessel_render::recording::{KnownTextures, RecordingBackend};
use tessel_render::text::{GlyphAtlas, MonospaceShaper};
use tessel_render::{
    AnimationSystem, BatchRenderer, RendererConfig, SpriteRenderSystem, Text, TextRenderSystem,
    TextureCache, VertexLayout,
};
use tessel_render_wgpu::{GpuContext, OffscreenTarget, WgpuBackend, WgpuTextureLoader, upload_image};
use tracing_subscriber::EnvFilter;

const FONT_ATLAS_KEY: &str = "font:mono";

#[derive(Parser)]
#[command(name = "tessel", about = "Tessel 2D engine tools")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Simulate the bouncing-sprite scene and report batching statistics per frame
    Batch {
        /// Number of sprites to spawn
        #[arg(short, long, default_value = "500")]
        sprites: usize,
        /// Number of frames to simulate
        #[arg(short, long, default_value = "5")]
        frames: usize,
        /// RNG seed for the scene layout
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Number of distinct texture keys
        #[arg(short, long, default_value = "4")]
        textures: usize,
        /// Override the renderer's quads per draw call
        #[arg(long)]
        max_quads: Option<usize>,
        /// Renderer config JSON file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Scripted key taps, e.g. "2:space,4:escape"
        #[arg(long, default_value = "")]
        keys: String,
        /// Simulation step in seconds
        #[arg(long, default_value = "0.016")]
        dt: f32,
    },
    /// Render one frame of the scene on the GPU and write it as a PNG
    Render {
        #[arg(short, long, default_value = "frame.png")]
        output: PathBuf,
        #[arg(long, default_value = "640")]
        width: u32,
        #[arg(long, default_value = "480")]
        height: u32,
        #[arg(short, long, default_value = "200")]
        sprites: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Directory texture keys are resolved against
        #[arg(long, default_value = ".")]
        assets: PathBuf,
        #[arg(long)]
        max_quads: Option<usize>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tessel v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tessel_common::crate_info());
            println!("ecs: {}", tessel_ecs::crate_info());
            println!("assets: {}", tessel_assets::crate_info());
            println!("input: {}", tessel_input::crate_info());
            println!("render: {}", tessel_render::crate_info());
            println!("render-wgpu: {}", tessel_render_wgpu::crate_info());
        }
        Commands::Batch {
            sprites,
            frames,
            seed,
            textures,
            max_quads,
            config,
            keys,
            dt,
        } => {
            let config = renderer_config(config, max_quads)?;
            let script = KeyScript::parse(&keys)?;
            run_batch_demo(&config, sprites, frames, seed, textures, &script, dt)?;
        }
        Commands::Render {
            output,
            width,
            height,
            sprites,
            seed,
            assets,
            max_quads,
            config,
        } => {
            let config = renderer_config(config, max_quads)?.with_layout(VertexLayout::Tinted);
            render_frame(&config, &output, width, height, sprites, seed, assets)?;
        }
    }

    Ok(())
}

fn renderer_config(
    path: Option<PathBuf>,
    max_quads: Option<usize>,
) -> anyhow::Result<RendererConfig> {
    let mut config = match path {
        Some(path) => RendererConfig::load(&path)
            .with_context(|| format!("loading renderer config {}", path.display()))?,
        None => RendererConfig::default(),
    };
    if let Some(max_quads) = max_quads {
        config = config.with_max_quads(max_quads);
    }
    config.validate()?;
    Ok(config)
}

fn run_batch_demo(
    config: &RendererConfig,
    sprites: usize,
    frames: usize,
    seed: u64,
    textures: usize,
    script: &KeyScript,
    dt: f32,
) -> anyhow::Result<()> {
    let bounds = Vec2::new(800.0, 600.0);
    let keys: Vec<String> = (0..textures.max(1)).map(|i| format!("sprite{i}")).collect();

    let mut world = World::new();
    scene::spawn_sprites(
        &mut world,
        &SceneConfig {
            sprites,
            bounds,
            seed,
            textures: keys.clone(),
            animate_every: 10,
        },
    )?;

    let mut batched = BatchRenderer::new(
        config,
        RecordingBackend::new(),
        KnownTextures::new(keys.iter().cloned()),
    )?;
    let mut individual = BatchRenderer::new(
        &config.clone().with_max_quads(1),
        RecordingBackend::new(),
        KnownTextures::new(keys.iter().cloned()),
    )?;

    let mut keyboard = scene::demo_keyboard();
    let physics = PhysicsSystem { bounds };
    let mut batching = true;
    let mut totals = [0usize; 2];

    println!(
        "Batch demo: sprites={sprites}, textures={}, max_quads={}",
        keys.len(),
        config.max_quads_per_batch
    );

    'frames: for frame in 0..frames {
        for key in script.taps_at(frame) {
            let action = keyboard.press(key);
            keyboard.release(key);
            match action {
                Some(DemoAction::ToggleBatching) => {
                    batching = !batching;
                    tracing::info!(frame, batching, "rendering mode toggled");
                }
                Some(DemoAction::Quit) => {
                    println!("frame {frame}: quit");
                    break 'frames;
                }
                None => {}
            }
        }

        physics.update(&mut world, dt);
        AnimationSystem.update(&mut world, dt);

        let renderer = if batching {
            &mut batched
        } else {
            &mut individual
        };
        renderer.backend_mut().clear();
        renderer.begin_frame();
        SpriteRenderSystem.run(&world, renderer);
        let report = renderer.end_frame();
        totals[usize::from(!batching)] += report.draw_calls;

        println!(
            "frame {frame}: mode={} groups={} draw_calls={} quads={} skipped={}",
            if batching { "batched" } else { "individual" },
            report.groups,
            report.draw_calls,
            report.quads,
            report.skipped_quads()
        );
    }

    println!(
        "Totals: batched draw_calls={}, individual draw_calls={}",
        totals[0], totals[1]
    );
    Ok(())
}

fn render_frame(
    config: &RendererConfig,
    output: &Path,
    width: u32,
    height: u32,
    sprites: usize,
    seed: u64,
    assets: PathBuf,
) -> anyhow::Result<()> {
    let ctx = GpuContext::headless().context("opening a headless GPU device")?;
    println!("Adapter: {}", ctx.adapter_name());

    let mut world = World::new();
    scene::spawn_sprites(
        &mut world,
        &SceneConfig {
            sprites,
            bounds: Vec2::new(width as f32, height as f32),
            seed,
            textures: vec!["builtin:checker".into(), "builtin:white".into()],
            animate_every: 0,
        },
    )?;
    let label = world.create_entity();
    // Glyph layout is y-up; flip it into the camera's y-down pixel space.
    world.add_component(
        label,
        Transform2D::new(Vec2::new(16.0, 40.0), 0.0, Vec2::new(1.0, -1.0)),
    )?;
    world.add_component(
        label,
        Text::new(format!("tessel {sprites} sprites"))
            .with_size(24)
            .with_color(Color::rgb(255, 220, 64)),
    )?;

    let target = OffscreenTarget::new(&ctx, width, height);
    let backend = WgpuBackend::new(&ctx, config, target);
    let loader = WgpuTextureLoader::new(ctx.clone(), AssetRoot::new(assets));
    let mut renderer = BatchRenderer::new(config, backend, TextureCache::new(loader))?;

    let mut text = TextRenderSystem::new(
        MonospaceShaper::default(),
        GlyphAtlas::new(FONT_ATLAS_KEY, 32, GlyphAtlas::DEFAULT_SIZE),
    );

    let camera = Camera2D::new(width, height);
    renderer
        .backend_mut()
        .begin_frame(camera.view_projection(), Color::rgb(24, 24, 32));
    renderer.begin_frame();
    let sprite_quads = SpriteRenderSystem.run(&world, &mut renderer);
    let glyph_quads = text.run(&world, &mut renderer);

    // Glyphs are placed during the text pass, so the atlas is uploaded after it.
    let atlas_image = scene::rasterize_block_atlas(text.atlas());
    let atlas_texture = upload_image(&ctx, FONT_ATLAS_KEY, &atlas_image);
    renderer.textures_mut().insert(FONT_ATLAS_KEY, atlas_texture);

    let report = renderer.end_frame();
    let submissions = renderer.backend_mut().finish_frame();

    let image = renderer.backend().read_pixels()?;
    image
        .save_png(output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Rendered {sprite_quads} sprites and {glyph_quads} glyphs: groups={} draw_calls={} submissions={submissions} skipped={}",
        report.groups,
        report.draw_calls,
        report.skipped_quads()
    );
    for skipped in &report.skipped {
        println!("  skipped {} ({} quads): {}", skipped.key, skipped.quads, skipped.error);
    }
    println!("Wrote {}x{} frame to {}", image.width, image.height, output.display());
    Ok(())
}
