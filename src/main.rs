//! Chunk renderer demo
//!
//! Builds a small scene, flies a camera over it and renders every frame into
//! a recording device, logging the per-frame statistics.

use clap::Parser;
use glam::{IVec3, Vec3};

use minerust_chunks::{
    BlockType, Camera, CHUNK_SIZE, MapRenderer, RecordingDevice, World, load_or_default,
    save_settings,
};

/// Headless chunk renderer demo
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World width in chunks
    #[arg(long, default_value_t = 4)]
    chunks_x: i32,

    /// World height in chunks
    #[arg(long, default_value_t = 2)]
    chunks_y: i32,

    /// World length in chunks
    #[arg(long, default_value_t = 4)]
    chunks_z: i32,

    /// Number of frames to render
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Override the view distance in blocks
    #[arg(long)]
    view_distance: Option<i32>,

    /// Mesh with smooth lighting
    #[arg(long, default_value_t = false)]
    smooth_lighting: bool,

    /// Settings file to read, and to write back when --save is given
    #[arg(long, default_value = minerust_chunks::utils::settings::DEFAULT_SETTINGS_FILE)]
    settings: String,

    /// Save the effective settings on exit
    #[arg(long, default_value_t = false)]
    save: bool,
}

fn build_scene(world: &mut World) {
    let width = world.width();
    let length = world.length();

    world.fill(IVec3::ZERO, IVec3::new(width - 1, 0, length - 1), BlockType::Bedrock);
    world.fill(IVec3::new(0, 1, 0), IVec3::new(width - 1, 3, length - 1), BlockType::Stone);
    world.fill(IVec3::new(0, 4, 0), IVec3::new(width - 1, 4, length - 1), BlockType::Grass);

    // pool
    world.fill(IVec3::new(10, 4, 10), IVec3::new(21, 4, 21), BlockType::Water);

    // glass hut
    world.fill(IVec3::new(30, 5, 6), IVec3::new(36, 9, 12), BlockType::Glass);
    world.fill(IVec3::new(31, 5, 7), IVec3::new(35, 8, 11), BlockType::Air);

    // tree
    world.fill(IVec3::new(44, 5, 40), IVec3::new(44, 9, 40), BlockType::Wood);
    world.fill(IVec3::new(42, 9, 38), IVec3::new(46, 11, 42), BlockType::Leaves);
    world.set_block(44, 9, 40, BlockType::Wood);

    for i in 0..24 {
        let x = 3 + (i * 7) % (width - 6).max(1);
        let z = 30 + (i * 11) % (length - 31).max(1);
        let block = if i % 3 == 0 { BlockType::Flower } else { BlockType::DeadBush };
        world.set_block_with_metadata(x, 5, z, block, i as u8);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut settings = load_or_default(&args.settings);
    if let Some(dist) = args.view_distance {
        settings.view_distance = dist;
        settings.user_view_distance = dist;
    }
    settings.smooth_lighting |= args.smooth_lighting;
    let settings = settings.sanitized();
    tracing::info!("Render settings: {:?}", settings);

    let mut world = World::new(args.chunks_x, args.chunks_y, args.chunks_z);
    build_scene(&mut world);

    let mut device = RecordingDevice::new();
    let mut renderer = MapRenderer::new(&settings);
    renderer.on_new_map(&mut device);
    renderer.on_new_map_loaded(&world, &mut device);

    let centre = Vec3::new(world.width() as f32, 0.0, world.length() as f32) * 0.5;
    let radius = centre.x.max(centre.z) + CHUNK_SIZE as f32;
    let mut camera = Camera::new(centre + Vec3::new(radius, 20.0, 0.0), 16.0 / 9.0);
    let delta = 1.0 / 60.0;

    for frame in 0..args.frames {
        let angle = frame as f32 / args.frames.max(1) as f32 * std::f32::consts::TAU;
        camera.position = centre + Vec3::new(angle.cos() * radius, 20.0, angle.sin() * radius);
        camera.look_at(centre);

        // knock out a block halfway through to exercise partial rebuilds
        if frame == args.frames / 2 {
            let (x, y, z) = (centre.x as i32, 4, centre.z as i32);
            world.set_block(x, y, z, BlockType::Air);
            renderer.redraw_block(x, y, z, BlockType::Air);
        }

        device.clear_calls();
        renderer.update(&world, &mut device, &camera.state(), delta);
        renderer.render_opaque(&mut device, delta);
        renderer.render_translucent(&mut device, delta);

        let stats = renderer.render_stats();
        tracing::info!(
            frame,
            chunks = stats.render_chunks,
            updates = stats.chunk_updates,
            budget = stats.build_budget,
            draws = device.draws().count(),
            indices = device.drawn_indices(),
            "Frame rendered"
        );
    }

    let stats = renderer.render_stats();
    tracing::info!(
        "Done: {} builds, {} live buffers",
        stats.total_builds,
        device.live_buffers()
    );

    if args.save {
        if let Err(e) = save_settings(&args.settings, &settings) {
            tracing::error!("Failed to save settings: {}", e);
        }
    }
}
