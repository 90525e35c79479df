mod config;
mod ticker;

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use scene::{ApplicationState, Mesh, MeshLibrary, SharedState};

use crate::config::Config;
use crate::ticker::{Broadcast, Ticker};

#[derive(Parser, Debug)]
#[command(version, about = "Water demo state engine", long_about = None)]
struct Args {
    /// RON config file. Built-in defaults are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Clock interval in milliseconds, overrides the config file.
    #[arg(short, long)]
    tick_ms: Option<u64>,

    /// Stop after this many ticks.
    #[arg(short, long)]
    frames: Option<u64>,

    /// Log filter (error, warn, info, debug, trace). RUST_LOG takes precedence.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn build_meshes(config: &Config) -> Result<MeshLibrary, scene::SceneError> {
    let meshes = &config.meshes;
    let mut library = MeshLibrary::new();
    library.insert(Mesh::water_plane(meshes.water.size, meshes.water.segments)?);
    library.insert(Mesh::terrain(meshes.terrain.size, meshes.terrain.segments, meshes.terrain_height)?);

    for name in library.names() {
        let mesh = library.get(name)?;
        log::info!(
            "mesh '{}': {} vertices, {} triangles, {} index bytes",
            name,
            mesh.vertex_count,
            mesh.triangle_count,
            mesh.index_bytes().len()
        );
    }
    Ok(library)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level)).init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(tick_ms) = args.tick_ms {
        config.clock.tick_ms = tick_ms;
    }
    if args.frames.is_some() {
        config.clock.frames = args.frames;
    }
    config.validate()?;

    match &args.config {
        Some(path) => log::info!("using config {}", path.display()),
        None => log::info!("using built-in config"),
    }
    log::debug!("{:#?}", config);

    let _meshes = build_meshes(&config)?;

    let state = SharedState::new(ApplicationState::new(config.camera.build(), config.water));
    if !config.script.is_empty() {
        log::info!("applying {} scripted messages", config.script.len());
        state.update_all(&config.script);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })?;

    let mut broadcast = Broadcast::new();
    let logger = if config.clock.log_every > 0 {
        let rx = broadcast.subscribe("log", config.clock.subscriber_capacity);
        Some(ticker::spawn_logger(rx, config.clock.log_every)?)
    } else {
        None
    };

    log::info!(
        "clock running every {} ms ({})",
        config.clock.tick_ms,
        match config.clock.frames {
            Some(frames) => format!("{frames} frames"),
            None => "until interrupted".to_string(),
        }
    );

    let ticker = Ticker::spawn(
        state.clone(),
        broadcast,
        Duration::from_millis(config.clock.tick_ms),
        config.clock.frames,
        running,
    )?;

    let ticks = ticker.join().map_err(|_| "ticker thread panicked")?;
    if let Some(logger) = logger {
        logger.join().map_err(|_| "logger thread panicked")?;
    }

    let snapshot = state.snapshot();
    log::info!(
        "stopped after {} ticks, clock {:.0} ms, camera at {:.2}",
        ticks,
        snapshot.clock,
        snapshot.camera_position
    );

    Ok(())
}
