//! preylockd - motion monitor daemon
//!
//! This daemon:
//! 1. Loads the persisted configuration (zone, sensitivity, camera)
//! 2. Starts the background frame acquisition thread
//! 3. Runs the detection loop against the configured zone
//! 4. Captures a frame to disk on each motion onset

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use preylock::{
    Camera, DetectionZone, DiskCollector, Monitor, MonitorConfig, MotionDetector, PreylockConfig,
    Sensitivity, SharedZone,
};

/// Reference canvas used when no display surface is attached. The zone's
/// fractional coordinates are surface-independent and the cropper projects
/// them onto each frame's native dimensions, so any non-degenerate canvas
/// works for clamping.
const HEADLESS_CANVAS: (u32, u32) = (1280, 720);

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file path.
    #[arg(long, env = "PREYLOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Camera URI override (stub://, rtsp://, http(s)://).
    #[arg(long)]
    camera_url: Option<String>,

    /// Capture directory override.
    #[arg(long)]
    capture_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => PreylockConfig::load_from(path)?,
        None => PreylockConfig::load()?,
    };
    if let Some(url) = args.camera_url {
        cfg.camera.url = url;
    }
    if let Some(dir) = args.capture_dir {
        cfg.capture.dir = dir;
    }

    let running = Arc::new(AtomicBool::new(true));
    let ctrlc_running = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("shutdown requested");
        ctrlc_running.store(false, Ordering::Relaxed);
    })
    .context("install ctrl-c handler")?;

    log::info!(
        "preylockd starting: camera={} fps={} sensitivity={}",
        cfg.camera.url,
        cfg.camera.target_fps,
        cfg.zone.sensitivity
    );
    log::info!(
        "zone topleft=({}, {}) size={}x{} (fractions), captures to {}",
        cfg.zone.topleft.0,
        cfg.zone.topleft.1,
        cfg.zone.width,
        cfg.zone.height,
        cfg.capture.dir.display()
    );

    let camera = Camera::start(&cfg.camera.url, cfg.camera.target_fps)?;
    let zone = SharedZone::new(DetectionZone::new(
        cfg.zone_fractions(),
        HEADLESS_CANVAS.0,
        HEADLESS_CANVAS.1,
    )?);
    let detector = MotionDetector::new(Sensitivity::new(cfg.zone.sensitivity)?);
    let monitor_config = MonitorConfig {
        background_reset_frames: cfg.detection.background_reset_frames,
        ..MonitorConfig::default()
    };

    let mut collector = DiskCollector::new(cfg.capture.dir.clone(), cfg.capture.min_interval)?;
    let mut monitor = Monitor::new(camera, zone, detector, monitor_config);

    monitor.run(&mut collector, &running)?;

    log::info!("preylockd stopped ({} captures)", collector.captures());
    Ok(())
}
