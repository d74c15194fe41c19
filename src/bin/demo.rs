//! demo - bounded synthetic end-to-end run of the motion pipeline

use anyhow::{anyhow, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use preylock::{
    Camera, DetectionZone, Frame, Monitor, MonitorConfig, MonitorObserver, MotionDetector,
    Sensitivity, SharedZone, ZoneFractions,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Duration of the synthetic run in seconds.
    #[arg(long, default_value_t = 5)]
    seconds: u64,

    /// Changed-pixel sensitivity in (0, 1).
    #[arg(long, default_value_t = 0.05)]
    sensitivity: f64,
}

#[derive(Default)]
struct Tally {
    frames: u64,
    motion_events: u64,
}

impl MonitorObserver for Tally {
    fn frame_processed(&mut self, _frame: &Frame, _motion: bool) {
        self.frames += 1;
    }

    fn motion_started(&mut self, frame: &Frame) {
        self.motion_events += 1;
        log::info!(
            "motion event #{} ({}x{} frame)",
            self.motion_events,
            frame.width(),
            frame.height()
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.seconds == 0 {
        return Err(anyhow!("seconds must be >= 1"));
    }

    stage("start synthetic camera");
    let camera = Camera::start("stub://demo", 30)?;
    let zone = SharedZone::new(DetectionZone::new(
        ZoneFractions {
            left: 0.2,
            top: 0.2,
            width: 0.6,
            height: 0.6,
        },
        640,
        480,
    )?);
    let detector = MotionDetector::new(Sensitivity::new(args.sensitivity)?);
    let mut monitor = Monitor::new(camera, zone, detector, MonitorConfig::default());

    stage("run detection loop");
    let running = Arc::new(AtomicBool::new(true));
    let timer_flag = Arc::clone(&running);
    let seconds = args.seconds;
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(seconds));
        timer_flag.store(false, Ordering::Relaxed);
    });

    let mut tally = Tally::default();
    monitor.run(&mut tally, &running)?;

    println!(
        "processed {} frames, {} motion events",
        tally.frames, tally.motion_events
    );
    Ok(())
}

fn stage(name: &str) {
    eprintln!("==> {}", name);
}
