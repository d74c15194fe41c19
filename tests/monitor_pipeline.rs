use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use preylock::{
    Camera, DetectionZone, Frame, Monitor, MonitorConfig, MonitorObserver, MonitorState,
    MotionDetector, Sensitivity, SharedZone, ZoneFractions,
};

fn full_zone(canvas: (u32, u32)) -> SharedZone {
    SharedZone::new(
        DetectionZone::new(
            ZoneFractions {
                left: 0.0,
                top: 0.0,
                width: 1.0,
                height: 1.0,
            },
            canvas.0,
            canvas.1,
        )
        .expect("zone"),
    )
}

fn paint_block(frame: &mut Frame, rgb: [u8; 3], x0: u32, y0: u32, w: u32, h: u32) {
    let width = frame.width();
    let data = frame.data_mut();
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let i = ((y * width + x) * 3) as usize;
            data[i..i + 3].copy_from_slice(&rgb);
        }
    }
}

fn monitor_with_reset_every(frames: u64) -> Monitor {
    let camera = Camera::start("stub://pipeline", 30).expect("start camera");
    let detector = MotionDetector::new(Sensitivity::new(0.05).expect("sensitivity"));
    let config = MonitorConfig {
        background_reset_frames: frames,
        ..MonitorConfig::default()
    };
    Monitor::new(camera, full_zone((64, 64)), detector, config)
}

#[derive(Default)]
struct Recorder {
    ticks: u64,
    motion_events: u64,
}

impl MonitorObserver for Recorder {
    fn frame_processed(&mut self, _frame: &Frame, _motion: bool) {
        self.ticks += 1;
    }

    fn motion_started(&mut self, _frame: &Frame) {
        self.motion_events += 1;
    }
}

#[test]
fn background_reset_cycles_force_no_motion() {
    let mut monitor = monitor_with_reset_every(4);

    let background = Frame::filled(64, 64, [0, 0, 0]);
    let mut moving = Frame::filled(64, 64, [0, 0, 0]);
    paint_block(&mut moving, [255, 255, 255], 8, 8, 32, 32);

    // Cycle 0 installs the background.
    assert!(!monitor.process_frame(&background));
    assert!(!monitor.process_frame(&background));
    assert!(monitor.process_frame(&moving));
    assert!(monitor.process_frame(&moving));

    // Cycle 4 is a reset: forced false, and the moving frame becomes the
    // new baseline.
    assert!(!monitor.process_frame(&moving));
    assert!(!monitor.process_frame(&moving));
}

#[test]
fn mid_cycle_zone_resize_reads_as_no_motion_until_resync() {
    let camera = Camera::start("stub://resize", 30).expect("start camera");
    let zone = full_zone((64, 64));
    let detector = MotionDetector::new(Sensitivity::new(0.05).expect("sensitivity"));
    let config = MonitorConfig {
        background_reset_frames: 4,
        ..MonitorConfig::default()
    };
    let mut monitor = Monitor::new(camera, zone.clone(), detector, config);

    let frame = Frame::filled(64, 64, [200, 200, 200]);
    assert!(!monitor.process_frame(&frame)); // background installed

    // Shrink the zone between cycles: the next crop has different
    // dimensions than the baseline.
    zone.apply(preylock::ZoneGesture::Resize {
        edge: preylock::Edge::Right,
        delta: -10,
    });

    let mut changed = Frame::filled(64, 64, [0, 0, 0]);
    paint_block(&mut changed, [255, 255, 255], 0, 0, 64, 64);
    assert!(!monitor.process_frame(&changed)); // mismatch, not an error

    // The mismatch persists until the next reset cycle resyncs the
    // baseline to the new geometry.
    assert!(!monitor.process_frame(&changed));
    assert!(!monitor.process_frame(&changed));
    assert!(!monitor.process_frame(&changed)); // reset cycle

    // ...after which differencing works again.
    assert!(monitor.process_frame(&frame));
}

#[test]
fn capture_seam_fires_once_per_motion_onset() {
    let mut monitor = monitor_with_reset_every(8);
    let mut recorder = Recorder::default();

    let background = Frame::filled(64, 64, [0, 0, 0]);
    let mut moving = Frame::filled(64, 64, [0, 0, 0]);
    paint_block(&mut moving, [255, 255, 255], 8, 8, 32, 32);

    assert!(!monitor.tick(&background, &mut recorder)); // background install
    assert!(monitor.tick(&moving, &mut recorder)); // onset
    assert!(monitor.tick(&moving, &mut recorder)); // sustained, no re-fire
    assert_eq!(recorder.motion_events, 1);

    assert!(!monitor.tick(&background, &mut recorder)); // motion ends
    assert!(monitor.tick(&moving, &mut recorder)); // second onset
    assert_eq!(recorder.motion_events, 2);
    assert_eq!(recorder.ticks, 5);
}

#[test]
fn warm_up_transitions_to_running_and_loop_publishes_ticks() {
    let mut monitor = monitor_with_reset_every(30);
    assert_eq!(monitor.state(), MonitorState::WarmingUp);

    // Let the stub camera produce its first frame so the 500ms run window
    // below starts from a ready monitor.
    let deadline = Instant::now() + Duration::from_secs(2);
    while !monitor.camera().is_ready() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }

    let running = Arc::new(AtomicBool::new(true));
    let timer_flag = Arc::clone(&running);
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(500));
        timer_flag.store(false, Ordering::Relaxed);
    });

    let mut recorder = Recorder::default();
    monitor.run(&mut recorder, &running).expect("run monitor");

    assert_eq!(monitor.state(), MonitorState::Running);
    assert!(recorder.ticks > 0);
}

#[test]
fn stub_camera_becomes_ready_within_the_warmup_budget() {
    let camera = Camera::start("stub://warmup", 30).expect("start camera");

    let deadline = Instant::now() + Duration::from_secs(2);
    while !camera.is_ready() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    let frame = camera.latest_frame().expect("ready frame");
    assert_eq!(frame.width(), 640);
    assert_eq!(frame.height(), 480);
    assert!(camera.stats().frames_captured > 0);
}
