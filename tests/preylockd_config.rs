use std::sync::Mutex;

use tempfile::NamedTempFile;

use preylock::config::PreylockConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PREYLOCK_CONFIG",
        "PREYLOCK_CAMERA_URL",
        "PREYLOCK_SENSITIVITY",
        "PREYLOCK_CAPTURE_DIR",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": { "url": "rtsp://cat-cam.local/stream", "target_fps": 15 },
        "zone": { "sensitivity": 0.1, "topleft": [0.25, 0.3], "width": 0.5, "height": 0.4 },
        "capture": { "dir": "captures_test", "min_interval_secs": 30 },
        "detection": { "background_reset_frames": 15 }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PREYLOCK_CONFIG", file.path());
    std::env::set_var("PREYLOCK_SENSITIVITY", "0.2");

    let cfg = PreylockConfig::load().expect("load config");

    assert_eq!(cfg.camera.url, "rtsp://cat-cam.local/stream");
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.zone.sensitivity, 0.2);
    assert_eq!(cfg.zone.topleft, (0.25, 0.3));
    assert_eq!(cfg.zone.width, 0.5);
    assert_eq!(cfg.zone.height, 0.4);
    assert_eq!(cfg.capture.dir, std::path::PathBuf::from("captures_test"));
    assert_eq!(cfg.capture.min_interval.as_secs(), 30);
    assert_eq!(cfg.detection.background_reset_frames, 15);

    clear_env();
}

#[test]
fn defaults_apply_without_a_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PreylockConfig::load().expect("load config");

    assert_eq!(cfg.camera.url, "stub://cat_camera");
    assert_eq!(cfg.camera.target_fps, 30);
    assert_eq!(cfg.zone.sensitivity, 0.05);
    assert_eq!(cfg.zone.topleft, (0.2, 0.2));
    assert_eq!(cfg.detection.background_reset_frames, 30);

    clear_env();
}

#[test]
fn rejects_out_of_range_sensitivity() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "zone": { "sensitivity": 1.5 } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    assert!(PreylockConfig::load_from(file.path()).is_err());

    clear_env();
}

#[test]
fn rejects_degenerate_zone_extent() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "zone": { "width": 0.0 } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    assert!(PreylockConfig::load_from(file.path()).is_err());

    clear_env();
}

#[test]
fn sensitivity_change_survives_a_persist_round_trip() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("preylock.json");

    let mut cfg = PreylockConfig::default();
    cfg.set_sensitivity(0.3).expect("set sensitivity");
    cfg.persist(&path).expect("persist config");

    let reloaded = PreylockConfig::load_from(&path).expect("reload config");
    assert_eq!(reloaded.zone.sensitivity, 0.3);
    assert_eq!(reloaded.camera.url, cfg.camera.url);
    assert_eq!(
        reloaded.detection.background_reset_frames,
        cfg.detection.background_reset_frames
    );

    clear_env();
}
