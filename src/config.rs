use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detect::validate_sensitivity;
use crate::zone::ZoneFractions;

const DEFAULT_CAMERA_URL: &str = "stub://cat_camera";
const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_SENSITIVITY: f64 = 0.05;
const DEFAULT_ZONE_TOPLEFT: [f64; 2] = [0.2, 0.2];
const DEFAULT_ZONE_WIDTH: f64 = 0.6;
const DEFAULT_ZONE_HEIGHT: f64 = 0.6;
const DEFAULT_CAPTURE_DIR: &str = "captures";
const DEFAULT_CAPTURE_INTERVAL_SECS: u64 = 60;
const DEFAULT_BACKGROUND_RESET_FRAMES: u64 = 30;

#[derive(Debug, Default, Deserialize, Serialize)]
struct PreylockConfigFile {
    camera: Option<CameraConfigFile>,
    zone: Option<ZoneConfigFile>,
    capture: Option<CaptureConfigFile>,
    detection: Option<DetectionConfigFile>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CameraConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ZoneConfigFile {
    sensitivity: Option<f64>,
    topleft: Option<[f64; 2]>,
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct CaptureConfigFile {
    dir: Option<String>,
    min_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct DetectionConfigFile {
    background_reset_frames: Option<u64>,
}

/// Persisted monitor configuration: read at startup, rewritten whenever
/// the sensitivity changes.
#[derive(Debug, Clone)]
pub struct PreylockConfig {
    pub camera: CameraSettings,
    pub zone: ZoneSettings,
    pub capture: CaptureSettings,
    pub detection: DetectionSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub url: String,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct ZoneSettings {
    pub sensitivity: f64,
    pub topleft: (f64, f64),
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub dir: PathBuf,
    pub min_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub background_reset_frames: u64,
}

impl PreylockConfig {
    /// Load from the path in `PREYLOCK_CONFIG` (defaults apply without
    /// one), then apply environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PREYLOCK_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PreylockConfigFile) -> Self {
        let camera = CameraSettings {
            url: file
                .camera
                .as_ref()
                .and_then(|camera| camera.url.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let topleft = file
            .zone
            .as_ref()
            .and_then(|zone| zone.topleft)
            .unwrap_or(DEFAULT_ZONE_TOPLEFT);
        let zone = ZoneSettings {
            sensitivity: file
                .zone
                .as_ref()
                .and_then(|zone| zone.sensitivity)
                .unwrap_or(DEFAULT_SENSITIVITY),
            topleft: (topleft[0], topleft[1]),
            width: file
                .zone
                .as_ref()
                .and_then(|zone| zone.width)
                .unwrap_or(DEFAULT_ZONE_WIDTH),
            height: file
                .zone
                .as_ref()
                .and_then(|zone| zone.height)
                .unwrap_or(DEFAULT_ZONE_HEIGHT),
        };
        let capture = CaptureSettings {
            dir: file
                .capture
                .as_ref()
                .and_then(|capture| capture.dir.clone())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CAPTURE_DIR)),
            min_interval: Duration::from_secs(
                file.capture
                    .as_ref()
                    .and_then(|capture| capture.min_interval_secs)
                    .unwrap_or(DEFAULT_CAPTURE_INTERVAL_SECS),
            ),
        };
        let detection = DetectionSettings {
            background_reset_frames: file
                .detection
                .and_then(|detection| detection.background_reset_frames)
                .unwrap_or(DEFAULT_BACKGROUND_RESET_FRAMES),
        };
        Self {
            camera,
            zone,
            capture,
            detection,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("PREYLOCK_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url;
            }
        }
        if let Ok(value) = std::env::var("PREYLOCK_SENSITIVITY") {
            let parsed: f64 = value
                .parse()
                .map_err(|_| anyhow!("PREYLOCK_SENSITIVITY must be a float"))?;
            self.zone.sensitivity = parsed;
        }
        if let Ok(dir) = std::env::var("PREYLOCK_CAPTURE_DIR") {
            if !dir.trim().is_empty() {
                self.capture.dir = PathBuf::from(dir);
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        validate_sensitivity(self.zone.sensitivity)?;
        for (name, v) in [
            ("topleft x", self.zone.topleft.0),
            ("topleft y", self.zone.topleft.1),
            ("width", self.zone.width),
            ("height", self.zone.height),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(anyhow!("zone {} must be within [0, 1], got {}", name, v));
            }
        }
        if self.zone.width <= 0.0 || self.zone.height <= 0.0 {
            return Err(anyhow!("zone must have a positive extent"));
        }
        if self.camera.url.trim().is_empty() {
            return Err(anyhow!("camera url must not be empty"));
        }
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be greater than zero"));
        }
        if self.detection.background_reset_frames == 0 {
            return Err(anyhow!("background_reset_frames must be greater than zero"));
        }
        Ok(())
    }

    /// Update the sensitivity in place. Callers `persist` afterwards so
    /// the new value survives a restart.
    pub fn set_sensitivity(&mut self, value: f64) -> Result<()> {
        validate_sensitivity(value)?;
        self.zone.sensitivity = value;
        Ok(())
    }

    /// Rewrite the config file with the current settings.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let file = PreylockConfigFile {
            camera: Some(CameraConfigFile {
                url: Some(self.camera.url.clone()),
                target_fps: Some(self.camera.target_fps),
            }),
            zone: Some(ZoneConfigFile {
                sensitivity: Some(self.zone.sensitivity),
                topleft: Some([self.zone.topleft.0, self.zone.topleft.1]),
                width: Some(self.zone.width),
                height: Some(self.zone.height),
            }),
            capture: Some(CaptureConfigFile {
                dir: Some(self.capture.dir.display().to_string()),
                min_interval_secs: Some(self.capture.min_interval.as_secs()),
            }),
            detection: Some(DetectionConfigFile {
                background_reset_frames: Some(self.detection.background_reset_frames),
            }),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)
            .with_context(|| format!("write config file {}", path.display()))?;
        Ok(())
    }

    /// The persisted zone geometry as fractions.
    pub fn zone_fractions(&self) -> ZoneFractions {
        ZoneFractions {
            left: self.zone.topleft.0,
            top: self.zone.topleft.1,
            width: self.zone.width,
            height: self.zone.height,
        }
    }
}

impl Default for PreylockConfig {
    fn default() -> Self {
        Self::from_file(PreylockConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<PreylockConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
