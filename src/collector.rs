//! Disk capture sink for motion events.
//!
//! The detection loop only signals; this sink owns the capture policy: a
//! minimum interval between captures and a target directory. Encoding
//! errors are logged and swallowed so a full disk can never stall
//! detection.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::frame::Frame;
use crate::monitor::MonitorObserver;

/// Default minimum spacing between captures.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_secs(60);

/// Writes a JPEG of the raw frame on each motion onset, rate-limited.
pub struct DiskCollector {
    dir: PathBuf,
    min_interval: Duration,
    last_capture: Option<Instant>,
    captures: u64,
}

impl DiskCollector {
    pub fn new(dir: PathBuf, min_interval: Duration) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create capture directory {}", dir.display()))?;
        Ok(Self {
            dir,
            min_interval,
            last_capture: None,
            captures: 0,
        })
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn capture_path(&self) -> Result<PathBuf> {
        let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        Ok(self.dir.join(format!("{}_capture.jpg", stamp)))
    }

    fn store(&mut self, frame: &Frame) -> Result<PathBuf> {
        let path = self.capture_path()?;
        let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
        let mut encoder = JpegEncoder::new(BufWriter::new(file));
        encoder
            .encode(
                frame.data(),
                frame.width(),
                frame.height(),
                image::ExtendedColorType::Rgb8,
            )
            .context("encode capture jpeg")?;
        self.captures += 1;
        Ok(path)
    }
}

impl MonitorObserver for DiskCollector {
    fn motion_started(&mut self, frame: &Frame) {
        if let Some(last) = self.last_capture {
            if last.elapsed() < self.min_interval {
                return;
            }
        }
        self.last_capture = Some(Instant::now());

        match self.store(frame) {
            Ok(path) => log::info!("captured {}", path.display()),
            Err(e) => log::warn!("capture failed: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_are_rate_limited() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut collector =
            DiskCollector::new(dir.path().to_path_buf(), Duration::from_secs(60)).expect("sink");
        let frame = Frame::filled(16, 16, [40, 80, 120]);

        collector.motion_started(&frame);
        collector.motion_started(&frame);
        assert_eq!(collector.captures(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 1);
    }

    #[test]
    fn capture_files_use_the_timestamped_naming() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut collector =
            DiskCollector::new(dir.path().to_path_buf(), Duration::ZERO).expect("sink");
        collector.motion_started(&Frame::filled(8, 8, [1, 2, 3]));

        let entry = std::fs::read_dir(dir.path())
            .expect("read dir")
            .next()
            .expect("one capture")
            .expect("entry");
        let name = entry.file_name().into_string().expect("utf8 name");
        assert!(name.ends_with("_capture.jpg"));
    }
}
