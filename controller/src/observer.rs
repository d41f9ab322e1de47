use marker_signal_common::config::Config;
use marker_signal_common::frame::Frame;
use marker_signal_common::marker::MarkerSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::ControlError;

/// Side channel notified after each stage of the control loop.
///
/// Hooks default to no-ops and cannot fail the loop; an observer that hits
/// an error logs it and carries on.
pub trait PipelineObserver {
    fn on_frame(&mut self, _frame: &Frame) {}

    fn on_markers(&mut self, _frame: &Frame, _markers: &MarkerSet) {}

    fn on_inbound(&mut self, _bytes: &[u8]) {}

    fn on_signal(&mut self, _frame: &Frame, _signal: bool) {}

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Logs detections and signals through `tracing`.
///
/// Changes of the signal are logged at info. Per-frame markers and inbound
/// serial data go to debug, or to info when `verbose` is set, so debug mode
/// shows detection output under the default log level.
#[derive(Debug, Default)]
pub struct TracingObserver {
    verbose: bool,
    last_signal: Option<bool>,
}

impl TracingObserver {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            last_signal: None,
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

impl PipelineObserver for TracingObserver {
    fn on_markers(&mut self, frame: &Frame, markers: &MarkerSet) {
        if self.verbose {
            info!(seq = frame.seq(), count = markers.len(), ids = %markers, "markers detected");
        } else {
            debug!(seq = frame.seq(), count = markers.len(), ids = %markers, "markers detected");
        }
    }

    fn on_inbound(&mut self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        if self.verbose {
            info!(len = bytes.len(), text = %text, "inbound serial data");
        } else {
            debug!(len = bytes.len(), text = %text, "inbound serial data");
        }
    }

    fn on_signal(&mut self, frame: &Frame, signal: bool) {
        debug!(seq = frame.seq(), signal, "signal sent");
        if self.last_signal != Some(signal) {
            if signal {
                info!(seq = frame.seq(), "object detected");
            } else {
                info!(seq = frame.seq(), "no object detected");
            }
            self.last_signal = Some(signal);
        }
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

pub const FRAME_FILE: &str = "frame.png";
pub const GRAY_FILE: &str = "frame-gray.png";

/// Overwrites the latest captured frame and its grayscale version on disk.
pub struct DebugDumpObserver {
    dir: PathBuf,
}

impl DebugDumpObserver {
    /// Create the dump directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "debug image dumps enabled");
        Ok(Self { dir })
    }
}

impl PipelineObserver for DebugDumpObserver {
    fn on_frame(&mut self, frame: &Frame) {
        let color = self.dir.join(FRAME_FILE);
        if let Err(e) = frame.to_rgb().save(&color) {
            warn!(error = %e, path = %color.display(), "failed to write debug frame");
        }

        let gray = self.dir.join(GRAY_FILE);
        if let Err(e) = frame.to_gray().save(&gray) {
            warn!(error = %e, path = %gray.display(), "failed to write debug gray frame");
        }
    }

    fn name(&self) -> &str {
        "debug_dump"
    }
}

/// Observers for a run: tracing always, image dumps when debug is enabled.
pub fn from_config(config: &Config) -> Result<Vec<Box<dyn PipelineObserver>>, ControlError> {
    let mut observers: Vec<Box<dyn PipelineObserver>> =
        vec![Box::new(TracingObserver::new(config.debug.enabled))];
    if config.debug.enabled {
        let dump = DebugDumpObserver::new(&config.debug.dump_dir)
            .map_err(|e| ControlError::DebugDir(config.debug.dump_dir.clone(), e))?;
        observers.push(Box::new(dump));
    }
    Ok(observers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_signal_common::frame::PixelLayout;

    #[test]
    fn dumps_color_and_gray() {
        let dir = std::env::temp_dir().join(format!("marker-signal-dump-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut observer = DebugDumpObserver::new(&dir).unwrap();
        let frame = Frame::new(vec![0, 0, 255, 255, 255, 255], 2, 1, PixelLayout::Bgr8, 0, 0).unwrap();
        observer.on_frame(&frame);

        let color = image::open(dir.join(FRAME_FILE)).unwrap().into_rgb8();
        assert_eq!(color.get_pixel(0, 0).0, [255, 0, 0]);

        let gray = image::open(dir.join(GRAY_FILE)).unwrap();
        assert_eq!(gray.color(), image::ColorType::L8);
        assert_eq!(gray.into_luma8().as_raw(), frame.to_gray().as_raw());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn tracing_observer_tracks_transitions() {
        let frame = crate::test_support::gray_frame(0);
        let mut observer = TracingObserver::new(false);
        observer.on_signal(&frame, true);
        assert_eq!(observer.last_signal, Some(true));
        observer.on_signal(&frame, true);
        observer.on_signal(&frame, false);
        assert_eq!(observer.last_signal, Some(false));
    }

    #[test]
    fn release_config_logs_quietly_without_dumps() {
        let observers = from_config(&Config::default()).unwrap();
        let names: Vec<_> = observers.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["tracing"]);
        assert!(!TracingObserver::new(Config::default().debug.enabled).verbose());
    }

    #[test]
    fn debug_config_adds_dumps_and_verbose_logging() {
        let dir = std::env::temp_dir().join(format!("marker-signal-debug-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut config = Config::default();
        config.debug.enabled = true;
        config.debug.dump_dir = dir.clone();

        let observers = from_config(&config).unwrap();
        let names: Vec<_> = observers.iter().map(|o| o.name()).collect();
        assert_eq!(names, vec!["tracing", "debug_dump"]);
        assert!(TracingObserver::new(config.debug.enabled).verbose());
        assert!(dir.is_dir());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unusable_dump_dir_is_fatal() {
        let blocker = std::env::temp_dir().join(format!("marker-signal-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut config = Config::default();
        config.debug.enabled = true;
        config.debug.dump_dir = blocker.join("dumps");

        let err = from_config(&config).err().unwrap();
        assert!(matches!(err, ControlError::DebugDir(ref path, _) if *path == config.debug.dump_dir));

        std::fs::remove_file(&blocker).ok();
    }
}
