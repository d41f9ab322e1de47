pub mod replay;

#[cfg(feature = "opencv")]
pub mod camera;

#[cfg(feature = "opencv")]
pub use camera::OpenCvCamera;
pub use replay::ReplaySource;

use marker_signal_common::config::{Config, SourceMode};
use marker_signal_common::frame::{Frame, FrameError};
use std::path::PathBuf;

/// Pull-based supplier of frames for the control loop.
pub trait FrameSource {
    /// Block until the next frame is available.
    ///
    /// `Ok(None)` means a bounded source has run out; a live camera never
    /// returns it.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Open the frame source selected by `source.mode`.
pub fn open_source(config: &Config) -> Result<Box<dyn FrameSource>, SourceError> {
    match config.source.mode {
        SourceMode::Camera => open_camera(config),
        SourceMode::Replay => {
            let dir = config
                .source
                .replay_dir
                .as_deref()
                .ok_or(SourceError::Unsupported("replay mode without source.replay_dir"))?;
            Ok(Box::new(ReplaySource::open(dir, config.source.repeat)?))
        }
    }
}

#[cfg(feature = "opencv")]
fn open_camera(config: &Config) -> Result<Box<dyn FrameSource>, SourceError> {
    Ok(Box::new(OpenCvCamera::open(&config.camera)?))
}

#[cfg(not(feature = "opencv"))]
fn open_camera(_config: &Config) -> Result<Box<dyn FrameSource>, SourceError> {
    Err(SourceError::Unsupported(
        "camera capture requires building with the `opencv` feature",
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to open camera {index}: {reason}")]
    Open { index: i32, reason: String },
    #[error("frame capture failed: {0}")]
    Capture(String),
    #[error("failed to read replay directory {0}: {1}")]
    ReplayDir(PathBuf, std::io::Error),
    #[error("no image files found in replay directory {0}")]
    EmptyReplay(PathBuf),
    #[error("failed to decode {0}: {1}")]
    Decode(PathBuf, image::ImageError),
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}
