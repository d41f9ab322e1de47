#[cfg(feature = "opencv")]
pub mod aruco;

#[cfg(feature = "opencv")]
pub use aruco::ArucoDetector;

use marker_signal_common::config::DetectionConfig;
use marker_signal_common::frame::Frame;
use marker_signal_common::marker::MarkerSet;

/// Finds fiducial markers in a frame.
pub trait MarkerDetector {
    /// Ids of every marker found in `frame`.
    ///
    /// Finding nothing is the common case and yields an empty set, never an error.
    fn detect(&mut self, frame: &Frame) -> Result<MarkerSet, DetectError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Build the ArUco detector for the configured dictionary.
#[cfg(feature = "opencv")]
pub fn open_detector(config: &DetectionConfig) -> Result<Box<dyn MarkerDetector>, DetectError> {
    Ok(Box::new(ArucoDetector::new(config.dictionary)?))
}

#[cfg(not(feature = "opencv"))]
pub fn open_detector(_config: &DetectionConfig) -> Result<Box<dyn MarkerDetector>, DetectError> {
    Err(DetectError::Unsupported(
        "ArUco detection requires building with the `opencv` feature",
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("marker detection library error: {0}")]
    Library(String),
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}
