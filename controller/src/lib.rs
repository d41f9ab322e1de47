//! Camera-to-serial marker presence controller.
//!
//! Each frame goes through capture, ArUco detection, a presence policy and a
//! one-byte serial write to the microcontroller.

pub mod control;
pub mod detector;
pub mod link;
pub mod observer;
pub mod policy;
pub mod source;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("frame source error: {0}")]
    Source(#[from] source::SourceError),
    #[error("marker detection error: {0}")]
    Detect(#[from] detector::DetectError),
    #[error("serial link error: {0}")]
    Link(#[from] link::LinkError),
    #[error("configuration error: {0}")]
    Config(#[from] marker_signal_common::config::ConfigError),
    #[error("failed to prepare debug directory {0}: {1}")]
    DebugDir(PathBuf, std::io::Error),
}
