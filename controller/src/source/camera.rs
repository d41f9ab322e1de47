use marker_signal_common::config::CameraConfig;
use marker_signal_common::frame::{now_ms, Frame, PixelLayout};
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};
use tracing::{info, warn};

use super::{FrameSource, SourceError};

/// Live camera through OpenCV's video capture, producing BGR frames.
pub struct OpenCvCamera {
    capture: VideoCapture,
    index: i32,
    next_seq: u64,
}

impl OpenCvCamera {
    pub fn open(config: &CameraConfig) -> Result<Self, SourceError> {
        let index = config.device_index;
        let open_err = |e: opencv::Error| SourceError::Open {
            index,
            reason: e.to_string(),
        };

        info!(index, width = config.width, height = config.height, fps = config.fps, "initializing camera");
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY).map_err(open_err)?;
        if !capture.is_opened().map_err(open_err)? {
            return Err(SourceError::Open {
                index,
                reason: "device did not open".into(),
            });
        }

        let requests = [
            (videoio::CAP_PROP_FRAME_WIDTH, config.width as f64, "width"),
            (videoio::CAP_PROP_FRAME_HEIGHT, config.height as f64, "height"),
            (videoio::CAP_PROP_FPS, config.fps, "fps"),
        ];
        for (prop, value, name) in requests {
            if !capture.set(prop, value).map_err(open_err)? {
                warn!(property = name, value, "camera ignored property request");
            }
        }

        Ok(Self {
            capture,
            index,
            next_seq: 0,
        })
    }
}

impl FrameSource for OpenCvCamera {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let capture_err = |e: opencv::Error| SourceError::Capture(e.to_string());

        let mut mat = Mat::default();
        let grabbed = self.capture.read(&mut mat).map_err(capture_err)?;
        if !grabbed || mat.empty() {
            return Err(SourceError::Capture(format!(
                "camera {} returned no frame",
                self.index
            )));
        }
        if mat.channels() != 3 {
            return Err(SourceError::Capture(format!(
                "expected 3-channel BGR frame, got {} channels",
                mat.channels()
            )));
        }

        let width = mat.cols() as u32;
        let height = mat.rows() as u32;
        let data = if mat.is_continuous() {
            mat.data_bytes().map_err(capture_err)?.to_vec()
        } else {
            let packed = mat.try_clone().map_err(capture_err)?;
            packed.data_bytes().map_err(capture_err)?.to_vec()
        };

        let frame = Frame::new(data, width, height, PixelLayout::Bgr8, self.next_seq, now_ms())?;
        self.next_seq += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> &str {
        "camera"
    }
}
