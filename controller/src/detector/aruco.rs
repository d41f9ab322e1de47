use marker_signal_common::config::MarkerDictionary;
use marker_signal_common::frame::{Frame, PixelLayout};
use marker_signal_common::marker::MarkerSet;
use opencv::core::{Mat, Point2f, Vector};
use opencv::imgproc;
use opencv::objdetect::{self, PredefinedDictionaryType};
use opencv::prelude::*;
use tracing::info;

use super::{DetectError, MarkerDetector};

// OpenCV's defaults for marker refinement.
const REFINE_MIN_REP_DISTANCE: f32 = 10.0;
const REFINE_ERROR_CORRECTION_RATE: f32 = 3.0;
const REFINE_CHECK_ALL_ORDERS: bool = true;

/// OpenCV ArUco detector with default detection parameters.
pub struct ArucoDetector {
    inner: objdetect::ArucoDetector,
}

fn library_err(e: opencv::Error) -> DetectError {
    DetectError::Library(e.to_string())
}

fn predefined(dictionary: MarkerDictionary) -> PredefinedDictionaryType {
    use MarkerDictionary::*;
    use PredefinedDictionaryType as P;
    match dictionary {
        ArucoOriginal => P::DICT_ARUCO_ORIGINAL,
        Dict4x4_50 => P::DICT_4X4_50,
        Dict4x4_100 => P::DICT_4X4_100,
        Dict4x4_250 => P::DICT_4X4_250,
        Dict4x4_1000 => P::DICT_4X4_1000,
        Dict5x5_50 => P::DICT_5X5_50,
        Dict5x5_100 => P::DICT_5X5_100,
        Dict5x5_250 => P::DICT_5X5_250,
        Dict5x5_1000 => P::DICT_5X5_1000,
        Dict6x6_50 => P::DICT_6X6_50,
        Dict6x6_100 => P::DICT_6X6_100,
        Dict6x6_250 => P::DICT_6X6_250,
        Dict6x6_1000 => P::DICT_6X6_1000,
        Dict7x7_50 => P::DICT_7X7_50,
        Dict7x7_100 => P::DICT_7X7_100,
        Dict7x7_250 => P::DICT_7X7_250,
        Dict7x7_1000 => P::DICT_7X7_1000,
        AprilTag36h11 => P::DICT_APRILTAG_36h11,
    }
}

impl ArucoDetector {
    pub fn new(dictionary: MarkerDictionary) -> Result<Self, DetectError> {
        let dict = objdetect::get_predefined_dictionary(predefined(dictionary)).map_err(library_err)?;
        let params = objdetect::DetectorParameters::default().map_err(library_err)?;
        let refine = objdetect::RefineParameters::new(
            REFINE_MIN_REP_DISTANCE,
            REFINE_ERROR_CORRECTION_RATE,
            REFINE_CHECK_ALL_ORDERS,
        )
        .map_err(library_err)?;
        let inner = objdetect::ArucoDetector::new(&dict, &params, refine).map_err(library_err)?;

        info!(?dictionary, "ArUco detector ready");
        Ok(Self { inner })
    }
}

impl MarkerDetector for ArucoDetector {
    fn detect(&mut self, frame: &Frame) -> Result<MarkerSet, DetectError> {
        // View the frame buffer as a rows x cols Mat with the frame's channel count.
        let flat = Mat::from_slice(frame.data()).map_err(library_err)?;
        let image = flat
            .reshape(frame.channels() as i32, frame.height() as i32)
            .map_err(library_err)?;

        let mut gray = Mat::default();
        match frame.layout() {
            PixelLayout::Bgr8 => {
                imgproc::cvt_color(&*image, &mut gray, imgproc::COLOR_BGR2GRAY, 0).map_err(library_err)?
            }
            PixelLayout::Rgb8 => {
                imgproc::cvt_color(&*image, &mut gray, imgproc::COLOR_RGB2GRAY, 0).map_err(library_err)?
            }
            PixelLayout::Gray8 => image.copy_to(&mut gray).map_err(library_err)?,
        }

        let mut corners = Vector::<Vector<Point2f>>::new();
        let mut ids = Vector::<i32>::new();
        let mut rejected = Vector::<Vector<Point2f>>::new();
        self.inner
            .detect_markers(&gray, &mut corners, &mut ids, &mut rejected)
            .map_err(library_err)?;

        Ok(ids.iter().collect())
    }

    fn name(&self) -> &str {
        "aruco"
    }
}
