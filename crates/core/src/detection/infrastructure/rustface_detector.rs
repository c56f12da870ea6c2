use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

const MIN_FACE_SIZE: u32 = 20;
const SCORE_THRESH: f64 = 2.0;
const PYRAMID_SCALE_FACTOR: f32 = 0.8;
const SLIDE_WINDOW_STEP: u32 = 4;

/// Classical face detector backed by the `rustface` crate (SeetaFace cascade).
///
/// A fresh cascade is built from the loaded model on every call, so no
/// state leaks from one photo to the next.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load the SeetaFace model from `model_path`.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(model_path)
            .map_err(|e| format!("Failed to open {}: {e}", model_path.display()))?;
        let model = rustface::read_model(BufReader::new(file))
            .map_err(|e| format!("Failed to load SeetaFace model: {e}"))?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let rgb = frame
            .to_rgb_image()
            .ok_or_else(|| format!("expected RGB frame, got {} channels", frame.channels()))?;
        let gray = image::DynamicImage::ImageRgb8(rgb).into_luma8();
        let (width, height) = gray.dimensions();

        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESH);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));
        log::debug!("rustface found {} candidate face(s)", faces.len());

        Ok(faces
            .iter()
            .filter_map(|face| {
                let b = face.bbox();
                let x = b.x() as f64;
                let y = b.y() as f64;
                BoundingBox::from_corners(
                    x,
                    y,
                    x + b.width() as f64,
                    y + b.height() as f64,
                    width,
                    height,
                )
            })
            .collect())
    }
}
