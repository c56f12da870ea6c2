use std::collections::HashMap;
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Replays pre-set boxes keyed by image file name.
///
/// Frames carry no path, so the caller announces the upcoming image with
/// [`FaceDetector::begin_image`]. Unknown images yield no faces, and names
/// registered with [`FixedFaceDetector::fail_on`] yield an error.
#[derive(Debug, Default, Clone)]
pub struct FixedFaceDetector {
    boxes: HashMap<String, Vec<BoundingBox>>,
    failing: Vec<String>,
    current: Option<String>,
}

impl FixedFaceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faces(mut self, file_name: &str, boxes: Vec<BoundingBox>) -> Self {
        self.boxes.insert(file_name.to_string(), boxes);
        self
    }

    pub fn fail_on(mut self, file_name: &str) -> Self {
        self.failing.push(file_name.to_string());
        self
    }
}

impl FaceDetector for FixedFaceDetector {
    fn begin_image(&mut self, path: &Path) {
        self.current = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let Some(name) = self.current.as_deref() else {
            return Ok(Vec::new());
        };
        if self.failing.iter().any(|f| f == name) {
            return Err(format!("detector failure on {name}").into());
        }
        Ok(self.boxes.get(name).cloned().unwrap_or_default())
    }
}
