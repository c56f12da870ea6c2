use std::path::Path;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations must treat every call independently: the same frame
/// always yields the same boxes, whatever was detected before. `&mut self`
/// only allows reusing scratch buffers and sessions.
pub trait FaceDetector: Send {
    /// Announces the source file of the next frame. Pixel-based backends ignore it.
    fn begin_image(&mut self, _path: &Path) {}

    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
