use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes one image file into an RGB frame.
///
/// Readers hold no per-file state, so one instance may be shared by a
/// reader thread and the orchestrating thread.
pub trait ImageReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>>;
}
