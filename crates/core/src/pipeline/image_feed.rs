use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Receives each decoded photo, or its decode error, in listing order.
pub type ImageSink<'a> = dyn FnMut(&Path, Result<Frame, Box<dyn std::error::Error>>) + 'a;

/// Abstracts how photos are decoded and handed to the detection stage.
///
/// Implementations must call `sink` exactly once per path, in the order
/// given, and always on the calling thread.
pub trait ImageFeed: Send {
    fn feed(
        &self,
        reader: Arc<dyn ImageReader>,
        images: Vec<PathBuf>,
        sink: &mut ImageSink<'_>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Decodes each photo on the calling thread just before it is handed on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialImageFeed;

impl ImageFeed for SequentialImageFeed {
    fn feed(
        &self,
        reader: Arc<dyn ImageReader>,
        images: Vec<PathBuf>,
        sink: &mut ImageSink<'_>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for path in images {
            let decoded = reader.read(&path);
            sink(path.as_path(), decoded);
        }
        Ok(())
    }
}
