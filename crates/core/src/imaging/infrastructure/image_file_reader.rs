use std::path::Path;

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Decodes common image formats with the pure-Rust `image` crate.
///
/// Any colour type is converted to 8-bit RGB.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?;
        Ok(Frame::from_rgb_image(img.to_rgb8()))
    }
}
