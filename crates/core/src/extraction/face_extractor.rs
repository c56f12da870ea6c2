use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::identity::face_identity::FaceIdentity;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::imaging::infrastructure::image_file_writer::ImageFileWriter;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::CROP_JPEG_QUALITY;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("face box {bbox} lies outside the {width}x{height} image")]
    OutsideImage {
        bbox: BoundingBox,
        width: u32,
        height: u32,
    },
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write crop {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Crops faces out of photos and saves them as JPEG files.
///
/// Stateless; no pixels are kept between calls.
pub struct FaceExtractor {
    writer: Box<dyn ImageWriter>,
}

impl FaceExtractor {
    pub fn new() -> Self {
        Self::with_writer(Box::new(ImageFileWriter::new(CROP_JPEG_QUALITY)))
    }

    pub fn with_writer(writer: Box<dyn ImageWriter>) -> Self {
        Self { writer }
    }

    /// Writes the part of `image` under `bbox` to `output_dir/<name-or-id>.jpg`.
    ///
    /// Boxes reaching past the image edge are clamped. Returns the written path.
    pub fn extract(
        &self,
        image: &Frame,
        bbox: &BoundingBox,
        identity: &FaceIdentity,
        output_dir: &Path,
    ) -> Result<PathBuf, ExtractError> {
        let crop = image.crop(bbox).ok_or(ExtractError::OutsideImage {
            bbox: *bbox,
            width: image.width(),
            height: image.height(),
        })?;

        std::fs::create_dir_all(output_dir).map_err(|source| ExtractError::CreateDir {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let path = output_dir.join(format!("{}.jpg", identity.file_stem()));
        self.writer
            .write(&path, &crop, None)
            .map_err(|e| ExtractError::Write {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Ok(path)
    }
}

impl Default for FaceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(width: u32, height: u32) -> Frame {
        Frame::from_rgb_image(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 150, 100]),
        ))
    }

    fn identity(bbox: BoundingBox) -> FaceIdentity {
        FaceIdentity::mint(Path::new("a.jpg"), 0, bbox)
    }

    #[test]
    fn test_extract_writes_crop_named_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let bbox = BoundingBox::new(10, 20, 30, 40).unwrap();
        let face = identity(bbox);

        let path = FaceExtractor::new()
            .extract(&photo(100, 100), &bbox, &face, dir.path())
            .unwrap();

        assert_eq!(path, dir.path().join(format!("{}.jpg", face.id)));
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (30, 40));
    }

    #[test]
    fn test_extract_uses_display_name_when_set() {
        let dir = tempfile::tempdir().unwrap();
        let bbox = BoundingBox::new(0, 0, 10, 10).unwrap();
        let mut face = identity(bbox);
        face.set_name("Grace Hopper");

        let path = FaceExtractor::new()
            .extract(&photo(50, 50), &bbox, &face, dir.path())
            .unwrap();

        assert_eq!(path, dir.path().join("Grace Hopper.jpg"));
    }

    #[test]
    fn test_box_past_edge_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let bbox = BoundingBox::new(80, 90, 50, 50).unwrap();

        let path = FaceExtractor::new()
            .extract(&photo(100, 100), &bbox, &identity(bbox), dir.path())
            .unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
    }

    #[test]
    fn test_box_outside_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bbox = BoundingBox::new(200, 200, 10, 10).unwrap();

        let result = FaceExtractor::new().extract(&photo(100, 100), &bbox, &identity(bbox), dir.path());

        assert!(matches!(result, Err(ExtractError::OutsideImage { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("extracted_faces");
        let bbox = BoundingBox::new(0, 0, 5, 5).unwrap();

        FaceExtractor::new()
            .extract(&photo(10, 10), &bbox, &identity(bbox), &out)
            .unwrap();

        assert!(out.is_dir());
    }
}
