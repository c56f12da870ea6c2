use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::config::ImageFormat;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::constants::CROP_JPEG_QUALITY;
use crate::shared::frame::Frame;

/// Writes a single frame to an image file using the `image` crate.
///
/// The format comes from the file extension. JPEG output uses the
/// configured quality; resizing uses Lanczos3.
pub struct ImageFileWriter {
    jpeg_quality: u8,
}

impl ImageFileWriter {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new(CROP_JPEG_QUALITY)
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let encoder_format = ImageFormat::from_path(path)
            .and_then(|f| f.encoder_format())
            .ok_or_else(|| format!("No encoder for {}", path.display()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = frame
            .to_rgb_image()
            .ok_or("Failed to create image from frame data")?;
        let img = match size {
            Some((w, h)) if (w, h) != img.dimensions() => {
                image::imageops::resize(&img, w, h, FilterType::Lanczos3)
            }
            _ => img,
        };

        if encoder_format == image::ImageFormat::Jpeg {
            let out = BufWriter::new(File::create(path)?);
            img.write_with_encoder(JpegEncoder::new_with_quality(out, self.jpeg_quality))?;
        } else {
            img.save_with_format(path, encoder_format)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn make_frame(width: u32, height: u32, r: u8, g: u8, b: u8) -> Frame {
        Frame::from_rgb_image(image::RgbImage::from_pixel(width, height, image::Rgb([r, g, b])))
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        ImageFileWriter::default()
            .write(&path, &make_frame(50, 50, 50, 100, 200), None)
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[rstest]
    #[case("out.jpg")]
    #[case("out.JPEG")]
    #[case("out.bmp")]
    #[case("out.tiff")]
    #[case("out.png")]
    fn test_writes_format_from_extension(#[case] name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        ImageFileWriter::default()
            .write(&path, &make_frame(16, 12, 10, 20, 30), None)
            .unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (16, 12));
    }

    #[test]
    fn test_write_with_resize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.jpg");
        ImageFileWriter::default()
            .write(&path, &make_frame(200, 100, 128, 128, 128), Some((80, 40)))
            .unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (80, 40));
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.jpg");
        ImageFileWriter::default()
            .write(&path, &make_frame(8, 8, 0, 0, 0), None)
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unknown_extension_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xyz");
        assert!(ImageFileWriter::default()
            .write(&path, &make_frame(8, 8, 0, 0, 0), None)
            .is_err());
    }

    #[test]
    fn test_raw_extension_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nef");
        assert!(ImageFileWriter::default()
            .write(&path, &make_frame(8, 8, 0, 0, 0), None)
            .is_err());
    }

    #[test]
    fn test_lower_quality_gives_smaller_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let mut img = image::RgbImage::new(64, 64);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = image::Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8]);
        }
        let frame = Frame::from_rgb_image(img);
        let high = dir.path().join("high.jpg");
        let low = dir.path().join("low.jpg");

        ImageFileWriter::new(95).write(&high, &frame, None).unwrap();
        ImageFileWriter::new(10).write(&low, &frame, None).unwrap();

        let size = |p: &Path| std::fs::metadata(p).unwrap().len();
        assert!(size(&low) < size(&high));
    }
}
