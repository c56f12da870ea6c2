use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ImageFormat;
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::imaging::infrastructure::ffmpeg_image_reader::FfmpegImageReader;
use crate::imaging::infrastructure::folder_scanner::list_images;
use crate::imaging::infrastructure::image_file_reader::ImageFileReader;
use crate::imaging::infrastructure::image_file_writer::ImageFileWriter;
use crate::shared::constants::{CONVERTED_DIR_NAME, CROP_JPEG_QUALITY};
use crate::shared::item_failure::{ItemFailure, Stage};

/// Outcome of converting one folder.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConversionReport {
    /// Files written, in processing order.
    pub converted: Vec<PathBuf>,
    pub failed: Vec<ItemFailure>,
}

/// Normalizes a folder of photos into `converted-images/`.
///
/// Regular images are resized to the target width with Lanczos3, keeping
/// the aspect ratio. Raw files are decoded at native resolution. A file
/// that fails is logged and reported; the batch always runs to the end.
pub struct ImageConverter {
    target_format: ImageFormat,
    target_width: u32,
    reader: Box<dyn ImageReader>,
    raw_reader: Box<dyn ImageReader>,
    writer: Box<dyn ImageWriter>,
}

impl ImageConverter {
    pub fn new(target_format: ImageFormat, target_width: u32) -> Self {
        Self {
            target_format,
            target_width,
            reader: Box::new(ImageFileReader::new()),
            raw_reader: Box::new(FfmpegImageReader::new()),
            writer: Box::new(ImageFileWriter::new(CROP_JPEG_QUALITY)),
        }
    }

    /// Replaces the decoder used for raw files.
    pub fn with_raw_reader(mut self, raw_reader: Box<dyn ImageReader>) -> Self {
        self.raw_reader = raw_reader;
        self
    }

    pub fn output_dir(input_folder: &Path) -> PathBuf {
        input_folder.join(CONVERTED_DIR_NAME)
    }

    /// Converts every recognized image directly inside `input_folder`.
    ///
    /// Only listing the folder or creating the output folder can fail the
    /// whole call.
    pub fn convert_folder(
        &self,
        input_folder: &Path,
    ) -> Result<ConversionReport, Box<dyn std::error::Error>> {
        let sources = list_images(input_folder, |_| true)?;
        let output_dir = Self::output_dir(input_folder);
        std::fs::create_dir_all(&output_dir)?;

        log::info!(
            "Converting {} file(s) in {} to {}",
            sources.len(),
            input_folder.display(),
            self.target_format
        );

        let mut report = ConversionReport::default();
        let mut written = HashSet::new();
        for source in sources {
            let Some(format) = ImageFormat::from_path(&source) else {
                continue;
            };
            let dest = self.destination(&output_dir, &source);
            if !written.insert(dest.clone()) {
                log::warn!(
                    "{} overwrites an earlier conversion with the same name",
                    source.display()
                );
            }

            match self.convert_file(&source, format, &dest) {
                Ok(()) => {
                    log::debug!("Converted {} -> {}", source.display(), dest.display());
                    report.converted.push(dest);
                }
                Err(e) => {
                    let failure = ItemFailure::new(Stage::Converting, source.display(), e.as_ref());
                    log::warn!("Failed to convert {}: {}", source.display(), failure.reason);
                    report.failed.push(failure);
                }
            }
        }

        log::info!(
            "Conversion finished: {} converted, {} failed",
            report.converted.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn destination(&self, output_dir: &Path, source: &Path) -> PathBuf {
        let stem = source.file_stem().unwrap_or(source.as_os_str());
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(self.target_format.extension());
        output_dir.join(name)
    }

    fn convert_file(
        &self,
        source: &Path,
        format: ImageFormat,
        dest: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if format.is_raw() {
            let frame = self.raw_reader.read(source)?;
            return self.writer.write(dest, &frame, None);
        }
        let frame = self.reader.read(source)?;
        let size = scaled_size(frame.width(), frame.height(), self.target_width);
        self.writer.write(dest, &frame, Some(size))
    }
}

/// Size with the given width and the height scaled to keep the aspect ratio.
fn scaled_size(width: u32, height: u32, target_width: u32) -> (u32, u32) {
    let scaled = (target_width as u64 * height as u64) / width.max(1) as u64;
    (target_width, (scaled as u32).max(1))
}
