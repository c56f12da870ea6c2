use std::path::Path;

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

/// Decodes a still image through ffmpeg at its native resolution.
///
/// Used for camera RAW files the `image` crate cannot open. Every call
/// opens its own demuxer and decoder, so no ffmpeg state outlives a read.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegImageReader;

impl FfmpegImageReader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageReader for FfmpegImageReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| format!("No image data found in {}", path.display()))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().video()?;
        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(format!("{} reports empty dimensions", path.display()).into());
        }

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            if let Some(frame) = receive_rgb(&mut decoder, &mut scaler, width, height)? {
                return Ok(frame);
            }
        }

        // Some decoders hold the only frame until flushed
        let _ = decoder.send_eof();
        receive_rgb(&mut decoder, &mut scaler, width, height)?
            .ok_or_else(|| format!("Failed to decode {}", path.display()).into())
    }
}

fn receive_rgb(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_err() {
        return Ok(None);
    }
    let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
    scaler.run(&decoded, &mut rgb)?;

    // Rows are padded to the stride; copy only the visible pixels.
    let stride = rgb.stride(0);
    let row_bytes = width as usize * 3;
    let data = rgb.data(0);
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    Ok(Some(Frame::new(pixels, width, height, 3)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_decodes_png_at_native_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.png");
        image::RgbImage::from_pixel(100, 80, image::Rgb([50, 100, 200]))
            .save(&path)
            .unwrap();

        let frame = FfmpegImageReader::new().read(&path).unwrap();

        assert_eq!((frame.width(), frame.height(), frame.channels()), (100, 80, 3));
        assert_eq!(&frame.data()[0..3], &[50, 100, 200]);
    }

    #[test]
    fn test_read_nonexistent_is_error() {
        assert!(FfmpegImageReader::new()
            .read(Path::new("/nonexistent/DSC_0001.nef"))
            .is_err());
    }

    #[test]
    fn test_read_garbage_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DSC_0002.nef");
        std::fs::write(&path, b"not a raw file").unwrap();
        assert!(FfmpegImageReader::new().read(&path).is_err());
    }
}
