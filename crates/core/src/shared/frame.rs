use ndarray::ArrayView3;

use crate::shared::bounding_box::BoundingBox;

/// A decoded photograph: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 3)
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        if self.channels != 3 {
            return None;
        }
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `bbox`, clamped to the frame bounds.
    ///
    /// Returns `None` when the box does not overlap the frame at all.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let visible = bbox.clamp_to(self.width, self.height)?;
        let x1 = visible.x as usize;
        let y1 = visible.y as usize;
        let x2 = x1 + visible.width as usize;
        let y2 = y1 + visible.height as usize;
        let channels = self.channels as usize;
        let row_len = self.width as usize * channels;

        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            let start = row * row_len + x1 * channels;
            let end = row * row_len + x2 * channels;
            data.extend_from_slice(&self.data[start..end]);
        }

        Some(Frame::new(
            data,
            visible.width,
            visible.height,
            self.channels,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(x as u8);
                data.push(y as u8);
                data.push(0);
            }
        }
        Frame::new(data, width, height, 3)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3);
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 2, 3]);
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
    }

    #[test]
    fn test_rgb_image_roundtrip() {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
        let frame = Frame::from_rgb_image(img);
        assert_eq!((frame.width(), frame.height()), (4, 3));
        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(3, 2).0, [10, 20, 30]);
    }

    #[test]
    fn test_crop_inside_frame() {
        let frame = gradient_frame(10, 10);
        let crop = frame.crop(&BoundingBox::new(2, 3, 4, 5).unwrap()).unwrap();
        assert_eq!((crop.width(), crop.height()), (4, 5));
        // top-left pixel of the crop is (x=2, y=3) in the source
        assert_eq!(&crop.data()[0..2], &[2, 3]);
    }

    #[test]
    fn test_crop_clamps_to_frame() {
        let frame = gradient_frame(10, 10);
        let crop = frame.crop(&BoundingBox::new(7, 8, 6, 6).unwrap()).unwrap();
        assert_eq!((crop.width(), crop.height()), (3, 2));
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        let frame = gradient_frame(10, 10);
        assert!(frame.crop(&BoundingBox::new(20, 20, 5, 5).unwrap()).is_none());
    }
}
