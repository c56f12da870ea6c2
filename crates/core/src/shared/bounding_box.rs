use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundingBoxError {
    #[error("bounding box must have positive size, got {width}x{height}")]
    EmptyBox { width: u32, height: u32 },
    #[error("bounding box extends past u32 coordinates at ({x}, {y})")]
    Overflow { x: u32, y: u32 },
}

/// Axis-aligned face box in source-image pixel coordinates.
///
/// Components are non-negative by construction and width/height are
/// always strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self, BoundingBoxError> {
        if width == 0 || height == 0 {
            return Err(BoundingBoxError::EmptyBox { width, height });
        }
        if x.checked_add(width).is_none() || y.checked_add(height).is_none() {
            return Err(BoundingBoxError::Overflow { x, y });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Builds a box from floating-point corners as produced by detectors,
    /// clipped to a `frame_w` x `frame_h` image.
    ///
    /// Returns `None` when nothing of the box is visible.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, frame_w: u32, frame_h: u32) -> Option<Self> {
        let left = x1.max(0.0).floor();
        let top = y1.max(0.0).floor();
        let right = x2.min(frame_w as f64).ceil();
        let bottom = y2.min(frame_h as f64).ceil();
        if !(right > left && bottom > top) {
            return None;
        }
        Self::new(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        )
        .ok()
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// The part of this box inside a `frame_w` x `frame_h` image.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<BoundingBox> {
        let right = self.right().min(frame_w);
        let bottom = self.bottom().min(frame_h);
        if self.x >= right || self.y >= bottom {
            return None;
        }
        Some(BoundingBox {
            x: self.x,
            y: self.y,
            width: right - self.x,
            height: bottom - self.y,
        })
    }

    /// Corners as `[x1, y1, x2, y2]`, the layout used by detector math.
    pub fn corners(&self) -> [f64; 4] {
        [
            self.x as f64,
            self.y as f64,
            self.right() as f64,
            self.bottom() as f64,
        ]
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {}x{})", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bbox(x: u32, y: u32, w: u32, h: u32) -> BoundingBox {
        BoundingBox::new(x, y, w, h).unwrap()
    }

    #[rstest]
    #[case::zero_width(0, 10)]
    #[case::zero_height(10, 0)]
    fn test_new_rejects_empty_box(#[case] w: u32, #[case] h: u32) {
        assert_eq!(
            BoundingBox::new(0, 0, w, h),
            Err(BoundingBoxError::EmptyBox {
                width: w,
                height: h
            })
        );
    }

    #[test]
    fn test_new_rejects_overflow() {
        assert!(BoundingBox::new(u32::MAX, 0, 2, 2).is_err());
    }

    #[test]
    fn test_corners_span_the_box() {
        assert_eq!(bbox(10, 20, 30, 40).corners(), [10.0, 20.0, 40.0, 60.0]);
    }

    // ── Clamping ─────────────────────────────────────────────────────

    #[test]
    fn test_clamp_inside_is_unchanged() {
        let b = bbox(10, 10, 20, 20);
        assert_eq!(b.clamp_to(100, 100), Some(b));
    }

    #[test]
    fn test_clamp_trims_right_and_bottom() {
        assert_eq!(bbox(90, 95, 20, 20).clamp_to(100, 100), Some(bbox(90, 95, 10, 5)));
    }

    #[test]
    fn test_clamp_fully_outside_is_none() {
        assert_eq!(bbox(100, 0, 10, 10).clamp_to(100, 100), None);
    }

    #[test]
    fn test_from_corners_clips_negative_origin() {
        let b = BoundingBox::from_corners(-10.0, -5.0, 30.0, 40.0, 100, 100).unwrap();
        assert_eq!(b, bbox(0, 0, 30, 40));
    }

    #[test]
    fn test_from_corners_degenerate_is_none() {
        assert!(BoundingBox::from_corners(50.0, 50.0, 50.0, 80.0, 100, 100).is_none());
        assert!(BoundingBox::from_corners(150.0, 0.0, 180.0, 10.0, 100, 100).is_none());
    }
}
