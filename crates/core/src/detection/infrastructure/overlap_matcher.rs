use crate::detection::domain::identity_matcher::{FaceOccurrence, IdentityMatcher};
use crate::detection::infrastructure::math::bbox_iou;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Which pairs of photos an [`OverlapMatcher`] compares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapScope {
    /// Only boxes from the same photo, collapsing duplicate detections.
    SameImage,
    /// Boxes from any photo, for series shot from a fixed camera position.
    AnyImage,
}

/// Geometric matcher: two boxes are one person when their IoU reaches the threshold.
pub struct OverlapMatcher {
    threshold: f64,
    scope: OverlapScope,
}

impl OverlapMatcher {
    pub fn new(threshold: f64, scope: OverlapScope) -> Self {
        Self { threshold, scope }
    }
}

impl IdentityMatcher for OverlapMatcher {
    fn same_identity(&self, a: &FaceOccurrence, b: &FaceOccurrence) -> bool {
        if self.scope == OverlapScope::SameImage && a.image != b.image {
            return false;
        }
        bbox_iou(&a.face.bbox.corners(), &b.face.bbox.corners()) >= self.threshold
    }
}
