use std::path::PathBuf;

use crate::identity::face_identity::FaceIdentity;
use crate::shared::frame::Frame;

/// A face as seen in one photo, as handed to an [`IdentityMatcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct FaceOccurrence {
    pub image: PathBuf,
    pub face: FaceIdentity,
    /// Appearance features computed by [`IdentityMatcher::signature`], if any.
    pub signature: Option<Vec<f32>>,
}

/// Domain interface deciding whether two detections show the same person.
pub trait IdentityMatcher: Send {
    /// Computes appearance features for a face crop.
    ///
    /// Geometric matchers need no pixels and keep the default.
    fn signature(&self, _crop: &Frame) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
        Ok(None)
    }

    fn same_identity(&self, a: &FaceOccurrence, b: &FaceOccurrence) -> bool;
}
