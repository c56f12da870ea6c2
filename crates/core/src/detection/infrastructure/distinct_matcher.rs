use crate::detection::domain::identity_matcher::{FaceOccurrence, IdentityMatcher};

/// Treats every detection as a different person.
///
/// The fallback when no similarity model is configured: each detected
/// face gets its own identity group instead of being guessed into one.
pub struct DistinctMatcher;

impl IdentityMatcher for DistinctMatcher {
    fn same_identity(&self, _a: &FaceOccurrence, _b: &FaceOccurrence) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::face_identity::FaceIdentity;
    use crate::shared::bounding_box::BoundingBox;
    use std::path::Path;

    #[test]
    fn test_identical_occurrences_are_still_distinct() {
        let face = FaceIdentity::mint(Path::new("a.jpg"), 0, BoundingBox::new(0, 0, 10, 10).unwrap());
        let occurrence = FaceOccurrence {
            image: "a.jpg".into(),
            face,
            signature: None,
        };
        assert!(!DistinctMatcher.same_identity(&occurrence, &occurrence));
    }
}
