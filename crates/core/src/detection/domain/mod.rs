pub mod face_detector;
pub mod identity_matcher;
