pub mod face_identity;
pub mod face_registry;
