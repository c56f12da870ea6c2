pub mod csv_manifest;
pub mod face_index;
