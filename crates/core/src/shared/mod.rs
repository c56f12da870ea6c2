pub mod bounding_box;
pub mod constants;
pub mod frame;
pub mod item_failure;
