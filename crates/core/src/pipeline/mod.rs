pub mod image_feed;
pub mod infrastructure;
pub mod orchestrator;
pub mod pipeline_logger;
