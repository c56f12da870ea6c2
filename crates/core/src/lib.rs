pub mod config;
pub mod conversion;
pub mod detection;
pub mod extraction;
pub mod identity;
pub mod imaging;
pub mod manifest;
pub mod pipeline;
pub mod shared;
