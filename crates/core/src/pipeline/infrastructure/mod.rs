pub mod threaded_image_feed;
