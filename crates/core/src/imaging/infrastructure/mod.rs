pub mod ffmpeg_image_reader;
pub mod folder_scanner;
pub mod image_file_reader;
pub mod image_file_writer;
