pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

pub const SEETA_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const SEETA_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";

/// Width every non-raw photo is resized to during conversion.
pub const DEFAULT_TARGET_WIDTH: u32 = 800;

pub const CONVERTED_DIR_NAME: &str = "converted-images";
pub const EXTRACTED_DIR_NAME: &str = "extracted_faces";
pub const MANIFEST_FILE_NAME: &str = "face_data.csv";
pub const FACE_INDEX_FILE_NAME: &str = "faces.json";

pub const MANIFEST_HEADER: [&str; 2] = ["Face ID", "Image Path"];

pub const CROP_JPEG_QUALITY: u8 = 90;
