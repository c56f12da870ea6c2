pub mod detector_factory;
pub mod distinct_matcher;
pub mod embedding_matcher;
pub mod execution_provider;
pub mod fixed_face_detector;
pub mod histogram_matcher;
pub mod math;
pub mod model_resolver;
pub mod onnx_yolo_detector;
pub mod overlap_matcher;
pub mod rustface_detector;
