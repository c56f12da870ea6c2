use std::path::Path;

use crate::config::{DetectorBackend, MatcherKind};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::identity_matcher::IdentityMatcher;

use super::distinct_matcher::DistinctMatcher;
use super::embedding_matcher::{self, EmbeddingMatcher};
use super::histogram_matcher::{self, HistogramMatcher};
use super::model_resolver::{self, EMBEDDING_MODEL, SEETA_MODEL, YOLO_MODEL};
use super::onnx_yolo_detector::OnnxYoloDetector;
use super::overlap_matcher::{self, OverlapMatcher, OverlapScope};
use super::rustface_detector::RustfaceDetector;

/// Builds the configured detection backend, resolving its model file first.
pub fn create_detector(
    backend: DetectorBackend,
    confidence: f64,
    model_dir: Option<&Path>,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    match backend {
        DetectorBackend::Classical => {
            let path = model_resolver::resolve(&SEETA_MODEL, model_dir)?;
            log::info!("Using classical detector ({})", path.display());
            Ok(Box::new(RustfaceDetector::new(&path)?))
        }
        DetectorBackend::Neural => {
            let path = model_resolver::resolve(&YOLO_MODEL, model_dir)?;
            log::info!("Using neural detector ({}, confidence={confidence})", path.display());
            Ok(Box::new(OnnxYoloDetector::new(&path, confidence)?))
        }
    }
}

/// Builds the configured identity matcher. `threshold` overrides the kind's default.
pub fn create_matcher(
    kind: MatcherKind,
    threshold: Option<f64>,
    model_dir: Option<&Path>,
) -> Result<Box<dyn IdentityMatcher>, Box<dyn std::error::Error>> {
    let matcher: Box<dyn IdentityMatcher> = match kind {
        MatcherKind::Distinct => Box::new(DistinctMatcher),
        MatcherKind::Overlap => Box::new(OverlapMatcher::new(
            threshold.unwrap_or(overlap_matcher::DEFAULT_THRESHOLD),
            OverlapScope::SameImage,
        )),
        MatcherKind::Position => Box::new(OverlapMatcher::new(
            threshold.unwrap_or(overlap_matcher::DEFAULT_THRESHOLD),
            OverlapScope::AnyImage,
        )),
        MatcherKind::Histogram => Box::new(HistogramMatcher::new(
            threshold.unwrap_or(histogram_matcher::DEFAULT_THRESHOLD),
        )),
        MatcherKind::Embedding => {
            let path = model_resolver::resolve(&EMBEDDING_MODEL, model_dir)?;
            Box::new(EmbeddingMatcher::new(
                &path,
                threshold.unwrap_or(embedding_matcher::DEFAULT_THRESHOLD),
            )?)
        }
    };
    log::info!("Using {kind} identity matcher");
    Ok(matcher)
}
