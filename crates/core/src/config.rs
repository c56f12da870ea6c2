//! Run configuration and the closed enumerations it is built from.
//!
//! Every enumeration rejects unknown names when parsed, so a bad value
//! fails the run before any photo is touched.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::DEFAULT_TARGET_WIDTH;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown {kind} '{value}', expected one of: {expected}")]
    UnknownValue {
        kind: &'static str,
        value: String,
        expected: String,
    },
    #[error("'{0}' is a raw input format and cannot be a conversion target")]
    RawTarget(ImageFormat),
    #[error("input folder not found: {0}")]
    MissingInputFolder(PathBuf),
    #[error("target width must be positive")]
    ZeroTargetWidth,
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn unknown<T: std::fmt::Display>(kind: &'static str, value: &str, all: &[T]) -> ConfigError {
    ConfigError::UnknownValue {
        kind,
        value: value.to_string(),
        expected: all
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Image formats the pipeline reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Jpeg,
    Png,
    Bmp,
    Gif,
    Tiff,
    Webp,
    Nef,
}

impl ImageFormat {
    pub const ALL: &[ImageFormat] = &[
        ImageFormat::Jpg,
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Bmp,
        ImageFormat::Gif,
        ImageFormat::Tiff,
        ImageFormat::Webp,
        ImageFormat::Nef,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Webp => "webp",
            ImageFormat::Nef => "nef",
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, ImageFormat::Nef)
    }

    /// Case-insensitive lookup by file extension.
    pub fn from_path(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::ALL.iter().copied().find(|f| f.extension() == ext)
    }

    /// Encoder used when writing this format, `None` for raw formats.
    pub fn encoder_format(&self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpg | ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Bmp => Some(image::ImageFormat::Bmp),
            ImageFormat::Gif => Some(image::ImageFormat::Gif),
            ImageFormat::Tiff => Some(image::ImageFormat::Tiff),
            ImageFormat::Webp => Some(image::ImageFormat::WebP),
            ImageFormat::Nef => None,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().trim_start_matches('.').to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| unknown("image format", s, Self::ALL))
    }
}

/// Face detection backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    /// SeetaFace funnel cascade (rustface), CPU only.
    Classical,
    /// YOLO face model on ONNX Runtime.
    Neural,
}

impl DetectorBackend {
    pub const ALL: &[DetectorBackend] = &[DetectorBackend::Classical, DetectorBackend::Neural];
}

impl std::fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorBackend::Classical => write!(f, "classical"),
            DetectorBackend::Neural => write!(f, "neural"),
        }
    }
}

impl FromStr for DetectorBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classical" => Ok(DetectorBackend::Classical),
            "neural" => Ok(DetectorBackend::Neural),
            _ => Err(unknown("detector backend", s, Self::ALL)),
        }
    }
}

/// Strategy deciding whether two detections are the same person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    Distinct,
    Overlap,
    Position,
    Histogram,
    Embedding,
}

impl MatcherKind {
    pub const ALL: &[MatcherKind] = &[
        MatcherKind::Distinct,
        MatcherKind::Overlap,
        MatcherKind::Position,
        MatcherKind::Histogram,
        MatcherKind::Embedding,
    ];
}

impl std::fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MatcherKind::Distinct => "distinct",
            MatcherKind::Overlap => "overlap",
            MatcherKind::Position => "position",
            MatcherKind::Histogram => "histogram",
            MatcherKind::Embedding => "embedding",
        };
        f.write_str(name)
    }
}

impl FromStr for MatcherKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.to_string() == lower)
            .ok_or_else(|| unknown("matcher", s, Self::ALL))
    }
}

/// Settings for one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub target_format: ImageFormat,
    pub detector: DetectorBackend,
    pub matcher: MatcherKind,
    /// Matcher-specific similarity threshold; `None` uses the matcher default.
    pub match_threshold: Option<f64>,
    /// Minimum detector confidence (neural backend).
    pub confidence: f64,
    pub target_width: u32,
    /// Normalize the input folder into `converted-images` before detection.
    pub convert: bool,
    /// Decode photos on a reader thread while detection runs.
    pub threaded: bool,
    /// Directory searched for model files before the user cache.
    pub model_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_format: ImageFormat::Jpg,
            detector: DetectorBackend::Classical,
            matcher: MatcherKind::Distinct,
            match_threshold: None,
            confidence: 0.25,
            target_width: DEFAULT_TARGET_WIDTH,
            convert: true,
            threaded: false,
            model_dir: None,
        }
    }
}

impl RunConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_format.is_raw() {
            return Err(ConfigError::RawTarget(self.target_format));
        }
        if self.target_width == 0 {
            return Err(ConfigError::ZeroTargetWidth);
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::OutOfRange {
                name: "confidence",
                min: 0.0,
                max: 1.0,
                value: self.confidence,
            });
        }
        if let Some(t) = self.match_threshold {
            if !(-1.0..=1.0).contains(&t) {
                return Err(ConfigError::OutOfRange {
                    name: "match threshold",
                    min: -1.0,
                    max: 1.0,
                    value: t,
                });
            }
        }
        Ok(())
    }
}
