use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{ConfigError, RunConfig};
use crate::conversion::image_converter::ImageConverter;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::identity_matcher::IdentityMatcher;
use crate::detection::infrastructure::detector_factory::{create_detector, create_matcher};
use crate::extraction::face_extractor::FaceExtractor;
use crate::identity::face_registry::{Detection, FaceRegistry, IdentityGroup};
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::infrastructure::folder_scanner::list_images;
use crate::imaging::infrastructure::image_file_reader::ImageFileReader;
use crate::manifest::csv_manifest::{ManifestRow, ManifestWriter};
use crate::manifest::face_index::FaceIndex;
use crate::pipeline::image_feed::{ImageFeed, SequentialImageFeed};
use crate::pipeline::infrastructure::threaded_image_feed::ThreadedImageFeed;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{EXTRACTED_DIR_NAME, FACE_INDEX_FILE_NAME, MANIFEST_FILE_NAME};
use crate::shared::frame::Frame;
use crate::shared::item_failure::{ItemFailure, Stage};

pub const COMPLETION_MESSAGE: &str = "Face detection and extraction completed. CSV file created.";

/// Lifecycle of one orchestration run. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Idle,
    Converting,
    Detecting,
    Extracting,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Converting => "converting",
            RunState::Detecting => "detecting",
            RunState::Extracting => "extracting",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    /// Folder that was scanned for faces and that holds the outputs.
    pub working_dir: PathBuf,
    pub images_scanned: usize,
    pub groups: Vec<IdentityGroup>,
    /// One crop per successfully extracted group, in group order.
    pub crops: Vec<PathBuf>,
    pub manifest_path: PathBuf,
    pub manifest_rows: usize,
    pub index_path: PathBuf,
    pub failures: Vec<ItemFailure>,
}

/// Drives convert → detect → extract over one folder of photos.
///
/// Per-photo and per-group failures are recorded in the report and never
/// stop the run. Only configuration problems and failures to create the
/// output files are returned as errors.
pub struct Orchestrator {
    input_folder: PathBuf,
    config: RunConfig,
    state: RunState,
    converter: ImageConverter,
    reader: Arc<dyn ImageReader>,
    detector: Box<dyn FaceDetector>,
    registry: FaceRegistry,
    extractor: FaceExtractor,
    feed: Box<dyn ImageFeed>,
    logger: Box<dyn PipelineLogger>,
}

impl Orchestrator {
    pub fn new(
        input_folder: &Path,
        config: RunConfig,
        detector: Box<dyn FaceDetector>,
        matcher: Box<dyn IdentityMatcher>,
    ) -> Self {
        let feed: Box<dyn ImageFeed> = if config.threaded {
            Box::new(ThreadedImageFeed::new())
        } else {
            Box::new(SequentialImageFeed)
        };
        Self {
            input_folder: input_folder.to_path_buf(),
            converter: ImageConverter::new(config.target_format, config.target_width),
            config,
            state: RunState::Idle,
            reader: Arc::new(ImageFileReader::new()),
            detector,
            registry: FaceRegistry::new(matcher),
            extractor: FaceExtractor::new(),
            feed,
            logger: Box::new(NullPipelineLogger),
        }
    }

    /// Validates `config` and the input folder, then builds the detector
    /// and matcher it names. Model files are only resolved once both pass.
    pub fn from_config(
        input_folder: &Path,
        config: RunConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        if !input_folder.is_dir() {
            return Err(ConfigError::MissingInputFolder(input_folder.to_path_buf()).into());
        }
        let model_dir = config.model_dir.as_deref();
        let detector = create_detector(config.detector, config.confidence, model_dir)?;
        let matcher = create_matcher(config.matcher, config.match_threshold, model_dir)?;
        Ok(Self::new(input_folder, config, detector, matcher))
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs every stage to completion. The registry lives only for this call.
    pub fn run(mut self) -> Result<RunReport, Box<dyn std::error::Error>> {
        self.config.validate()?;
        if !self.input_folder.is_dir() {
            return Err(ConfigError::MissingInputFolder(self.input_folder.clone()).into());
        }
        let mut failures = Vec::new();

        self.enter(RunState::Converting);
        let working_dir = if self.config.convert {
            let start = Instant::now();
            let report = self.converter.convert_folder(&self.input_folder)?;
            self.logger.timing("convert", elapsed_ms(start));
            failures.extend(report.failed);
            ImageConverter::output_dir(&self.input_folder)
        } else {
            log::info!("Conversion disabled, scanning {}", self.input_folder.display());
            self.input_folder.clone()
        };

        self.enter(RunState::Detecting);
        let target_format = self.config.target_format;
        let images = list_images(&working_dir, |f| f == target_format)?;
        let images_scanned = images.len();
        self.detect_faces(images, &mut failures)?;
        log::info!(
            "Found {} distinct face(s) in {images_scanned} image(s)",
            self.registry.len()
        );

        self.enter(RunState::Extracting);
        let manifest_path = working_dir.join(MANIFEST_FILE_NAME);
        let index_path = working_dir.join(FACE_INDEX_FILE_NAME);
        self.restore_tags(&index_path);
        let mut manifest = ManifestWriter::create(&manifest_path)?;
        let mut index = FaceIndex::default();
        let crops = self.extract_faces(&working_dir, &mut manifest, &mut index, &mut failures)?;

        self.enter(RunState::Done);
        let manifest_rows = manifest.finish()?;
        index.save(&index_path)?;
        if !failures.is_empty() {
            log::warn!("{} item(s) failed during the run", failures.len());
        }
        log::info!("{COMPLETION_MESSAGE}");
        self.logger.summary();

        Ok(RunReport {
            state: self.state,
            working_dir,
            images_scanned,
            groups: self.registry.into_groups(),
            crops,
            manifest_path,
            manifest_rows,
            index_path,
            failures,
        })
    }

    /// Carries names and contact methods from an earlier run's index over
    /// to groups with the same id, so tagged crops keep their names.
    fn restore_tags(&mut self, index_path: &Path) {
        if !index_path.is_file() {
            return;
        }
        let previous = match FaceIndex::load(index_path) {
            Ok(index) => index,
            Err(e) => {
                log::warn!("Ignoring unreadable face index: {e}");
                return;
            }
        };

        let mut restored = 0;
        for entry in &previous.faces {
            let face = &entry.identity;
            if face.name.is_none() && face.contact_method.is_none() {
                continue;
            }
            if self
                .registry
                .tag(face.id, face.name.as_deref(), face.contact_method)
            {
                restored += 1;
            }
        }
        if restored > 0 {
            log::info!("Restored tags for {restored} face(s) from {}", index_path.display());
        }
    }

    fn enter(&mut self, next: RunState) {
        log::info!("Run state: {} -> {next}", self.state);
        self.state = next;
    }

    fn detect_faces(
        &mut self,
        images: Vec<PathBuf>,
        failures: &mut Vec<ItemFailure>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let total = images.len();
        let mut current = 0;
        let detector = &mut self.detector;
        let registry = &mut self.registry;
        let logger = &mut self.logger;

        self.feed
            .feed(Arc::clone(&self.reader), images, &mut |path, decoded| {
                current += 1;
                logger.progress(current, total);

                let start = Instant::now();
                let frame = match decoded {
                    Ok(frame) => frame,
                    Err(e) => {
                        let failure = ItemFailure::new(Stage::Detecting, path.display(), e.as_ref());
                        log::warn!("Failed to read {}: {}", path.display(), failure.reason);
                        failures.push(failure);
                        return;
                    }
                };

                detector.begin_image(path);
                let boxes = match detector.detect(&frame) {
                    Ok(boxes) => boxes,
                    Err(e) => {
                        let failure = ItemFailure::new(Stage::Detecting, path.display(), e.as_ref());
                        log::warn!("Face detection failed on {}: {}", path.display(), failure.reason);
                        failures.push(failure);
                        return;
                    }
                };
                log::debug!("{} face(s) in {}", boxes.len(), path.display());
                logger.metric("faces", boxes.len() as f64);

                let detections = boxes
                    .into_iter()
                    .map(|bbox| Detection {
                        bbox,
                        signature: signature_for(registry.matcher(), &frame, path, bbox, failures),
                    })
                    .collect();
                let ambiguous = registry.record(path, detections);
                if ambiguous > 0 {
                    logger.metric("ambiguous_matches", ambiguous as f64);
                }
                logger.timing("detect", elapsed_ms(start));
            })
    }

    fn extract_faces(
        &mut self,
        working_dir: &Path,
        manifest: &mut ManifestWriter,
        index: &mut FaceIndex,
        failures: &mut Vec<ItemFailure>,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let faces_dir = working_dir.join(EXTRACTED_DIR_NAME);
        let mut crops = Vec::with_capacity(self.registry.len());

        for group in self.registry.groups() {
            let start = Instant::now();
            match extract_group(self.reader.as_ref(), &self.extractor, group, &faces_dir) {
                Ok(crop) => {
                    for _ in &group.images {
                        manifest.append(&ManifestRow {
                            face_id: group.id(),
                            crop_path: crop.clone(),
                        })?;
                    }
                    index.push(group, Some(crop.clone()));
                    crops.push(crop);
                }
                Err(e) => {
                    let failure = ItemFailure::new(Stage::Extracting, group.id(), e.as_ref());
                    log::warn!("Skipping face {}: {}", group.id(), failure.reason);
                    failures.push(failure);
                    index.push(group, None);
                }
            }
            self.logger.timing("extract", elapsed_ms(start));
        }
        Ok(crops)
    }
}

/// Computes the matcher's signature for one face, or `None` if it has none.
///
/// A failure is recorded and leaves the face without a signature, so it
/// only ever forms its own group.
fn signature_for(
    matcher: &dyn IdentityMatcher,
    frame: &Frame,
    path: &Path,
    bbox: BoundingBox,
    failures: &mut Vec<ItemFailure>,
) -> Option<Vec<f32>> {
    let crop = frame.crop(&bbox)?;
    match matcher.signature(&crop) {
        Ok(signature) => signature,
        Err(e) => {
            let failure = ItemFailure::new(Stage::Detecting, path.display(), e.as_ref());
            log::warn!("No signature for face {bbox} in {}: {}", path.display(), failure.reason);
            failures.push(failure);
            None
        }
    }
}

/// Crops a group's canonical face from its first-seen photo.
fn extract_group(
    reader: &dyn ImageReader,
    extractor: &FaceExtractor,
    group: &IdentityGroup,
    faces_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let canonical = &group.canonical;
    let frame = reader.read(&canonical.image)?;
    Ok(extractor.extract(&frame, &canonical.face.bbox, &canonical.face, faces_dir)?)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
