use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use facetag_core::config::{DetectorBackend, ImageFormat, MatcherKind, RunConfig};
use facetag_core::identity::face_identity::ContactMethod;
use facetag_core::manifest::face_index::FaceIndex;
use facetag_core::pipeline::orchestrator::{Orchestrator, RunReport};
use facetag_core::pipeline::pipeline_logger::StdoutPipelineLogger;

/// Groups the faces found in a folder of photos and extracts one crop per person.
#[derive(Parser)]
#[command(name = "facetag")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert, detect and extract faces for one photo folder.
    Run(RunArgs),
    /// Set the name and/or contact method of a face in a face index.
    Tag(TagArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Folder containing the photos.
    folder: PathBuf,

    /// JSON run configuration; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target image format: jpg, jpeg, png, bmp, gif, tiff or webp.
    #[arg(long)]
    format: Option<ImageFormat>,

    /// Face detector: classical or neural.
    #[arg(long)]
    detector: Option<DetectorBackend>,

    /// Identity matcher: distinct, overlap, position, histogram or embedding.
    #[arg(long)]
    matcher: Option<MatcherKind>,

    /// Matcher similarity threshold (matcher default when omitted).
    #[arg(long)]
    threshold: Option<f64>,

    /// Detector confidence threshold (0.0-1.0, neural detector only).
    #[arg(long)]
    confidence: Option<f64>,

    /// Width of converted photos in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Scan the folder as-is instead of converting it first.
    #[arg(long)]
    no_convert: bool,

    /// Decode photos on a background thread while detecting.
    #[arg(long)]
    threaded: bool,

    /// Directory searched for model files before downloading.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

#[derive(Args)]
struct TagArgs {
    /// Face index written by `run` (faces.json).
    index: PathBuf,

    /// Face id to tag.
    id: Uuid,

    /// Display name.
    #[arg(long)]
    name: Option<String>,

    /// Contact method: email, phone or social_media.
    #[arg(long)]
    contact: Option<ContactMethod>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Run(args) => run_folder(args),
        Command::Tag(args) => tag_face(&args),
    }
}

fn run_folder(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    log::info!(
        "Detector: {}, matcher: {}, target: {} at {}px",
        config.detector,
        config.matcher,
        config.target_format,
        config.target_width
    );

    let report = Orchestrator::from_config(&args.folder, config)?
        .with_logger(Box::new(StdoutPipelineLogger::default()))
        .run()?;
    print_report(&report);
    Ok(())
}

/// Config file values first, then flags, then a single validation pass.
fn build_config(args: &RunArgs) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(format) = args.format {
        config.target_format = format;
    }
    if let Some(detector) = args.detector {
        config.detector = detector;
    }
    if let Some(matcher) = args.matcher {
        config.matcher = matcher;
    }
    if args.threshold.is_some() {
        config.match_threshold = args.threshold;
    }
    if let Some(confidence) = args.confidence {
        config.confidence = confidence;
    }
    if let Some(width) = args.width {
        config.target_width = width;
    }
    if args.no_convert {
        config.convert = false;
    }
    if args.threaded {
        config.threaded = true;
    }
    if args.model_dir.is_some() {
        config.model_dir = args.model_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn print_report(report: &RunReport) {
    log::info!(
        "{} face(s) from {} image(s), {} crop(s), {} manifest row(s)",
        report.groups.len(),
        report.images_scanned,
        report.crops.len(),
        report.manifest_rows
    );
    log::info!("Manifest: {}", report.manifest_path.display());
    log::info!("Face index: {}", report.index_path.display());
    for failure in &report.failures {
        log::warn!("{} failed while {}: {}", failure.item, failure.stage, failure.reason);
    }
}

fn tag_face(args: &TagArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.name.is_none() && args.contact.is_none() {
        return Err("Nothing to tag: pass --name and/or --contact".into());
    }
    let entry = tag_index(&args.index, args.id, args.name.as_deref(), args.contact)?;
    log::info!("Tagged {} in {}", entry, args.index.display());
    Ok(())
}

/// Updates one face in the index file and returns a description of it.
fn tag_index(
    index_path: &Path,
    id: Uuid,
    name: Option<&str>,
    contact: Option<ContactMethod>,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut index = FaceIndex::load(index_path)?;
    let entry = index.tag(id, name, contact)?;
    let description = match (&entry.identity.name, entry.identity.contact_method) {
        (Some(name), Some(contact)) => format!("{id} as {name} ({contact})"),
        (Some(name), None) => format!("{id} as {name}"),
        (None, Some(contact)) => format!("{id} ({contact})"),
        (None, None) => id.to_string(),
    };
    index.save(index_path)?;
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facetag_core::manifest::face_index::FaceIndexEntry;
    use facetag_core::identity::face_identity::FaceIdentity;
    use facetag_core::shared::bounding_box::BoundingBox;

    fn parse_run(args: &[&str]) -> RunArgs {
        let mut argv = vec!["facetag", "run"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args,
            Command::Tag(_) => panic!("expected run"),
        }
    }

    fn write_index(dir: &Path) -> (PathBuf, Uuid) {
        let identity = FaceIdentity::mint(
            Path::new("a.jpg"),
            0,
            BoundingBox::new(1, 2, 3, 4).unwrap(),
        );
        let id = identity.id;
        let index = FaceIndex {
            faces: vec![FaceIndexEntry {
                identity,
                crop_path: None,
                source_images: vec![PathBuf::from("a.jpg")],
            }],
        };
        let path = dir.join("faces.json");
        index.save(&path).unwrap();
        (path, id)
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse_run(&[
            "photos",
            "--format",
            "png",
            "--matcher",
            "position",
            "--width",
            "640",
            "--no-convert",
            "--threaded",
        ]);

        let config = build_config(&args).unwrap();

        assert_eq!(config.target_format, ImageFormat::Png);
        assert_eq!(config.matcher, MatcherKind::Position);
        assert_eq!(config.target_width, 640);
        assert!(!config.convert);
        assert!(config.threaded);
        assert_eq!(config.detector, DetectorBackend::Classical);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"matcher": "histogram", "target_width": 1024}"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let args = parse_run(&["photos", "--config", &path_arg, "--width", "320"]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.matcher, MatcherKind::Histogram);
        assert_eq!(config.target_width, 320);
    }

    #[test]
    fn test_unknown_format_is_rejected_by_parser() {
        let result = Cli::try_parse_from(["facetag", "run", "photos", "--format", "heic"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_raw_target_fails_validation() {
        let args = parse_run(&["photos", "--format", "nef"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_tag_updates_index_file() {
        let dir = tempfile::tempdir().unwrap();
        let (path, id) = write_index(dir.path());

        let description = tag_index(&path, id, Some("Ada"), Some(ContactMethod::Email)).unwrap();

        assert_eq!(description, format!("{id} as Ada (email)"));
        let index = FaceIndex::load(&path).unwrap();
        let entry = index.get(id).unwrap();
        assert_eq!(entry.identity.name.as_deref(), Some("Ada"));
        assert_eq!(entry.identity.contact_method, Some(ContactMethod::Email));
    }

    #[test]
    fn test_tag_unknown_id_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let (path, _) = write_index(dir.path());

        assert!(tag_index(&path, Uuid::nil(), Some("Ada"), None).is_err());
    }
}
