use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, SEETA_MODEL_NAME, SEETA_MODEL_URL, YOLO_MODEL_NAME,
    YOLO_MODEL_URL,
};

const APP_DIR_NAME: &str = "FaceTag";
const DOWNLOAD_BUFFER_BYTES: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// A model file the detection backends know how to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub url: &'static str,
}

pub const SEETA_MODEL: ModelSpec = ModelSpec {
    name: SEETA_MODEL_NAME,
    url: SEETA_MODEL_URL,
};

pub const YOLO_MODEL: ModelSpec = ModelSpec {
    name: YOLO_MODEL_NAME,
    url: YOLO_MODEL_URL,
};

pub const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: EMBEDDING_MODEL_NAME,
    url: EMBEDDING_MODEL_URL,
};

/// Resolve a model file, checking local locations before downloading.
///
/// Resolution order:
/// 1. User cache directory (platform-specific)
/// 2. `model_dir`, when given (pre-packaged installs, offline runs)
/// 3. Download from the model URL into the cache
pub fn resolve(spec: &ModelSpec, model_dir: Option<&Path>) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, spec, model_dir)
}

fn resolve_in(
    cache_dir: &Path,
    spec: &ModelSpec,
    model_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(spec.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = model_dir {
        let local_path = dir.join(spec.name);
        if local_path.exists() {
            return Ok(local_path);
        }
    }

    fs::create_dir_all(cache_dir).map_err(|source| ModelResolveError::CacheDir {
        path: cache_dir.to_path_buf(),
        source,
    })?;
    log::info!("Downloading {} from {}", spec.name, spec.url);
    download(spec.url, &cached_path)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceTag/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceTag/models/` or `~/.cache/FaceTag/models/`
/// - Windows: `%LOCALAPPDATA%/FaceTag/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = download_to(url, dest, &temp_path);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_to(url: &str, dest: &Path, temp_path: &Path) -> Result<(), ModelResolveError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ModelResolveError::Write { path, source }
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|source| ModelResolveError::Download {
            url: url.to_string(),
            source,
        })?;

    let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;

    // Stream in chunks; the embedding model is well over 100MB.
    let mut buf = vec![0u8; DOWNLOAD_BUFFER_BYTES];
    let mut downloaded: u64 = 0;
    loop {
        let n = response.read(&mut buf).map_err(write_err(temp_path))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err(temp_path))?;
        downloaded += n as u64;
    }
    file.flush().map_err(write_err(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_err(dest))?;
    log::debug!("Wrote {downloaded} bytes to {}", dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const UNREACHABLE: ModelSpec = ModelSpec {
        name: "test_model.onnx",
        url: "http://invalid.nonexistent.example.com/model.onnx",
    };

    #[test]
    fn test_resolve_prefers_cached_file() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let local = tmp.path().join("local");
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(&local).unwrap();
        fs::write(cache.join(UNREACHABLE.name), b"cached").unwrap();
        fs::write(local.join(UNREACHABLE.name), b"local").unwrap();

        let path = resolve_in(&cache, &UNREACHABLE, Some(&local)).unwrap();

        assert_eq!(path, cache.join(UNREACHABLE.name));
    }

    #[test]
    fn test_resolve_falls_back_to_model_dir() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let local = tmp.path().join("local");
        fs::create_dir_all(&local).unwrap();
        fs::write(local.join(UNREACHABLE.name), b"local").unwrap();

        let path = resolve_in(&cache, &UNREACHABLE, Some(&local)).unwrap();

        assert_eq!(path, local.join(UNREACHABLE.name));
    }

    #[test]
    fn test_resolve_download_failure_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");

        let result = resolve_in(&cache, &UNREACHABLE, None);

        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
        assert!(!cache.join(UNREACHABLE.name).exists());
        assert!(!cache.join("test_model.part").exists());
    }

    #[test]
    fn test_model_cache_dir_is_app_scoped() {
        let path = model_cache_dir().unwrap();
        assert!(path.ends_with(Path::new(APP_DIR_NAME).join("models")));
    }
}
