use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::shared::constants::MANIFEST_HEADER;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest {path}: invalid face id '{value}'")]
    InvalidId { path: PathBuf, value: String },
    #[error("manifest {path}: unexpected header {found:?}")]
    Header { path: PathBuf, found: Vec<String> },
}

/// One manifest line: a face identity and the crop file showing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    pub face_id: Uuid,
    pub crop_path: PathBuf,
}

/// Streams manifest rows to a CSV file with a `Face ID,Image Path` header.
pub struct ManifestWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl ManifestWriter {
    /// Creates (or truncates) the manifest and writes the header.
    pub fn create(path: &Path) -> Result<Self, ManifestError> {
        let csv_err = |source| ManifestError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
        writer.write_record(MANIFEST_HEADER).map_err(csv_err)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn append(&mut self, row: &ManifestRow) -> Result<(), ManifestError> {
        let id = row.face_id.to_string();
        let crop = row.crop_path.to_string_lossy();
        self.writer
            .write_record([id.as_str(), &*crop])
            .map_err(|source| ManifestError::Csv {
                path: self.path.clone(),
                source,
            })?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes and closes the file, returning the number of rows written.
    pub fn finish(mut self) -> Result<usize, ManifestError> {
        self.writer.flush().map_err(|source| ManifestError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.rows)
    }
}

/// Reads a manifest back, checking the header.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestRow>, ManifestError> {
    let csv_err = |source| ManifestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;

    let header = reader.headers().map_err(csv_err)?;
    if header.iter().ne(MANIFEST_HEADER) {
        return Err(ManifestError::Header {
            path: path.to_path_buf(),
            found: header.iter().map(str::to_string).collect(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let id = record.get(0).unwrap_or_default();
        let face_id = Uuid::parse_str(id).map_err(|_| ManifestError::InvalidId {
            path: path.to_path_buf(),
            value: id.to_string(),
        })?;
        rows.push(ManifestRow {
            face_id,
            crop_path: PathBuf::from(record.get(1).unwrap_or_default()),
        });
    }
    Ok(rows)
}
