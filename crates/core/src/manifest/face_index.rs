use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::identity::face_identity::{ContactMethod, FaceIdentity};
use crate::identity::face_registry::IdentityGroup;

#[derive(Error, Debug)]
pub enum FaceIndexError {
    #[error("failed to read face index {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write face index {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid face index {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no face with id {0}")]
    UnknownFace(Uuid),
}

/// One identity group as stored in `faces.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceIndexEntry {
    #[serde(flatten)]
    pub identity: FaceIdentity,
    /// Extracted crop, absent when extraction failed.
    pub crop_path: Option<PathBuf>,
    pub source_images: Vec<PathBuf>,
}

/// Persisted summary of a run's identities, used for tagging after the fact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceIndex {
    pub faces: Vec<FaceIndexEntry>,
}

impl FaceIndex {
    pub fn push(&mut self, group: &IdentityGroup, crop_path: Option<PathBuf>) {
        self.faces.push(FaceIndexEntry {
            identity: group.identity().clone(),
            crop_path,
            source_images: group.images.clone(),
        });
    }

    pub fn get(&self, id: Uuid) -> Option<&FaceIndexEntry> {
        self.faces.iter().find(|f| f.identity.id == id)
    }

    /// Sets the display name and/or contact method of one face.
    pub fn tag(
        &mut self,
        id: Uuid,
        name: Option<&str>,
        contact: Option<ContactMethod>,
    ) -> Result<&FaceIndexEntry, FaceIndexError> {
        let entry = self
            .faces
            .iter_mut()
            .find(|f| f.identity.id == id)
            .ok_or(FaceIndexError::UnknownFace(id))?;
        if let Some(name) = name {
            entry.identity.set_name(name);
        }
        if let Some(contact) = contact {
            entry.identity.set_contact_method(contact);
        }
        Ok(entry)
    }

    pub fn load(path: &Path) -> Result<Self, FaceIndexError> {
        let json = std::fs::read_to_string(path).map_err(|source| FaceIndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| FaceIndexError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), FaceIndexError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| FaceIndexError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| FaceIndexError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
