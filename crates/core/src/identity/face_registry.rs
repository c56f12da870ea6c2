use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::detection::domain::identity_matcher::{FaceOccurrence, IdentityMatcher};
use crate::identity::face_identity::{ContactMethod, FaceIdentity};
use crate::shared::bounding_box::BoundingBox;

/// One box reported by a detector, with the matcher's signature of its crop.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub signature: Option<Vec<f32>>,
}

impl Detection {
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            signature: None,
        }
    }
}

/// A distinct person and every photo they were found in.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityGroup {
    /// The first occurrence; later occurrences are compared against it.
    pub canonical: FaceOccurrence,
    /// Photos containing this person, duplicate-free, in first-seen order.
    pub images: Vec<PathBuf>,
}

impl IdentityGroup {
    pub fn id(&self) -> Uuid {
        self.canonical.face.id
    }

    pub fn identity(&self) -> &FaceIdentity {
        &self.canonical.face
    }

    fn add_image(&mut self, image: &Path) {
        if !self.images.iter().any(|i| i == image) {
            self.images.push(image.to_path_buf());
        }
    }
}

/// Consolidates per-photo detections into identity groups for one run.
///
/// Groups are kept in creation order and never removed.
pub struct FaceRegistry {
    matcher: Box<dyn IdentityMatcher>,
    groups: Vec<IdentityGroup>,
}

impl FaceRegistry {
    pub fn new(matcher: Box<dyn IdentityMatcher>) -> Self {
        Self {
            matcher,
            groups: Vec::new(),
        }
    }

    pub fn matcher(&self) -> &dyn IdentityMatcher {
        self.matcher.as_ref()
    }

    /// Records every detection found in `image`.
    ///
    /// Each detection joins the earliest-created group whose canonical
    /// occurrence the matcher accepts, or starts a new group. Returns how
    /// many detections matched more than one group.
    pub fn record(&mut self, image: &Path, detections: Vec<Detection>) -> usize {
        let mut ambiguous = 0;
        for (ordinal, detection) in detections.into_iter().enumerate() {
            let occurrence = FaceOccurrence {
                image: image.to_path_buf(),
                face: FaceIdentity::mint(image, ordinal, detection.bbox),
                signature: detection.signature,
            };

            let matches: Vec<usize> = self
                .groups
                .iter()
                .enumerate()
                .filter(|(_, g)| self.matcher.same_identity(&g.canonical, &occurrence))
                .map(|(i, _)| i)
                .collect();

            match matches.as_slice() {
                [] => {
                    log::debug!(
                        "New identity {} in {}",
                        occurrence.face.id,
                        image.display()
                    );
                    self.groups.push(IdentityGroup {
                        images: vec![image.to_path_buf()],
                        canonical: occurrence,
                    });
                }
                [first, rest @ ..] => {
                    if !rest.is_empty() {
                        ambiguous += 1;
                        let ids: Vec<String> = matches
                            .iter()
                            .map(|&i| self.groups[i].id().to_string())
                            .collect();
                        log::warn!(
                            "Face {} in {} matches {} identities ({}); assigning to {}",
                            ordinal,
                            image.display(),
                            matches.len(),
                            ids.join(", "),
                            self.groups[*first].id()
                        );
                    }
                    self.groups[*first].add_image(image);
                }
            }
        }
        ambiguous
    }

    pub fn groups(&self) -> &[IdentityGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, id: Uuid) -> Option<&IdentityGroup> {
        self.groups.iter().find(|g| g.id() == id)
    }

    /// Attaches a display name and contact method to a group's identity.
    ///
    /// Returns `false` when no group has that id.
    pub fn tag(&mut self, id: Uuid, name: Option<&str>, contact: Option<ContactMethod>) -> bool {
        let Some(group) = self.groups.iter_mut().find(|g| g.id() == id) else {
            return false;
        };
        if let Some(name) = name {
            group.canonical.face.set_name(name);
        }
        if let Some(contact) = contact {
            group.canonical.face.set_contact_method(contact);
        }
        true
    }

    pub fn into_groups(self) -> Vec<IdentityGroup> {
        self.groups
    }
}
