use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigError;
use crate::shared::bounding_box::BoundingBox;

/// Namespace for identity ids minted from detection occurrences.
const IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x6c1e_52a4_9b0f_4d3e_8a57_2f7c_d1e0_9b34);

/// How a tagged person wants to be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Email,
    Phone,
    SocialMedia,
}

impl ContactMethod {
    pub const ALL: &[ContactMethod] = &[
        ContactMethod::Email,
        ContactMethod::Phone,
        ContactMethod::SocialMedia,
    ];
}

impl std::fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactMethod::Email => write!(f, "email"),
            ContactMethod::Phone => write!(f, "phone"),
            ContactMethod::SocialMedia => write!(f, "social_media"),
        }
    }
}

impl FromStr for ContactMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(ContactMethod::Email),
            "phone" => Ok(ContactMethod::Phone),
            "social_media" => Ok(ContactMethod::SocialMedia),
            _ => Err(ConfigError::UnknownValue {
                kind: "contact method",
                value: s.to_string(),
                expected: "email, phone, social_media".to_string(),
            }),
        }
    }
}

/// One detected face occurrence, optionally tagged with a name and contact method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceIdentity {
    pub id: Uuid,
    pub bbox: BoundingBox,
    pub name: Option<String>,
    pub contact_method: Option<ContactMethod>,
}

impl FaceIdentity {
    /// Mints the identity of the `ordinal`-th detection in `image`.
    ///
    /// The id is a name-based UUID over the image path, ordinal and box,
    /// so reprocessing the same photos yields the same ids.
    pub fn mint(image: &Path, ordinal: usize, bbox: BoundingBox) -> Self {
        let mut key = image.as_os_str().as_encoded_bytes().to_vec();
        key.extend_from_slice(
            format!(
                "#{}:{},{},{},{}",
                ordinal, bbox.x, bbox.y, bbox.width, bbox.height
            )
            .as_bytes(),
        );
        Self {
            id: Uuid::new_v5(&IDENTITY_NAMESPACE, &key),
            bbox,
            name: None,
            contact_method: None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn set_contact_method(&mut self, contact_method: ContactMethod) {
        self.contact_method = Some(contact_method);
    }

    /// File stem for this face's crop: the display name when set, else the id.
    ///
    /// Path separators in names are replaced so the crop stays inside its directory.
    pub fn file_stem(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name
                .chars()
                .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
                .collect(),
            _ => self.id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(10, 20, 30, 40).unwrap()
    }

    #[test]
    fn test_mint_is_deterministic() {
        let a = FaceIdentity::mint(Path::new("photos/a.jpg"), 0, bbox());
        let b = FaceIdentity::mint(Path::new("photos/a.jpg"), 0, bbox());
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_mint_differs_per_occurrence() {
        let first = FaceIdentity::mint(Path::new("photos/a.jpg"), 0, bbox());
        let second = FaceIdentity::mint(Path::new("photos/a.jpg"), 1, bbox());
        let other_image = FaceIdentity::mint(Path::new("photos/b.jpg"), 0, bbox());
        assert_ne!(first.id, second.id);
        assert_ne!(first.id, other_image.id);
    }

    #[cfg(unix)]
    #[test]
    fn test_mint_keeps_non_utf8_paths_apart() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let a = Path::new(OsStr::from_bytes(b"photos/\xff.jpg"));
        let b = Path::new(OsStr::from_bytes(b"photos/\xfe.jpg"));
        assert_eq!(a.display().to_string(), b.display().to_string());

        let first = FaceIdentity::mint(a, 0, bbox());
        let second = FaceIdentity::mint(b, 0, bbox());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_file_stem_defaults_to_id() {
        let face = FaceIdentity::mint(Path::new("a.jpg"), 0, bbox());
        assert_eq!(face.file_stem(), face.id.to_string());
    }

    #[test]
    fn test_file_stem_uses_sanitized_name() {
        let mut face = FaceIdentity::mint(Path::new("a.jpg"), 0, bbox());
        face.set_name("Ada/Lovelace");
        assert_eq!(face.file_stem(), "Ada_Lovelace");
    }

    #[test]
    fn test_blank_name_falls_back_to_id() {
        let mut face = FaceIdentity::mint(Path::new("a.jpg"), 0, bbox());
        face.set_name("   ");
        assert_eq!(face.file_stem(), face.id.to_string());
    }

    #[test]
    fn test_contact_method_parse_and_display() {
        for method in ContactMethod::ALL {
            assert_eq!(method.to_string().parse::<ContactMethod>().unwrap(), *method);
        }
        assert!("fax".parse::<ContactMethod>().is_err());
    }

    #[test]
    fn test_contact_method_serde_names() {
        let json = serde_json::to_string(&ContactMethod::SocialMedia).unwrap();
        assert_eq!(json, "\"social_media\"");
    }
}
