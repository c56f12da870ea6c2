use std::path::{Path, PathBuf};

use crate::config::ImageFormat;

/// Lists regular files in `folder` whose extension maps to a format accepted
/// by `accept`, sorted by file name. Subdirectories are not descended into.
pub fn list_images(
    folder: &Path,
    accept: impl Fn(ImageFormat) -> bool,
) -> std::io::Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if ImageFormat::from_path(&path).is_some_and(&accept) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_matching_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.jpg", "a.JPG", "b.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let all = list_images(dir.path(), |_| true).unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JPG", "b.png", "c.jpg"]);
    }

    #[test]
    fn test_filter_by_format() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.jpg", "b.png", "c.jpeg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let jpgs = list_images(dir.path(), |f| f == ImageFormat::Jpg).unwrap();
        assert_eq!(jpgs, vec![dir.path().join("a.jpg")]);
    }

    #[test]
    fn test_missing_folder_is_error() {
        assert!(list_images(Path::new("/nonexistent/photos"), |_| true).is_err());
    }
}
