//! File acceptance policy applied before anything reaches merge or split.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// 100 MiB
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

const PDF_MIME: &str = "application/pdf";
const IMAGE_MIMES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

const PDF_EXTENSIONS: [&str; 1] = [".pdf"];
const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".webp", ".gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Image,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Pdf => write!(f, "PDF"),
            FileKind::Image => write!(f, "image"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only PDF or image files (JPEG, PNG, WebP, GIF) can be added: {name}")]
    UnsupportedType { name: String },

    #[error("File size must be at most {limit} bytes: {name} is {size} bytes")]
    TooLarge { name: String, size: u64, limit: u64 },
}

pub fn is_pdf_file(name: &str, mime: Option<&str>) -> bool {
    mime == Some(PDF_MIME) || has_extension(name, &PDF_EXTENSIONS)
}

pub fn is_image_file(name: &str, mime: Option<&str>) -> bool {
    mime.is_some_and(|m| IMAGE_MIMES.contains(&m)) || has_extension(name, &IMAGE_EXTENSIONS)
}

/// Classify a file by MIME type or name. PDF wins when both match.
pub fn classify(name: &str, mime: Option<&str>) -> Option<FileKind> {
    if is_pdf_file(name, mime) {
        Some(FileKind::Pdf)
    } else if is_image_file(name, mime) {
        Some(FileKind::Image)
    } else {
        None
    }
}

/// Accept or reject a file before it is queued.
pub fn validate_file(
    name: &str,
    mime: Option<&str>,
    size: u64,
    max_size: u64,
) -> Result<FileKind, ValidationError> {
    let kind = classify(name, mime).ok_or_else(|| ValidationError::UnsupportedType {
        name: name.to_string(),
    })?;

    if size > max_size {
        return Err(ValidationError::TooLarge {
            name: name.to_string(),
            size,
            limit: max_size,
        });
    }

    Ok(kind)
}

/// Validate a file on disk; the file name doubles as the type hint.
pub fn validate_path(path: &Path, max_size: u64) -> anyhow::Result<FileKind> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(validate_file(&name, None, metadata.len(), max_size)?)
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    let lower = name.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_classify_by_extension() {
        assert_eq!(classify("report.pdf", None), Some(FileKind::Pdf));
        assert_eq!(classify("REPORT.PDF", None), Some(FileKind::Pdf));
        assert_eq!(classify("photo.JPeG", None), Some(FileKind::Image));
        assert_eq!(classify("anim.gif", None), Some(FileKind::Image));
        assert_eq!(classify("notes.txt", None), None);
    }

    #[test]
    fn test_classify_by_mime() {
        assert_eq!(classify("blob", Some("application/pdf")), Some(FileKind::Pdf));
        assert_eq!(classify("blob", Some("image/webp")), Some(FileKind::Image));
        assert_eq!(classify("blob", Some("image/tiff")), None);
    }

    #[test]
    fn test_size_boundary() {
        assert_eq!(
            validate_file("a.pdf", None, MAX_FILE_SIZE, MAX_FILE_SIZE),
            Ok(FileKind::Pdf)
        );
        let err = validate_file("a.pdf", None, MAX_FILE_SIZE + 1, MAX_FILE_SIZE).unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { size, .. } if size == 104_857_601));
    }

    #[test]
    fn test_type_checked_before_size() {
        let err = validate_file("movie.mp4", None, u64::MAX, MAX_FILE_SIZE).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
        assert!(err.to_string().contains("movie.mp4"));
    }

    #[test]
    fn test_validate_path_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 32]).unwrap();

        assert_eq!(validate_path(&path, 64).unwrap(), FileKind::Image);
        assert!(validate_path(&path, 16).is_err());
    }
}
