use crate::file_utils::format_file_size;
use crate::pdf::PdfDocument;
use crate::rotation::Rotation;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?
        .len();
    let doc = PdfDocument::open(path)?;
    let info = doc.get_info();

    println!("File: {}", doc.name);
    println!("Size: {}", format_file_size(size));
    println!("Version: {}", info.version);
    println!("Pages: {}", info.page_count);
    println!("Rotated pages: {}", describe_rotations(&doc.page_rotations()));

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    Ok(())
}

/// "2 (90°), 5 (270°)", or "none".
fn describe_rotations(rotations: &[Rotation]) -> String {
    let rotated: Vec<String> = rotations
        .iter()
        .enumerate()
        .filter(|(_, r)| **r != Rotation::None)
        .map(|(i, r)| format!("{} ({})", i + 1, r))
        .collect();
    if rotated.is_empty() {
        "none".to_string()
    } else {
        rotated.join(", ")
    }
}

fn format_pdf_date(date: &str) -> String {
    // D:YYYYMMDDHHmmSSOHH'mm
    if let Some(d) = date.strip_prefix("D:") {
        if d.len() >= 8 && d.is_ascii() {
            let time = if d.len() >= 14 {
                format!(" {}:{}:{}", &d[8..10], &d[10..12], &d[12..14])
            } else {
                String::new()
            };
            return format!("{}-{}-{}{}", &d[0..4], &d[4..6], &d[6..8], time);
        }
    }
    date.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_rotations() {
        assert_eq!(describe_rotations(&[Rotation::None; 3]), "none");
        assert_eq!(
            describe_rotations(&[Rotation::None, Rotation::Right, Rotation::None, Rotation::Left]),
            "2 (90°), 4 (270°)"
        );
    }

    #[test]
    fn test_format_pdf_date() {
        assert_eq!(format_pdf_date("D:20240131120530+01'00"), "2024-01-31 12:05:30");
        assert_eq!(format_pdf_date("D:20240131"), "2024-01-31");
        assert_eq!(format_pdf_date("yesterday"), "yesterday");
    }
}
