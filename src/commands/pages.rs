use crate::page_range::parse_page_range;
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, pages: &str) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let result = parse_page_range(pages, doc.page_count());

    match result.error {
        Some(error) => anyhow::bail!(error),
        None => {
            println!(
                "{} of {} pages: {}",
                result.indices.len(),
                doc.page_count(),
                result.to_canonical_string()
            );
            Ok(())
        }
    }
}
