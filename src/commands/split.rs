use super::{output_path, progress_printer, Options};
use crate::page_range::parse_page_range;
use crate::pdf::document::page_count;
use crate::pdf::split;
use crate::progress::ProgressSink;
use crate::rotation::Rotation;
use crate::selection::PageSelection;
use crate::validation::{validate_path, FileKind};
use anyhow::{Context, Result};
use std::path::Path;

/// How the extracted pages are turned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RotationPlan {
    /// Keep each page's own rotation
    #[default]
    Keep,
    /// One delta for every selected page
    All(Rotation),
    /// One delta per selected page, in selection order
    PerPage(Vec<Rotation>),
}

pub async fn run<P: AsRef<Path>>(
    input: P,
    pages: &str,
    output: Option<&str>,
    plan: &RotationPlan,
    options: Options,
) -> Result<()> {
    let mut progress = progress_printer("Extracting", options.quiet);
    let (count, bytes) =
        extract_pages(input.as_ref(), pages, plan, options.max_file_size, &mut progress).await?;

    let output = output_path(output, "split");
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to save extracted PDF: {}", output.display()))?;

    println!("Extracted {} page(s) to {}", count, output.display());

    Ok(())
}

/// Read `input`, resolve `pages` against it and extract the selection.
/// Returns the number of extracted pages with the new document.
pub async fn extract_pages(
    input: &Path,
    pages: &str,
    plan: &RotationPlan,
    max_file_size: u64,
    progress: &mut (dyn ProgressSink + Send),
) -> Result<(usize, Vec<u8>)> {
    if validate_path(input, max_file_size)? != FileKind::Pdf {
        anyhow::bail!("Only PDF files can be split: {}", input.display());
    }

    let content = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read PDF: {}", input.display()))?;
    let total = page_count(&content)
        .with_context(|| format!("Failed to load PDF: {}", input.display()))?;

    let indices = parse_page_range(pages, total)
        .into_result()
        .map_err(anyhow::Error::msg)?;
    let selection = apply_plan(PageSelection::all(total).with_selected(&indices), plan)?;

    let selected = selection.selected_indices();
    let rotations = selection.selected_rotations();
    let rotations = match plan {
        RotationPlan::Keep => None,
        _ => Some(rotations.as_slice()),
    };

    let bytes = split(&content, &selected, rotations, progress).await?;
    Ok((selected.len(), bytes))
}

fn apply_plan(selection: PageSelection, plan: &RotationPlan) -> Result<PageSelection> {
    let indices = selection.selected_indices();
    match plan {
        RotationPlan::Keep => Ok(selection),
        RotationPlan::All(rotation) => Ok(indices
            .iter()
            .fold(selection, |s, &i| s.with_rotation(i, *rotation))),
        RotationPlan::PerPage(rotations) => {
            if rotations.len() != indices.len() {
                anyhow::bail!(
                    "Got {} rotations for {} selected pages",
                    rotations.len(),
                    indices.len()
                );
            }
            Ok(indices
                .iter()
                .zip(rotations)
                .fold(selection, |s, (&i, &r)| s.with_rotation(i, r)))
        }
    }
}
