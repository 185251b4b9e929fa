use super::{output_path, progress_printer, Options};
use crate::file_utils::format_file_size;
use crate::pdf::document::page_count;
use crate::pdf::merge;
use crate::progress::ProgressSink;
use crate::rotation::Rotation;
use crate::selection::MergeQueue;
use crate::validation::{validate_path, FileKind};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// A command-line merge input: a path with an optional `@<degrees>` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInput {
    pub path: PathBuf,
    pub rotation: Rotation,
}

impl FromStr for MergeInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((path, suffix)) = s.rsplit_once('@') {
            let degrees = suffix.trim_end_matches('°');
            let numeric = !degrees.is_empty() && degrees.bytes().all(|b| b.is_ascii_digit());
            if numeric && !path.is_empty() {
                return Ok(MergeInput {
                    path: PathBuf::from(path),
                    rotation: suffix.parse()?,
                });
            }
        }
        Ok(MergeInput {
            path: PathBuf::from(s),
            rotation: Rotation::None,
        })
    }
}

pub async fn run(inputs: &[MergeInput], output: Option<&str>, options: Options) -> Result<()> {
    let mut progress = progress_printer("Merging", options.quiet);
    let (queue, bytes) = merge_files(inputs, options.max_file_size, &mut progress).await?;

    let output = output_path(output, "merged");
    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to save merged PDF: {}", output.display()))?;

    println!(
        "Merged {} files ({} pages, {}) into {}",
        queue.len(),
        queue.total_pages(),
        format_file_size(bytes.len() as u64),
        output.display()
    );

    Ok(())
}

/// Validate and read every input, then merge them in order.
pub async fn merge_files(
    inputs: &[MergeInput],
    max_file_size: u64,
    progress: &mut (dyn ProgressSink + Send),
) -> Result<(MergeQueue, Vec<u8>)> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let mut queue = MergeQueue::new();
    for input in inputs {
        let path = &input.path;
        let kind = validate_path(path, max_file_size)?;
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let pages = match kind {
            FileKind::Pdf => page_count(&content)
                .with_context(|| format!("Failed to load PDF: {}", path.display()))?,
            FileKind::Image => 1,
        };

        let (next, id) = queue.add(path.display().to_string(), kind, content, pages);
        queue = next.with_rotation(id, input.rotation);
    }

    tracing::info!(
        files = queue.len(),
        pages = queue.total_pages(),
        size = %format_file_size(queue.total_size()),
        "inputs queued"
    );

    let bytes = merge(&queue.entries(), progress).await?;
    Ok((queue, bytes))
}
