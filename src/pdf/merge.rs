//! Combine PDFs and images into one document.

use crate::error::{MergeError, SourceFailure};
use crate::pdf::copy::{rotate_page, PageCopier};
use crate::pdf::document::OutputDocument;
use crate::pdf::image::{append_image_page, to_embeddable_page};
use crate::progress::{ProgressSink, ProgressTracker};
use crate::rotation::Rotation;
use crate::validation::FileKind;
use lopdf::Document;

/// One unit of merge input. The bytes are borrowed for the duration of the
/// call only.
#[derive(Debug, Clone)]
pub struct SourceEntry<'a> {
    pub content: &'a [u8],
    pub kind: FileKind,
    /// For images, how the pixels are turned; for PDFs, a delta applied to
    /// every page on top of its own rotation.
    pub rotation: Rotation,
    pub name: Option<String>,
}

impl<'a> SourceEntry<'a> {
    pub fn new(content: &'a [u8], kind: FileKind) -> Self {
        SourceEntry {
            content,
            kind,
            rotation: Rotation::None,
            name: None,
        }
    }

    pub fn pdf(content: &'a [u8]) -> Self {
        Self::new(content, FileKind::Pdf)
    }

    pub fn image(content: &'a [u8]) -> Self {
        Self::new(content, FileKind::Image)
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Merge `entries` into a new PDF, in order.
///
/// Every page of a PDF entry is appended in its original order; each image
/// entry becomes exactly one page. Progress is reported once per entry. If any
/// entry cannot be read the whole merge fails and nothing is returned.
pub async fn merge(
    entries: &[SourceEntry<'_>],
    progress: &mut (dyn ProgressSink + Send),
) -> Result<Vec<u8>, MergeError> {
    if entries.is_empty() {
        return Err(MergeError::EmptyInput);
    }

    tracing::info!(entries = entries.len(), "merging sources");

    let mut out = OutputDocument::new();
    let mut tracker = ProgressTracker::new(progress, entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let before = out.page_count();
        append_entry(&mut out, entry).map_err(|reason| MergeError::Source {
            index,
            name: entry.name.clone().unwrap_or_else(|| "unnamed".to_string()),
            kind: entry.kind,
            reason,
        })?;

        tracing::debug!(
            index,
            kind = %entry.kind,
            pages = out.page_count() - before,
            "appended source"
        );

        tracker.advance();
        tokio::task::yield_now().await;
    }

    let pages = out.page_count();
    let bytes = out.finish().map_err(MergeError::Write)?;
    tracing::info!(pages, bytes = bytes.len(), "merge finished");
    Ok(bytes)
}

fn append_entry(out: &mut OutputDocument, entry: &SourceEntry<'_>) -> Result<(), SourceFailure> {
    match entry.kind {
        FileKind::Pdf => {
            let source = Document::load_mem(entry.content)?;
            let mut copier = PageCopier::new(&source);
            for page_id in source.get_pages().into_values() {
                let mut page = copier.copy_page(out.doc_mut(), page_id)?;
                if entry.rotation != Rotation::None {
                    rotate_page(&mut page, entry.rotation);
                }
                out.push_page(page);
            }
        }
        FileKind::Image => {
            let descriptor = to_embeddable_page(entry.content, entry.rotation)?;
            append_image_page(out, &descriptor)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;
    use crate::pdf::document::page_rotation;
    use crate::pdf::document::tests::{create_test_pdf, page_labels};
    use crate::pdf::image::tests::{encode, marked_rgb};
    use crate::progress::NoProgress;
    use image::ImageFormat;
    use pretty_assertions::assert_eq;

    fn rotations_of(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .into_values()
            .map(|id| page_rotation(&doc, id).degrees())
            .collect()
    }

    #[tokio::test]
    async fn test_merge_two_documents_in_order() {
        let a = create_test_pdf("A", &[0, 0]);
        let b = create_test_pdf("B", &[0, 0, 0]);
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);

        let merged = merge(&[SourceEntry::pdf(&a), SourceEntry::pdf(&b)], &mut sink)
            .await
            .unwrap();

        assert_eq!(
            page_labels(&merged),
            vec!["A-Page-1", "A-Page-2", "B-Page-1", "B-Page-2", "B-Page-3"]
        );
        assert_eq!(seen, vec![50, 100]);
    }

    #[tokio::test]
    async fn test_progress_once_per_entry() {
        let docs: Vec<Vec<u8>> = (0..7)
            .map(|i| create_test_pdf(&format!("D{}", i), &[0]))
            .collect();
        let entries: Vec<_> = docs.iter().map(|d| SourceEntry::pdf(d)).collect();
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);

        merge(&entries, &mut sink).await.unwrap();

        assert_eq!(seen.len(), 7);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_single_entry() {
        let a = create_test_pdf("A", &[0, 0, 0]);
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);

        let merged = merge(&[SourceEntry::pdf(&a)], &mut sink).await.unwrap();

        assert_eq!(page_labels(&merged).len(), 3);
        assert_eq!(seen, vec![100]);
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = merge(&[], &mut NoProgress).await.unwrap_err();
        assert!(matches!(err, MergeError::EmptyInput));
    }

    #[tokio::test]
    async fn test_corrupt_source_fails_whole_merge() {
        let a = create_test_pdf("A", &[0]);
        let c = create_test_pdf("C", &[0]);
        let entries = [
            SourceEntry::pdf(&a),
            SourceEntry::pdf(b"this is not a pdf").with_name("broken.pdf"),
            SourceEntry::pdf(&c),
        ];
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);

        let err = merge(&entries, &mut sink).await.unwrap_err();

        match &err {
            MergeError::Source { index, name, kind, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(name, "broken.pdf");
                assert_eq!(*kind, FileKind::Pdf);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("#2"));
        // Progress already reported stays reported
        assert_eq!(seen, vec![33]);
    }

    #[tokio::test]
    async fn test_bad_image_is_a_source_error() {
        let entries = [SourceEntry::image(b"not an image")];
        let err = merge(&entries, &mut NoProgress).await.unwrap_err();
        assert!(matches!(
            err,
            MergeError::Source {
                reason: SourceFailure::Image(ImageError::Decode(_)),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_oversized_image_is_a_source_error() {
        let huge = crate::pdf::image::tests::png_header_only(60_000, 60_000);
        let a = create_test_pdf("A", &[0]);
        let entries = [
            SourceEntry::pdf(&a),
            SourceEntry::image(&huge).with_name("huge.png"),
        ];

        let err = merge(&entries, &mut NoProgress).await.unwrap_err();
        assert!(matches!(
            err,
            MergeError::Source {
                index: 1,
                reason: SourceFailure::Image(ImageError::Resource(_)),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_images_become_single_pages() {
        let a = create_test_pdf("A", &[0]);
        let png = encode(marked_rgb(40, 10), ImageFormat::Png);
        let jpeg = encode(marked_rgb(12, 30), ImageFormat::Jpeg);
        let entries = [
            SourceEntry::image(&png).with_rotation(Rotation::Right),
            SourceEntry::pdf(&a),
            SourceEntry::image(&jpeg),
        ];

        let merged = merge(&entries, &mut NoProgress).await.unwrap();

        let doc = Document::load_mem(&merged).unwrap();
        let boxes: Vec<Vec<i64>> = doc
            .get_pages()
            .into_values()
            .map(|id| {
                crate::pdf::copy::inherited_attribute(&doc, id, b"MediaBox")
                    .unwrap()
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|o| o.as_i64().unwrap())
                    .collect()
            })
            .collect();
        assert_eq!(
            boxes,
            vec![vec![0, 0, 10, 40], vec![0, 0, 612, 792], vec![0, 0, 12, 30]]
        );
    }

    #[tokio::test]
    async fn test_pdf_rotation_preserved_or_composed() {
        let a = create_test_pdf("A", &[0, 90, 270]);

        let verbatim = merge(&[SourceEntry::pdf(&a)], &mut NoProgress).await.unwrap();
        assert_eq!(rotations_of(&verbatim), vec![0, 90, 270]);

        let turned = merge(
            &[SourceEntry::pdf(&a).with_rotation(Rotation::Right)],
            &mut NoProgress,
        )
        .await
        .unwrap();
        assert_eq!(rotations_of(&turned), vec![90, 180, 0]);
    }

    #[tokio::test]
    async fn test_same_source_merged_twice() {
        let a = create_test_pdf("A", &[0, 0]);
        let merged = merge(&[SourceEntry::pdf(&a), SourceEntry::pdf(&a)], &mut NoProgress)
            .await
            .unwrap();
        assert_eq!(
            page_labels(&merged),
            vec!["A-Page-1", "A-Page-2", "A-Page-1", "A-Page-2"]
        );
    }

    #[tokio::test]
    async fn test_panicking_observer_does_not_abort() {
        let a = create_test_pdf("A", &[0]);
        let b = create_test_pdf("B", &[0]);
        let mut sink = |_p: u8| panic!("observer failure");

        let merged = merge(&[SourceEntry::pdf(&a), SourceEntry::pdf(&b)], &mut sink)
            .await
            .unwrap();
        assert_eq!(page_labels(&merged), vec!["A-Page-1", "B-Page-1"]);
    }
}
