//! Extract a selection of pages into a new document.

use crate::error::SplitError;
use crate::pdf::copy::{rotate_page, PageCopier};
use crate::pdf::document::OutputDocument;
use crate::progress::{ProgressSink, ProgressTracker};
use crate::rotation::Rotation;
use lopdf::Document;

/// Copy the pages at `page_indices` (zero-based, in the given order, repeats
/// allowed) from `source` into a new PDF.
///
/// With `rotations`, position `i` turns output page `i` by `rotations[i]` on
/// top of the page's own rotation. Without it, rotations are left as they are.
/// The selection is checked in full before any page is copied.
pub async fn split(
    source: &[u8],
    page_indices: &[u32],
    rotations: Option<&[Rotation]>,
    progress: &mut (dyn ProgressSink + Send),
) -> Result<Vec<u8>, SplitError> {
    if page_indices.is_empty() {
        return Err(SplitError::EmptySelection);
    }
    if let Some(rotations) = rotations {
        if rotations.len() != page_indices.len() {
            return Err(SplitError::RotationCountMismatch {
                pages: page_indices.len(),
                rotations: rotations.len(),
            });
        }
    }

    let doc = Document::load_mem(source).map_err(SplitError::Source)?;
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    let total = page_ids.len() as u32;

    if let Some(&bad) = page_indices.iter().find(|&&index| index >= total) {
        return Err(SplitError::OutOfRange {
            page: bad as u64 + 1,
            total,
        });
    }

    tracing::info!(
        selected = page_indices.len(),
        source_pages = total,
        rotated = rotations.is_some(),
        "extracting pages"
    );

    let mut out = OutputDocument::new();
    let mut copier = PageCopier::new(&doc);
    let mut tracker = ProgressTracker::new(progress, page_indices.len());

    for (position, &index) in page_indices.iter().enumerate() {
        let mut page = copier
            .copy_page(out.doc_mut(), page_ids[index as usize])
            .map_err(SplitError::Source)?;

        if let Some(delta) = rotations.map(|r| r[position]) {
            let rotated = rotate_page(&mut page, delta);
            tracing::debug!(page = index + 1, %delta, %rotated, "rotated page");
        }

        out.push_page(page);
        tracker.advance();
        tokio::task::yield_now().await;
    }

    let bytes = out.finish().map_err(SplitError::Write)?;
    tracing::info!(pages = page_indices.len(), bytes = bytes.len(), "extraction finished");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::tests::{create_test_pdf, page_labels};
    use crate::pdf::document::PdfDocument;
    use crate::pdf::merge::{merge, SourceEntry};
    use crate::progress::NoProgress;
    use pretty_assertions::assert_eq;

    fn rotations_of(bytes: &[u8]) -> Vec<Rotation> {
        PdfDocument::from_bytes(bytes, "out.pdf")
            .unwrap()
            .page_rotations()
    }

    #[tokio::test]
    async fn test_extracts_selected_pages_in_order() {
        let pdf = create_test_pdf("S", &[0; 5]);
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);

        let out = split(&pdf, &[0, 2, 4], None, &mut sink).await.unwrap();

        assert_eq!(page_labels(&out), vec!["S-Page-1", "S-Page-3", "S-Page-5"]);
        assert_eq!(seen, vec![33, 67, 100]);
    }

    #[tokio::test]
    async fn test_reorders_and_repeats() {
        let pdf = create_test_pdf("S", &[0; 3]);
        let out = split(&pdf, &[2, 0, 2], None, &mut NoProgress).await.unwrap();
        assert_eq!(page_labels(&out), vec!["S-Page-3", "S-Page-1", "S-Page-3"]);
    }

    #[tokio::test]
    async fn test_empty_selection_fails_before_decoding() {
        // Undecodable source: reaching the parser would yield a Source error
        let err = split(b"garbage", &[], None, &mut NoProgress).await.unwrap_err();
        assert!(matches!(err, SplitError::EmptySelection));
    }

    #[tokio::test]
    async fn test_out_of_range_names_one_based_page() {
        let pdf = create_test_pdf("S", &[0; 5]);
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);

        let err = split(&pdf, &[0, 1, 5], None, &mut sink).await.unwrap_err();

        assert!(matches!(err, SplitError::OutOfRange { page: 6, total: 5 }));
        assert!(err.to_string().contains("Page 6"));
        assert!(seen.is_empty(), "no page may be copied before validation");
    }

    #[tokio::test]
    async fn test_corrupt_source() {
        let err = split(b"garbage", &[0], None, &mut NoProgress).await.unwrap_err();
        assert!(matches!(err, SplitError::Source(_)));
    }

    #[tokio::test]
    async fn test_rotation_count_must_match() {
        let pdf = create_test_pdf("S", &[0; 3]);
        let err = split(&pdf, &[0, 1], Some(&[Rotation::Right]), &mut NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SplitError::RotationCountMismatch { pages: 2, rotations: 1 }
        ));
    }

    #[tokio::test]
    async fn test_rotation_deltas_applied_per_page() {
        let pdf = create_test_pdf("S", &[0, 0, 90]);
        let out = split(
            &pdf,
            &[0, 1, 2],
            Some(&[Rotation::Right, Rotation::Down, Rotation::Right]),
            &mut NoProgress,
        )
        .await
        .unwrap();

        assert_eq!(
            rotations_of(&out),
            vec![Rotation::Right, Rotation::Down, Rotation::Down]
        );
    }

    #[tokio::test]
    async fn test_indirect_rotate_composes_with_delta() {
        let mut doc = Document::load_mem(&create_test_pdf("S", &[0])).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let rotate_id = doc.add_object(lopdf::Object::Integer(90));
        doc.get_dictionary_mut(page_id)
            .unwrap()
            .set("Rotate", lopdf::Object::Reference(rotate_id));
        let mut pdf = Vec::new();
        doc.save_to(&mut pdf).unwrap();

        assert_eq!(rotations_of(&pdf), vec![Rotation::Right]);
        let out = split(&pdf, &[0], Some(&[Rotation::Right]), &mut NoProgress)
            .await
            .unwrap();
        assert_eq!(rotations_of(&out), vec![Rotation::Down]);
    }

    #[tokio::test]
    async fn test_rotation_left_alone_without_deltas() {
        let pdf = create_test_pdf("S", &[270, 90]);
        let out = split(&pdf, &[1, 0], None, &mut NoProgress).await.unwrap();
        assert_eq!(rotations_of(&out), vec![Rotation::Right, Rotation::Left]);
    }

    #[tokio::test]
    async fn test_same_page_twice_with_different_rotations() {
        let pdf = create_test_pdf("S", &[0]);
        let out = split(
            &pdf,
            &[0, 0],
            Some(&[Rotation::None, Rotation::Left]),
            &mut NoProgress,
        )
        .await
        .unwrap();
        assert_eq!(rotations_of(&out), vec![Rotation::None, Rotation::Left]);
    }

    #[tokio::test]
    async fn test_source_bytes_untouched() {
        let pdf = create_test_pdf("S", &[0, 0]);
        let before = pdf.clone();
        split(&pdf, &[1], Some(&[Rotation::Down]), &mut NoProgress)
            .await
            .unwrap();
        assert_eq!(pdf, before);
    }

    #[tokio::test]
    async fn test_merge_then_split_round_trip() {
        let pdf = create_test_pdf("R", &[0, 90, 180, 270]);
        let original = rotations_of(&pdf);

        let merged = merge(&[SourceEntry::pdf(&pdf)], &mut NoProgress).await.unwrap();
        let all: Vec<u32> = (0..original.len() as u32).collect();
        let zero = vec![Rotation::None; all.len()];
        let out = split(&merged, &all, Some(zero.as_slice()), &mut NoProgress).await.unwrap();

        assert_eq!(rotations_of(&out), original);
        assert_eq!(page_labels(&out), page_labels(&pdf));
    }
}
