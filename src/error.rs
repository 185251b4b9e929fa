use crate::validation::FileKind;
use thiserror::Error;

/// Failures while turning a raster image into a page.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image as PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Not enough resources to rasterize image: {0}")]
    Resource(#[source] image::ImageError),
}

impl ImageError {
    /// Classify a decoder error; allocation refusals are resource failures.
    pub(crate) fn from_decode(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(_) => ImageError::Resource(err),
            other => ImageError::Decode(other),
        }
    }
}

/// Why a merge source could not be used.
#[derive(Error, Debug)]
pub enum SourceFailure {
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Image(#[from] ImageError),
}

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("No files to merge")]
    EmptyInput,

    #[error("Failed to read {kind} source #{position} ({name}): {reason}", position = .index + 1)]
    Source {
        index: usize,
        name: String,
        kind: FileKind,
        #[source]
        reason: SourceFailure,
    },

    #[error("Failed to write merged PDF: {0}")]
    Write(#[source] lopdf::Error),
}

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("No pages selected for extraction")]
    EmptySelection,

    #[error("Page {page} is out of range (document has {total} pages)")]
    OutOfRange { page: u64, total: u32 },

    #[error("Got {rotations} rotations for {pages} selected pages")]
    RotationCountMismatch { pages: usize, rotations: usize },

    #[error("Failed to parse source PDF: {0}")]
    Source(#[source] lopdf::Error),

    #[error("Failed to write extracted PDF: {0}")]
    Write(#[source] lopdf::Error),
}
