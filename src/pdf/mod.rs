pub mod copy;
pub mod document;
pub mod image;
pub mod merge;
pub mod split;

pub use document::{OutputDocument, PdfDocument};
pub use merge::{merge, SourceEntry};
pub use split::split;
