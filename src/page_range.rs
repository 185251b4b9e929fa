use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static RANGE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\s*-\s*([0-9]+)$").expect("valid range pattern"));
static SINGLE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)$").expect("valid page pattern"));

const EMPTY_MESSAGE: &str = "Enter a page range";

/// Outcome of parsing a page range expression.
///
/// A bad expression is ordinary user input, so it is reported here rather than
/// as an `Err`. When `valid` is false, `indices` is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRangeResult {
    pub valid: bool,
    /// Zero-based, strictly ascending page indices
    pub indices: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRangeResult {
    fn ok(indices: Vec<u32>) -> Self {
        PageRangeResult {
            valid: true,
            indices,
            error: None,
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        PageRangeResult {
            valid: false,
            indices: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Render the selection back as 1-based pages, e.g. "1,2,5".
    pub fn to_canonical_string(&self) -> String {
        self.indices
            .iter()
            .map(|i| (i + 1).to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Convert into a `Result`, for callers that treat a bad range as fatal.
    pub fn into_result(self) -> Result<Vec<u32>, String> {
        if self.valid {
            Ok(self.indices)
        } else {
            Err(self.error.unwrap_or_else(|| EMPTY_MESSAGE.to_string()))
        }
    }
}

/// Parse a page range expression like "1-3, 5, 8-10" against a document with
/// `max_page` pages.
///
/// Segments are processed left to right and the first bad segment ends
/// parsing. Overlapping segments are merged silently.
pub fn parse_page_range(input: &str, max_page: u32) -> PageRangeResult {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return PageRangeResult::fail(EMPTY_MESSAGE);
    }

    let bounds_error = || {
        PageRangeResult::fail(format!(
            "Page numbers must be between 1 and {}",
            max_page
        ))
    };

    let mut indices = BTreeSet::new();

    for segment in trimmed.split(',') {
        let part = segment.trim();
        if part.is_empty() {
            continue;
        }

        if let Some(caps) = RANGE_SEGMENT.captures(part) {
            let (Some(start), Some(end)) = (
                page_number(&caps[1], max_page),
                page_number(&caps[2], max_page),
            ) else {
                return bounds_error();
            };

            if start > end {
                return PageRangeResult::fail(format!(
                    "Range start must not be greater than its end: {}",
                    part
                ));
            }

            indices.extend((start..=end).map(|page| page - 1));
            continue;
        }

        if let Some(caps) = SINGLE_SEGMENT.captures(part) {
            let Some(page) = page_number(&caps[1], max_page) else {
                return bounds_error();
            };
            indices.insert(page - 1);
            continue;
        }

        return PageRangeResult::fail(format!("Invalid format: {}", part));
    }

    if indices.is_empty() {
        return PageRangeResult::fail(EMPTY_MESSAGE);
    }

    PageRangeResult::ok(indices.into_iter().collect())
}

/// A 1-based page number within `1..=max_page`. Digits too long for `u32` are
/// out of bounds as well.
fn page_number(digits: &str, max_page: u32) -> Option<u32> {
    digits
        .parse::<u32>()
        .ok()
        .filter(|&page| page >= 1 && page <= max_page)
}
