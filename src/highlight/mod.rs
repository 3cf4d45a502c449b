//! Highlights: one overlay per (block, page) pair.

use crate::geometry::NormalizedRect;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub mod builder;
pub mod index;
pub mod visibility;

pub use builder::{build, HighlightBuilder};
pub use index::{DerivedBlock, HighlightIndex};
pub use visibility::{visible, RenderNudge, VisibilityMode, VisibleHighlights};

lazy_static! {
    /// Runs of whitespace in block text
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    /// Separators folded into `_` when classifying block types
    static ref RE_TYPE_SEPARATOR: Regex = Regex::new(r"[\s-]+").unwrap();
}

/// Number of distinct tone tokens.
pub const TONE_COUNT: u8 = 6;

/// One block's geometry on one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    /// `"<blockId>:p<pageNumber>"`
    pub id: String,
    /// Source block id
    pub block_id: String,
    /// Source block position
    pub block_index: u32,
    /// Source block type
    pub block_type: String,
    /// Pointer the geometry was resolved from
    pub locator_path: String,
    /// 1-based page number
    pub page_number: u32,
    /// Union of `rects`
    pub bounding_rect: NormalizedRect,
    /// Every rectangle of the block on this page
    pub rects: Vec<NormalizedRect>,
    /// Whitespace-collapsed, length-capped block text
    pub snippet: String,
    /// Whitespace-collapsed block text
    pub text: String,
    /// Colour token in `0..TONE_COUNT`
    pub tone: u8,
}

impl Highlight {
    /// Identifier for a block's highlight on a page.
    pub fn make_id(block_id: &str, page_number: u32) -> String {
        format!("{}:p{}", block_id, page_number)
    }

    /// Short label, e.g. `"paragraph #4 p.2"`.
    pub fn label(&self) -> String {
        format!("{} #{} p.{}", self.block_type, self.block_index, self.page_number)
    }
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// First `max_chars` characters of already collapsed text.
pub fn snippet_of(collapsed: &str, max_chars: usize) -> String {
    match collapsed.char_indices().nth(max_chars) {
        Some((byte_end, _)) => collapsed[..byte_end].to_string(),
        None => collapsed.to_string(),
    }
}

/// Colour token for a block type.
///
/// # Examples
///
/// ```
/// use block_highlighter::highlight::tone_for;
///
/// assert_eq!(tone_for("Section Heading", 7), 0);
/// assert_eq!(tone_for("page-header", 7), 2);
/// assert_eq!(tone_for("formula", 7), 1);
/// ```
pub fn tone_for(block_type: &str, block_index: u32) -> u8 {
    let lowered = block_type.trim().to_lowercase();
    let normalized = RE_TYPE_SEPARATOR.replace_all(&lowered, "_");

    if normalized.contains("page_header") {
        2
    } else if normalized.contains("heading") {
        0
    } else if normalized.contains("paragraph") {
        1
    } else if normalized.contains("list") {
        3
    } else if normalized.contains("table") {
        4
    } else if normalized.contains("code") || normalized.contains("caption") {
        5
    } else {
        (block_index % TONE_COUNT as u32) as u8
    }
}
