//! The ordered, deduplicated highlight collection of the current document.

use super::Highlight;
use indexmap::IndexMap;
use serde::Serialize;

/// Highlights of one document load, in `(block_index, page_number)` order, with an
/// id lookup. Rebuilt wholesale whenever the tree or block list changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightIndex {
    by_id: IndexMap<String, Highlight>,
}

impl HighlightIndex {
    /// An index with no highlights.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index. Input order is re-established by `(block_index, page_number)`;
    /// later duplicates of an id are dropped.
    pub fn new(mut highlights: Vec<Highlight>) -> Self {
        highlights.sort_by(|a, b| (a.block_index, a.page_number).cmp(&(b.block_index, b.page_number)));

        let mut by_id = IndexMap::with_capacity(highlights.len());
        for highlight in highlights {
            if by_id.contains_key(&highlight.id) {
                log::warn!("Duplicate highlight id '{}' dropped", highlight.id);
                continue;
            }
            by_id.insert(highlight.id.clone(), highlight);
        }
        Self { by_id }
    }

    /// Number of highlights.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether there are no highlights.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Highlight by id.
    pub fn get(&self, id: &str) -> Option<&Highlight> {
        self.by_id.get(id)
    }

    /// Whether a highlight with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Position of a highlight in display order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get_index_of(id)
    }

    /// First highlight in display order.
    pub fn first(&self) -> Option<&Highlight> {
        self.by_id.first().map(|(_, h)| h)
    }

    /// Highlights in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Highlight> {
        self.by_id.values()
    }

    /// Owned copy of the highlights in display order.
    pub fn to_vec(&self) -> Vec<Highlight> {
        self.by_id.values().cloned().collect()
    }

    /// Rows for a block list panel.
    pub fn derived_blocks(&self) -> Vec<DerivedBlock> {
        self.iter().map(DerivedBlock::from).collect()
    }
}

/// A list-panel row derived from a highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedBlock {
    /// Highlight id
    pub id: String,
    /// Source block id
    pub block_id: String,
    /// Source block position
    pub block_index: u32,
    /// Source block type
    pub block_type: String,
    /// 1-based page number
    pub page_no: u32,
    /// Capped block text
    pub snippet: String,
    /// Colour token
    pub tone: u8,
}

impl From<&Highlight> for DerivedBlock {
    fn from(h: &Highlight) -> Self {
        Self {
            id: h.id.clone(),
            block_id: h.block_id.clone(),
            block_index: h.block_index,
            block_type: h.block_type.clone(),
            page_no: h.page_number,
            snippet: h.snippet.clone(),
            tone: h.tone,
        }
    }
}
