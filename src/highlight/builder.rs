//! Highlight construction from blocks and a document tree.

use super::{collapse_whitespace, snippet_of, tone_for, Highlight};
use crate::block::Block;
use crate::config::HighlighterConfig;
use crate::geometry::{normalize, CoordOrigin, NormalizedRect, PageSizes};
use crate::pointer::resolve_with_depth;
use crate::tree::{provenance_rects, DocumentTree};
use std::collections::BTreeMap;

/// Why a block produced no highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Locator is not a tree pointer, or the pointer is missing
    NoTreeLocator,
    /// Pointer did not resolve to a node
    Unresolved,
    /// Node has no provenance boxes
    NoProvenance,
    /// No provenance box survived normalization
    NoGeometry,
}

/// Builds highlights for a document load.
#[derive(Debug, Clone)]
pub struct HighlightBuilder {
    max_reference_depth: usize,
    snippet_max_chars: usize,
    default_origin: CoordOrigin,
}

impl Default for HighlightBuilder {
    fn default() -> Self {
        Self::from_config(&HighlighterConfig::default())
    }
}

impl HighlightBuilder {
    /// Create a builder from configuration.
    pub fn from_config(config: &HighlighterConfig) -> Self {
        Self {
            max_reference_depth: config.max_reference_depth,
            snippet_max_chars: config.snippet_max_chars,
            default_origin: config.default_coord_origin,
        }
    }

    /// Build every highlight for `blocks`.
    ///
    /// Blocks that cannot be placed are skipped. The result is ordered by block index,
    /// then page number.
    pub fn build(&self, blocks: &[Block], tree: &DocumentTree, pages: &PageSizes) -> Vec<Highlight> {
        let mut highlights = Vec::new();
        let mut skipped = 0usize;

        for block in blocks {
            match self.build_block(block, tree, pages) {
                Ok(mut block_highlights) => highlights.append(&mut block_highlights),
                Err(reason) => {
                    skipped += 1;
                    log::debug!("Skipping block {} (#{}): {:?}", block.id, block.index, reason);
                },
            }
        }

        highlights.sort_by(|a, b| (a.block_index, a.page_number).cmp(&(b.block_index, b.page_number)));
        log::debug!(
            "Built {} highlights from {} blocks ({} skipped)",
            highlights.len(),
            blocks.len(),
            skipped
        );
        highlights
    }

    /// Build the highlights of a single block, one per page it touches.
    pub fn build_block(
        &self,
        block: &Block,
        tree: &DocumentTree,
        pages: &PageSizes,
    ) -> Result<Vec<Highlight>, SkipReason> {
        let pointer = block.tree_locator().ok_or(SkipReason::NoTreeLocator)?;
        let node = resolve_with_depth(tree.root(), pointer, self.max_reference_depth)
            .ok_or(SkipReason::Unresolved)?;

        let provenance = provenance_rects(node, self.default_origin);
        if provenance.is_empty() {
            return Err(SkipReason::NoProvenance);
        }

        let mut by_page: BTreeMap<u32, Vec<NormalizedRect>> = BTreeMap::new();
        for entry in &provenance {
            if let Some(rect) = normalize(&entry.rect, entry.page_number, pages) {
                by_page.entry(entry.page_number).or_default().push(rect);
            }
        }
        if by_page.is_empty() {
            return Err(SkipReason::NoGeometry);
        }

        let text = collapse_whitespace(&block.content_preview);
        let snippet = snippet_of(&text, self.snippet_max_chars);
        let tone = tone_for(&block.block_type, block.index);

        Ok(by_page
            .into_iter()
            .filter_map(|(page_number, rects)| {
                let bounding_rect = NormalizedRect::bounding(&rects)?;
                Some(Highlight {
                    id: Highlight::make_id(&block.id, page_number),
                    block_id: block.id.clone(),
                    block_index: block.index,
                    block_type: block.block_type.clone(),
                    locator_path: pointer.to_string(),
                    page_number,
                    bounding_rect,
                    rects,
                    snippet: snippet.clone(),
                    text: text.clone(),
                    tone,
                })
            })
            .collect())
    }
}

/// Build highlights with default settings.
pub fn build(blocks: &[Block], tree: &DocumentTree, pages: &PageSizes) -> Vec<Highlight> {
    HighlightBuilder::default().build(blocks, tree, pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> DocumentTree {
        DocumentTree::from_value(json!({
            "pages": {
                "1": {"size": {"width": 600, "height": 800}},
                "2": {"size": {"width": 600, "height": 800}}
            },
            "texts": [
                {"text": "one page", "prov": [
                    {"page_no": 1, "bbox": {"l": 50, "t": 700, "r": 550, "b": 650, "coord_origin": "BOTTOMLEFT"}}
                ]},
                {"text": "two pages", "prov": [
                    {"page_no": 2, "bbox": {"l": 10, "t": 100, "r": 20, "b": 90}},
                    {"page_no": 1, "bbox": {"l": 10, "t": 30, "r": 20, "b": 10}},
                    {"page_no": 1, "bbox": {"l": 5, "t": 60, "r": 15, "b": 40}}
                ]},
                {"text": "heading only"},
                {"text": "off the map", "prov": [
                    {"page_no": 9, "bbox": {"l": 1, "t": 2, "r": 3, "b": 4}}
                ]},
                {"text": "broken edges", "prov": [
                    {"page_no": 1, "bbox": {"l": "NaN", "t": 2, "r": 3, "b": 4}}
                ]}
            ]
        }))
    }

    fn block(id: &str, index: u32, pointer: &str) -> Block {
        Block::tree_pointer(id, index, "paragraph", pointer, "  Some\n text  ")
    }

    #[test]
    fn test_single_rect_block() {
        let t = tree();
        let hs = build(&[block("a", 0, "#/texts/0")], &t, &t.page_sizes());
        assert_eq!(hs.len(), 1);
        let h = &hs[0];
        assert_eq!(h.id, "a:p1");
        assert_eq!(h.bounding_rect.x1, 50.0);
        assert_eq!(h.bounding_rect.y1, 100.0);
        assert_eq!(h.bounding_rect.x2, 550.0);
        assert_eq!(h.bounding_rect.y2, 150.0);
        assert_eq!(h.snippet, "Some text");
        assert_eq!(h.tone, 1);
    }

    #[test]
    fn test_multi_page_block_is_split_and_merged() {
        let t = tree();
        let hs = build(&[block("b", 0, "#/texts/1")], &t, &t.page_sizes());
        let ids: Vec<&str> = hs.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b:p1", "b:p2"]);
        let p1 = &hs[0];
        assert_eq!(p1.rects.len(), 2);
        assert_eq!(
            (p1.bounding_rect.x1, p1.bounding_rect.y1, p1.bounding_rect.x2, p1.bounding_rect.y2),
            (5.0, 740.0, 20.0, 790.0)
        );
    }

    #[test]
    fn test_skip_reasons() {
        let t = tree();
        let pages = t.page_sizes();
        let builder = HighlightBuilder::default();

        let mut no_path = block("x", 0, "#/texts/0");
        no_path.locator_path = None;
        assert_eq!(builder.build_block(&no_path, &t, &pages), Err(SkipReason::NoTreeLocator));
        assert_eq!(
            builder.build_block(&block("x", 0, "#/texts/40"), &t, &pages),
            Err(SkipReason::Unresolved)
        );
        assert_eq!(
            builder.build_block(&block("x", 0, "#/texts/2"), &t, &pages),
            Err(SkipReason::NoProvenance)
        );
        assert_eq!(
            builder.build_block(&block("x", 0, "#/texts/3"), &t, &pages),
            Err(SkipReason::NoGeometry)
        );
        assert_eq!(
            builder.build_block(&block("x", 0, "#/texts/4"), &t, &pages),
            Err(SkipReason::NoGeometry)
        );
    }

    #[test]
    fn test_ordering_by_index_then_page() {
        let t = tree();
        let blocks = vec![block("late", 5, "#/texts/0"), block("early", 1, "#/texts/1")];
        let hs = build(&blocks, &t, &t.page_sizes());
        let ids: Vec<&str> = hs.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["early:p1", "early:p2", "late:p1"]);
    }

    #[test]
    fn test_snippet_cap_from_config() {
        let t = tree();
        let config = HighlighterConfig::default().with_snippet_max_chars(4);
        let hs = HighlightBuilder::from_config(&config).build(&[block("a", 0, "#/texts/0")], &t, &t.page_sizes());
        assert_eq!(hs[0].snippet, "Some");
        assert_eq!(hs[0].text, "Some text");
    }
}
