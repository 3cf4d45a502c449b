//! Property-based tests for geometry normalization and highlight building.
//!
//! Verifies:
//! 1. Normalized rectangles are always ordered (x1 <= x2, y1 <= y2)
//! 2. Flipping twice through the page height restores top-left coordinates
//! 3. A block's bounding rectangle is the coordinate-wise min/max of its rects
//! 4. Built highlights are sorted by (block index, page number)
//! 5. Building is deterministic
//! 6. Pointer resolution never panics and always terminates on reference chains

use block_highlighter::geometry::{normalize, CoordOrigin, PageSize, PageSizes, RawRect};
use block_highlighter::pointer::resolve;
use block_highlighter::{build, Block, DocumentTree};
use proptest::prelude::*;
use serde_json::{json, Value};

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_coord() -> impl Strategy<Value = f64> {
    -1000.0f64..1000.0
}

fn arb_origin() -> impl Strategy<Value = CoordOrigin> {
    prop_oneof![Just(CoordOrigin::BottomLeft), Just(CoordOrigin::TopLeft)]
}

fn arb_raw_rect() -> impl Strategy<Value = RawRect> {
    (arb_coord(), arb_coord(), arb_coord(), arb_coord(), arb_origin())
        .prop_map(|(l, t, r, b, origin)| RawRect::new(l, t, r, b, origin))
}

fn one_page(height: f64) -> PageSizes {
    PageSize::new(1, 600.0, height).into_iter().collect()
}

fn bbox_json(l: f64, t: f64, r: f64, b: f64) -> Value {
    json!({"l": l, "t": t, "r": r, "b": b, "coord_origin": "TOPLEFT"})
}

/// Blocks with up to three rects each, spread over three pages.
fn arb_document() -> impl Strategy<Value = (Vec<Vec<(u32, [f64; 4])>>, Vec<u32>)> {
    let rect = (1u32..=3, [0.0f64..600.0, 0.0f64..800.0, 0.0f64..600.0, 0.0f64..800.0]);
    (
        prop::collection::vec(prop::collection::vec(rect, 0..4), 1..12),
        prop::collection::vec(0u32..50, 12),
    )
}

fn document_from(rects: &[Vec<(u32, [f64; 4])>], indices: &[u32]) -> (DocumentTree, Vec<Block>) {
    let texts: Vec<Value> = rects
        .iter()
        .map(|block| {
            let prov: Vec<Value> = block
                .iter()
                .map(|(page, [l, t, r, b])| json!({"page_no": page, "bbox": bbox_json(*l, *t, *r, *b)}))
                .collect();
            json!({"prov": prov})
        })
        .collect();
    let tree = DocumentTree::from_value(json!({
        "pages": {
            "1": {"size": {"width": 600, "height": 800}},
            "2": {"size": {"width": 600, "height": 800}},
            "3": {"size": {"width": 600, "height": 800}}
        },
        "texts": texts
    }));
    let blocks = (0..rects.len())
        .map(|i| Block::tree_pointer(format!("b{}", i), indices[i], "paragraph", format!("#/texts/{}", i), "text"))
        .collect();
    (tree, blocks)
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalized_rect_is_ordered(raw in arb_raw_rect(), height in 1.0f64..2000.0) {
        let rect = normalize(&raw, 1, &one_page(height)).unwrap();
        prop_assert!(rect.x1 <= rect.x2);
        prop_assert!(rect.y1 <= rect.y2);
        prop_assert_eq!(rect.page_height, height);
        prop_assert_eq!(rect.page_number, 1);
    }

    #[test]
    fn bottom_left_is_mirror_of_top_left(
        l in arb_coord(), t in arb_coord(), r in arb_coord(), b in arb_coord(),
        height in 1.0f64..2000.0,
    ) {
        let pages = one_page(height);
        let bottom = normalize(&RawRect::new(l, t, r, b, CoordOrigin::BottomLeft), 1, &pages).unwrap();
        let top = normalize(
            &RawRect::new(l, height - t, r, height - b, CoordOrigin::TopLeft),
            1,
            &pages,
        )
        .unwrap();
        prop_assert!((bottom.y1 - top.y1).abs() < 1e-9);
        prop_assert!((bottom.y2 - top.y2).abs() < 1e-9);
        prop_assert_eq!(bottom.x1, top.x1);
        prop_assert_eq!(bottom.x2, top.x2);
    }

    #[test]
    fn unknown_page_never_normalizes(raw in arb_raw_rect(), page in 2u32..100) {
        prop_assert!(normalize(&raw, page, &one_page(800.0)).is_none());
    }

    #[test]
    fn bounding_rect_is_union_of_page_rects((rects, indices) in arb_document()) {
        let (tree, blocks) = document_from(&rects, &indices);
        let highlights = build(&blocks, &tree, &tree.page_sizes());

        for h in &highlights {
            prop_assert!(!h.rects.is_empty());
            let x1 = h.rects.iter().map(|r| r.x1).fold(f64::INFINITY, f64::min);
            let y1 = h.rects.iter().map(|r| r.y1).fold(f64::INFINITY, f64::min);
            let x2 = h.rects.iter().map(|r| r.x2).fold(f64::NEG_INFINITY, f64::max);
            let y2 = h.rects.iter().map(|r| r.y2).fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!((h.bounding_rect.x1, h.bounding_rect.y1), (x1, y1));
            prop_assert_eq!((h.bounding_rect.x2, h.bounding_rect.y2), (x2, y2));
            prop_assert!(h.rects.iter().all(|r| r.page_number == h.page_number));
        }
    }

    #[test]
    fn highlights_are_sorted_and_deterministic((rects, indices) in arb_document()) {
        let (tree, blocks) = document_from(&rects, &indices);
        let first = build(&blocks, &tree, &tree.page_sizes());
        let second = build(&blocks, &tree, &tree.page_sizes());
        prop_assert_eq!(&first, &second);

        for pair in first.windows(2) {
            prop_assert!((pair[0].block_index, pair[0].page_number) <= (pair[1].block_index, pair[1].page_number));
        }
        let expected: usize = rects
            .iter()
            .map(|block| {
                let mut pages: Vec<u32> = block.iter().map(|(p, _)| *p).collect();
                pages.sort();
                pages.dedup();
                pages.len()
            })
            .sum();
        prop_assert_eq!(first.len(), expected);
    }

    #[test]
    fn resolution_terminates_on_reference_graphs(
        edges in prop::collection::vec(0usize..8, 8),
        start in 0usize..8,
    ) {
        let nodes: Vec<Value> = edges
            .iter()
            .map(|target| json!({"$ref": format!("#/nodes/{}", target)}))
            .collect();
        let root = json!({"nodes": nodes});
        let pointer = format!("#/nodes/{}", start);

        let first = resolve(&root, &pointer);
        prop_assert_eq!(first, resolve(&root, &pointer));
        prop_assert!(first.is_none());
    }

    #[test]
    fn arbitrary_pointers_do_not_panic(pointer in "#/[a-z0-9~%/]{0,24}") {
        let root = json!({"a": [{"b": 1}], "~": {"/": 2}});
        let _ = resolve(&root, &pointer);
    }
}
