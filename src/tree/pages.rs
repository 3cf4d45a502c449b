//! Page geometry table extraction.

use super::{as_page_number, page_size_entry, PAGES_KEY};
use crate::geometry::PageSizes;
use serde_json::Value;

/// Build the page number → page size table from a document tree.
///
/// The top-level `pages` container may be an object keyed by page number or an array
/// of entries. An entry whose key is not a page number may name its page with
/// `page_no`. Entries with an invalid page number or non-positive / non-finite
/// dimensions are skipped; the valid ones are still returned.
///
/// # Examples
///
/// ```
/// use block_highlighter::tree::extract_page_sizes;
/// use serde_json::json;
///
/// let tree = json!({"pages": {
///     "1": {"size": {"width": 600, "height": 800}},
///     "2": {"size": {"width": "nope", "height": 800}}
/// }});
/// let sizes = extract_page_sizes(&tree);
/// assert_eq!(sizes.len(), 1);
/// assert_eq!(sizes.get(1).unwrap().height, 800.0);
/// ```
pub fn extract_page_sizes(root: &Value) -> PageSizes {
    let mut sizes = PageSizes::new();

    match root.get(PAGES_KEY) {
        Some(Value::Object(pages)) => {
            for (key, entry) in pages {
                let page_number = key
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .or_else(|| entry.get("page_no").and_then(as_page_number));
                match page_number.and_then(|n| page_size_entry(n, entry)) {
                    Some(size) => sizes.insert(size),
                    None => log::debug!("Skipping page entry '{}': no usable number or size", key),
                }
            }
        },
        Some(Value::Array(pages)) => {
            for (position, entry) in pages.iter().enumerate() {
                let size = entry
                    .get("page_no")
                    .and_then(as_page_number)
                    .and_then(|n| page_size_entry(n, entry));
                match size {
                    Some(size) => sizes.insert(size),
                    None => log::debug!("Skipping page entry at position {}", position),
                }
            }
        },
        _ => log::debug!("Document tree has no '{}' container", PAGES_KEY),
    }

    sizes
}
