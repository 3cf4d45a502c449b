//! Document tree boundary.
//!
//! The tree is an opaque JSON value produced by an external parser. This module is
//! the only place that looks at its shape: nodes are classified into a small set of
//! expected forms ([`NodeShape`]) and every field is checked before use. Everything
//! downstream works with typed values.

use crate::error::Result;
use crate::geometry::{CoordOrigin, PageSize, PageSizes, RawRect};
use serde_json::{Map, Value};

mod pages;

pub use pages::extract_page_sizes;

/// Key holding an indirect reference inside a node.
pub const REFERENCE_KEY: &str = "$ref";

/// Key holding a node's provenance list.
pub const PROVENANCE_KEY: &str = "prov";

/// Top-level key holding per-page metadata.
pub const PAGES_KEY: &str = "pages";

/// An immutable parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTree {
    root: Value,
}

impl DocumentTree {
    /// Wrap an already parsed JSON value.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parse a tree from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_slice(bytes)?))
    }

    /// Parse a tree from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_str(json)?))
    }

    /// The root value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Page geometry table for this tree.
    pub fn page_sizes(&self) -> PageSizes {
        extract_page_sizes(&self.root)
    }
}

/// The forms a tree node is recognised in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeShape<'a> {
    /// An object whose `$ref` string points elsewhere in the tree.
    Reference {
        /// Pointer to follow
        target: &'a str,
        /// Whether the object has fields besides `$ref`
        carries_content: bool,
    },
    /// An object with a provenance list.
    Located {
        /// Raw provenance entries
        provenance: &'a [Value],
    },
    /// Anything else.
    Other,
}

impl<'a> NodeShape<'a> {
    /// Classify a node.
    pub fn classify(node: &'a Value) -> Self {
        let Some(object) = node.as_object() else {
            return NodeShape::Other;
        };
        if let Some(target) = object.get(REFERENCE_KEY).and_then(Value::as_str) {
            return NodeShape::Reference {
                target,
                carries_content: object.len() > 1,
            };
        }
        match object.get(PROVENANCE_KEY).and_then(Value::as_array) {
            Some(provenance) => NodeShape::Located { provenance },
            None => NodeShape::Other,
        }
    }
}

/// One provenance box together with the page it was recorded on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvenanceRect {
    /// 1-based page number
    pub page_number: u32,
    /// Box in the source's coordinate convention
    pub rect: RawRect,
}

/// Extract the provenance boxes of a node.
///
/// Entries without a usable page number or without all four box edges are dropped.
/// Entries whose box declares no (or an unrecognised) origin use `default_origin`.
/// A node without a provenance list yields nothing.
pub fn provenance_rects(node: &Value, default_origin: CoordOrigin) -> Vec<ProvenanceRect> {
    let provenance = match NodeShape::classify(node) {
        NodeShape::Located { provenance } => provenance,
        // A node that carries both a reference and its own provenance still counts.
        NodeShape::Reference {
            carries_content: true,
            ..
        } => match node.get(PROVENANCE_KEY).and_then(Value::as_array) {
            Some(provenance) => provenance.as_slice(),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    provenance
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_object()?;
            let page_number = entry.get("page_no").and_then(as_page_number)?;
            let bbox = entry.get("bbox").and_then(Value::as_object)?;
            let rect = raw_rect(bbox, default_origin)?;
            Some(ProvenanceRect { page_number, rect })
        })
        .collect()
}

fn raw_rect(bbox: &Map<String, Value>, default_origin: CoordOrigin) -> Option<RawRect> {
    let edge = |key: &str| bbox.get(key).and_then(as_number);
    let origin = match bbox.get("coord_origin").and_then(Value::as_str) {
        Some(tag) => CoordOrigin::parse(tag).unwrap_or_else(|| {
            log::debug!("Unrecognised coord_origin '{}', assuming {:?}", tag, default_origin);
            default_origin
        }),
        None => default_origin,
    };
    Some(RawRect::new(edge("l")?, edge("t")?, edge("r")?, edge("b")?, origin))
}

/// Read a JSON number, also accepting numeric strings.
///
/// Non-finite strings such as `"inf"` are returned as parsed so that callers can
/// reject them explicitly.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Read a positive integral page number from a number or numeric string.
pub(crate) fn as_page_number(value: &Value) -> Option<u32> {
    let number = as_number(value)?;
    if number.is_finite() && number >= 1.0 && number.fract() == 0.0 && number <= u32::MAX as f64 {
        Some(number as u32)
    } else {
        None
    }
}

/// Read a page size entry of the form `{"size": {"width": w, "height": h}}`.
pub(crate) fn page_size_entry(page_number: u32, entry: &Value) -> Option<PageSize> {
    let size = entry.get("size")?;
    let width = size.get("width").and_then(as_number)?;
    let height = size.get("height").and_then(as_number)?;
    PageSize::new(page_number, width, height)
}
