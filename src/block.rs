//! Content blocks supplied alongside a document tree.
//!
//! Blocks are produced by an upstream pipeline. Two wire shapes are accepted: the
//! camelCase block shape and the database row shape (`block_uid`, `block_locator`,
//! ...). Both deserialize into [`Block`].

use serde::{Deserialize, Serialize};

/// How a block locates its content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    /// A pointer into the document tree
    #[serde(alias = "docling_json_pointer")]
    TreePointer,
    /// Any other locator; such blocks have no geometry
    #[default]
    #[serde(other)]
    Unsupported,
}

/// A content block of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BlockWire")]
pub struct Block {
    /// Stable block identifier
    pub id: String,
    /// 0-based position in the document
    pub index: u32,
    /// Semantic label such as `heading` or `paragraph`
    #[serde(rename = "type")]
    pub block_type: String,
    /// Locator kind
    pub locator_kind: LocatorKind,
    /// Pointer into the document tree, if any
    pub locator_path: Option<String>,
    /// Block text
    pub content_preview: String,
}

impl Block {
    /// Create a block located by a tree pointer.
    pub fn tree_pointer(
        id: impl Into<String>,
        index: u32,
        block_type: impl Into<String>,
        pointer: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            index,
            block_type: block_type.into(),
            locator_kind: LocatorKind::TreePointer,
            locator_path: Some(pointer.into()),
            content_preview: content.into(),
        }
    }

    /// The tree pointer of this block, if it is geometrically resolvable.
    pub fn tree_locator(&self) -> Option<&str> {
        match self.locator_kind {
            LocatorKind::TreePointer => self.locator_path.as_deref(),
            LocatorKind::Unsupported => None,
        }
    }
}

/// Parse a block list from JSON (an array in either accepted shape).
///
/// The payload must be an array; rows that do not describe a block are skipped.
pub fn blocks_from_json(bytes: &[u8]) -> crate::Result<Vec<Block>> {
    let rows: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    let mut blocks = Vec::with_capacity(rows.len());
    for (position, row) in rows.into_iter().enumerate() {
        match serde_json::from_value::<Block>(row) {
            Ok(block) => blocks.push(block),
            Err(e) => log::debug!("Skipping block row {}: {}", position, e),
        }
    }
    Ok(blocks)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BlockWire {
    Row(BlockRow),
    Plain(PlainBlock),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlainBlock {
    id: String,
    index: u32,
    #[serde(rename = "type", default)]
    block_type: String,
    #[serde(default)]
    locator_kind: LocatorKind,
    #[serde(default)]
    locator_path: Option<String>,
    #[serde(default)]
    content_preview: Option<String>,
}

#[derive(Deserialize)]
struct BlockRow {
    block_uid: String,
    block_index: u32,
    #[serde(default)]
    block_type: String,
    #[serde(default)]
    block_locator: Option<RowLocator>,
    #[serde(default)]
    block_content: Option<String>,
}

#[derive(Deserialize)]
struct RowLocator {
    #[serde(rename = "type", default)]
    kind: LocatorKind,
    #[serde(default)]
    pointer: Option<String>,
}

impl From<BlockWire> for Block {
    fn from(wire: BlockWire) -> Self {
        match wire {
            BlockWire::Plain(b) => Block {
                id: b.id,
                index: b.index,
                block_type: b.block_type,
                locator_kind: b.locator_kind,
                locator_path: b.locator_path,
                content_preview: b.content_preview.unwrap_or_default(),
            },
            BlockWire::Row(row) => {
                let (locator_kind, locator_path) = match row.block_locator {
                    Some(locator) => (locator.kind, locator.pointer),
                    None => (LocatorKind::Unsupported, None),
                };
                Block {
                    id: row.block_uid,
                    index: row.block_index,
                    block_type: row.block_type,
                    locator_kind,
                    locator_path,
                    content_preview: row.block_content.unwrap_or_default(),
                }
            },
        }
    }
}
