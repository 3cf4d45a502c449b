//! Document sources: where blocks and document trees come from.

use crate::block::{blocks_from_json, Block};
use crate::error::{Error, Result};
use crate::tree::DocumentTree;
use std::path::{Path, PathBuf};

/// Supplier of the two per-document inputs.
///
/// Failures should be reported as [`Error::BlockFetch`] / [`Error::TreeFetch`] (or
/// [`Error::InvalidJson`] for a malformed payload).
pub trait DocumentSource {
    /// Blocks of a document, ordered by index.
    fn fetch_blocks(&self, document_id: &str) -> Result<Vec<Block>>;

    /// The document's parsed tree.
    fn fetch_document_tree(&self, document_id: &str) -> Result<DocumentTree>;
}

/// Reads `<dir>/<id>.blocks.json` and `<dir>/<id>.tree.json`.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    dir: PathBuf,
}

impl FsDocumentSource {
    /// Source rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a document's block list.
    pub fn blocks_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}.blocks.json", document_id))
    }

    /// Path of a document's tree.
    pub fn tree_path(&self, document_id: &str) -> PathBuf {
        self.dir.join(format!("{}.tree.json", document_id))
    }
}

fn read(path: &Path) -> std::result::Result<Vec<u8>, String> {
    std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))
}

impl DocumentSource for FsDocumentSource {
    fn fetch_blocks(&self, document_id: &str) -> Result<Vec<Block>> {
        let bytes = read(&self.blocks_path(document_id)).map_err(|reason| Error::BlockFetch {
            document_id: document_id.to_string(),
            reason,
        })?;
        let mut blocks = blocks_from_json(&bytes)?;
        blocks.sort_by_key(|b| b.index);
        Ok(blocks)
    }

    fn fetch_document_tree(&self, document_id: &str) -> Result<DocumentTree> {
        let bytes = read(&self.tree_path(document_id)).map_err(|reason| Error::TreeFetch {
            document_id: document_id.to_string(),
            reason,
        })?;
        DocumentTree::from_slice(&bytes)
    }
}
