//! Error types for the highlighter.
//!
//! Only load-level failures and rejected selections surface as errors. Per-block
//! resolution problems and scroll misses are absorbed where they happen.

/// Result type alias for highlighter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading a document or driving selection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The block list could not be fetched
    #[error("Failed to load blocks for document '{document_id}': {reason}")]
    BlockFetch {
        /// Document whose blocks were requested
        document_id: String,
        /// Reason reported by the source
        reason: String,
    },

    /// The document tree could not be fetched
    #[error("Failed to load document tree for '{document_id}': {reason}")]
    TreeFetch {
        /// Document whose tree was requested
        document_id: String,
        /// Reason reported by the source
        reason: String,
    },

    /// Tree or block payload is not valid JSON
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Selection requested for an id that is not in the current highlight index
    #[error("Unknown highlight: {0}")]
    UnknownHighlight(String),

    /// Load results delivered with a ticket that was never issued by this session
    #[error("Unknown load ticket for document '{0}'")]
    UnknownLoad(String),

    /// Configuration could not be read
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error belongs to the load-level class that blocks the whole view.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Error::BlockFetch { .. } | Error::TreeFetch { .. } | Error::InvalidJson(_) | Error::Io(_)
        )
    }
}
