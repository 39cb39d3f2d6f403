use std::path::PathBuf;

/// Errors surfaced by the finder core.
///
/// A missing doc-id is never an error: lookups return `None` or an empty
/// result instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The metadata source is malformed or lacks the `rfc-index` root.
    #[error("failed to parse metadata: {0}")]
    Parse(String),

    /// The persisted corpus index is missing or corrupt.
    #[error("index unavailable at {}: {reason}", path.display())]
    IndexUnavailable { path: PathBuf, reason: String },

    /// No trained topic model exists for the requested topic count.
    #[error("no topic model trained for {topic_count} topics at {}: {reason}", path.display())]
    ModelNotFound {
        topic_count: usize,
        path: PathBuf,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn index_unavailable(path: impl Into<PathBuf>, err: anyhow::Error) -> Self {
        Error::IndexUnavailable { path: path.into(), reason: format!("{err:#}") }
    }

    pub(crate) fn model_not_found(topic_count: usize, path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::ModelNotFound { topic_count, path: path.into(), reason: reason.into() }
    }
}
