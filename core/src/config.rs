use crate::index::Bm25Params;
use crate::search::DEFAULT_TOP_K;
use crate::topics::explorer::{DEFAULT_DOCS_PER_TOPIC, DEFAULT_TOPIC_COUNT, DEFAULT_TOP_TOPICS};
use std::path::PathBuf;

/// Where a service instance finds its artifacts, and the defaults it answers with.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// `rfc-index.xml` from the RFC Editor.
    pub metadata_path: PathBuf,
    /// Corpus index written by `finder-indexer build`.
    pub index_dir: PathBuf,
    /// Directory holding `lda-pgibbs-<k>/` trained models.
    pub models_dir: PathBuf,
    pub topic_count: usize,
    pub top_k: usize,
    pub bm25: Bm25Params,
    pub top_topics: usize,
    pub docs_per_topic: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            metadata_path: PathBuf::from("./corpus/rfcs/rfc-index.xml"),
            index_dir: PathBuf::from("./idx"),
            models_dir: PathBuf::from("./models"),
            topic_count: DEFAULT_TOPIC_COUNT,
            top_k: DEFAULT_TOP_K,
            bm25: Bm25Params::default(),
            top_topics: DEFAULT_TOP_TOPICS,
            docs_per_topic: DEFAULT_DOCS_PER_TOPIC,
        }
    }
}
