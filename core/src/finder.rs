use crate::config::FinderConfig;
use crate::error::Result;
use crate::index::CorpusIndex;
use crate::metadata::{MetadataStore, ScoredRecord};
use crate::persist::IndexPaths;
use crate::search::SearchService;
use crate::topics::{TopicExplorer, TopicId, TopicReport};
use std::sync::Arc;

/// Everything a running service needs, built once at startup and shared by handlers.
pub struct RfcFinder {
    config: FinderConfig,
    metadata: Arc<MetadataStore>,
    index: Arc<CorpusIndex>,
    search: SearchService,
    topics: TopicExplorer,
}

impl RfcFinder {
    /// Load metadata and open the corpus index; both failures are fatal.
    /// A missing default topic model is only logged: topic requests then fail one by one.
    pub fn open(config: FinderConfig) -> Result<Self> {
        let metadata = Arc::new(MetadataStore::open(&config.metadata_path)?);
        let index = Arc::new(CorpusIndex::open(IndexPaths::new(&config.index_dir))?);
        let search = SearchService::new(index.clone(), metadata.clone());
        let topics = TopicExplorer::new(&config.models_dir, index.clone(), metadata.clone());
        if let Err(err) = topics.snapshot(config.topic_count) {
            tracing::warn!(error = %err, "topic browsing unavailable until a model is trained");
        }
        Ok(Self { config, metadata, index, search, topics })
    }

    pub fn config(&self) -> &FinderConfig { &self.config }

    pub fn metadata(&self) -> &MetadataStore { &self.metadata }

    pub fn index(&self) -> &CorpusIndex { &self.index }

    /// Search with the configured relevance parameters; `top_k` falls back to the configured one.
    pub fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<ScoredRecord>> {
        self.search.search(query, top_k.unwrap_or(self.config.top_k), &self.config.bm25)
    }

    /// Best documents of `topic`; `topic_count` falls back to the configured model.
    pub fn topic_docs(&self, topic: TopicId, topic_count: Option<usize>) -> Result<Vec<ScoredRecord>> {
        self.topics.topic_docs(topic, topic_count.unwrap_or(self.config.topic_count), self.config.docs_per_topic)
    }

    /// Topics of `doc_id`; `topic_count` falls back to the configured model.
    pub fn get_topics(&self, doc_id: &str, topic_count: Option<usize>) -> Result<Option<TopicReport>> {
        self.topics.get_topics(
            doc_id,
            topic_count.unwrap_or(self.config.topic_count),
            self.config.top_topics,
            self.config.docs_per_topic,
        )
    }
}
