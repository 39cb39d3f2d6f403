use super::coverage::{check_doc_count, topic_name, TopicCoverageTable};
use super::model::{BlTermScorer, LdaModel, TopicId, TopicModel};
use crate::error::Result;
use crate::index::ForwardIndex;
use crate::metadata::{MetadataStore, ScoredRecord};
use parking_lot::RwLock;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_TOPIC_COUNT: usize = 20;
pub const DEFAULT_TOP_TOPICS: usize = 5;
pub const DEFAULT_DOCS_PER_TOPIC: usize = 5;
pub const WORDS_PER_TOPIC: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicWord {
    pub word: String,
    pub p: f64,
}

/// Topics of one document, each with its describing words and exemplary documents.
/// Every map keeps the rank order of `topics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicReport {
    pub k: usize,
    #[serde(serialize_with = "ordered_map")]
    pub topics: Vec<(String, f64)>,
    #[serde(serialize_with = "ordered_map")]
    pub words: Vec<(String, Vec<TopicWord>)>,
    #[serde(serialize_with = "ordered_map")]
    pub docs: Vec<(String, Vec<ScoredRecord>)>,
}

fn ordered_map<S, V>(entries: &Vec<(String, V)>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = s.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// A loaded model and the coverage table derived from it.
pub struct TopicSnapshot {
    pub model: LdaModel,
    pub table: TopicCoverageTable,
    scorer: BlTermScorer,
}

impl TopicSnapshot {
    pub fn new(model: LdaModel, forward: &dyn ForwardIndex) -> Self {
        let table = TopicCoverageTable::build(&model, forward);
        let scorer = BlTermScorer::new(&model);
        Self { model, table, scorer }
    }

    fn load(models_dir: &Path, topic_count: usize, forward: &dyn ForwardIndex) -> Result<Self> {
        let model = LdaModel::load(models_dir, topic_count)?;
        check_doc_count(&model, forward, models_dir, topic_count)?;
        let snapshot = Self::new(model, forward);
        tracing::info!(topic_count, rows = snapshot.table.len(), "built topic coverage table");
        Ok(snapshot)
    }
}

/// Browses topic associations of a document across trained models.
///
/// Snapshots are loaded once per topic count and shared read-only afterwards.
pub struct TopicExplorer {
    models_dir: PathBuf,
    forward: Arc<dyn ForwardIndex + Send + Sync>,
    metadata: Arc<MetadataStore>,
    snapshots: RwLock<HashMap<usize, Arc<TopicSnapshot>>>,
}

impl TopicExplorer {
    pub fn new(
        models_dir: impl Into<PathBuf>,
        forward: Arc<dyn ForwardIndex + Send + Sync>,
        metadata: Arc<MetadataStore>,
    ) -> Self {
        Self { models_dir: models_dir.into(), forward, metadata, snapshots: RwLock::new(HashMap::new()) }
    }

    /// The snapshot for `topic_count`, loading it on first use.
    ///
    /// The load runs with no lock held; when two first loads race, the first insert wins.
    pub fn snapshot(&self, topic_count: usize) -> Result<Arc<TopicSnapshot>> {
        if let Some(s) = self.snapshots.read().get(&topic_count) {
            return Ok(s.clone());
        }
        let loaded = Arc::new(TopicSnapshot::load(&self.models_dir, topic_count, self.forward.as_ref())?);
        let snapshot = self.snapshots.write().entry(topic_count).or_insert(loaded).clone();
        Ok(snapshot)
    }

    /// Up to `k` documents with the highest coverage of `topic`, joined with metadata.
    /// Documents without metadata are left out.
    pub fn topic_docs(&self, topic: TopicId, topic_count: usize, k: usize) -> Result<Vec<ScoredRecord>> {
        let snapshot = self.snapshot(topic_count)?;
        Ok(self.scored_records(snapshot.table.top_docs(topic, k)))
    }

    fn scored_records(&self, docs: Vec<(&str, f64)>) -> Vec<ScoredRecord> {
        docs.into_iter()
            .filter_map(|(id, score)| {
                let record = self.metadata.get(id)?.clone();
                Some(ScoredRecord { record, score })
            })
            .collect()
    }

    /// Top topics of `doc_id` in the `topic_count` model, with words and top documents per topic.
    ///
    /// `Ok(None)` when the document has no row in the coverage table. Top
    /// documents without metadata are left out.
    pub fn get_topics(
        &self,
        doc_id: &str,
        topic_count: usize,
        top_k_topics: usize,
        top_docs_per_topic: usize,
    ) -> Result<Option<TopicReport>> {
        let snapshot = self.snapshot(topic_count)?;
        let table = &snapshot.table;
        if !table.contains(doc_id) {
            tracing::debug!(doc_id, topic_count, "no topic coverage for document");
            return Ok(None);
        }

        let top = table.top_topics(doc_id, top_k_topics);
        let mut report = TopicReport {
            k: topic_count,
            topics: Vec::with_capacity(top.len()),
            words: Vec::with_capacity(top.len()),
            docs: Vec::with_capacity(top.len()),
        };
        for (topic, coverage) in top {
            let name = topic_name(topic);
            let words = snapshot
                .model
                .top_k(topic, WORDS_PER_TOPIC, &snapshot.scorer)
                .into_iter()
                .filter_map(|(term, p)| {
                    let word = self.forward.term_text(term)?;
                    Some(TopicWord { word: word.to_string(), p })
                })
                .collect();
            let docs = self.scored_records(table.top_docs(topic, top_docs_per_topic));
            report.topics.push((name.clone(), coverage));
            report.words.push((name.clone(), words));
            report.docs.push((name, docs));
        }
        Ok(Some(report))
    }
}
