use crate::docid::doc_id_from_path;
use crate::error::Result;
use crate::index::{Bm25Params, RankingEngine};
use crate::metadata::{DocumentRecord, MetadataStore, ScoredRecord};
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 10;

/// Free-text search over the corpus, enriched with RFC metadata.
#[derive(Clone)]
pub struct SearchService {
    engine: Arc<dyn RankingEngine + Send + Sync>,
    metadata: Arc<MetadataStore>,
}

impl SearchService {
    pub fn new(engine: Arc<dyn RankingEngine + Send + Sync>, metadata: Arc<MetadataStore>) -> Self {
        Self { engine, metadata }
    }

    /// Rank `query` and join every hit with its metadata.
    ///
    /// Hits are never dropped: a document without metadata comes back with
    /// empty fields and its score, so the result count matches the engine's.
    pub fn search(&self, query: &str, top_k: usize, params: &Bm25Params) -> Result<Vec<ScoredRecord>> {
        let ranked = self.engine.rank(query, params, top_k)?;
        let results = ranked
            .into_iter()
            .map(|(pos, score)| {
                let doc_id = self.engine.doc_path(pos).and_then(doc_id_from_path);
                let record = match doc_id {
                    Some(id) => self.metadata.get(&id).cloned().unwrap_or_else(|| {
                        tracing::debug!(doc_id = %id, "search hit has no metadata");
                        DocumentRecord::unknown(id)
                    }),
                    None => {
                        tracing::warn!(position = pos, "search hit does not follow the rfc<digits>.txt naming");
                        DocumentRecord::default()
                    }
                };
                ScoredRecord { record, score: f64::from(score) }
            })
            .collect::<Vec<_>>();
        tracing::info!(query, top_k, hits = results.len(), "search");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::index::{DocPosition, ForwardIndex, TermId};
    use std::path::PathBuf;

    /// Engine returning a fixed ranking, or failing like an unreadable index.
    struct Canned {
        paths: Vec<&'static str>,
        ranking: Option<Vec<(DocPosition, f32)>>,
    }

    impl ForwardIndex for Canned {
        fn num_docs(&self) -> usize { self.paths.len() }
        fn doc_path(&self, doc: DocPosition) -> Option<&str> { self.paths.get(doc as usize).copied() }
        fn term_text(&self, _term: TermId) -> Option<&str> { None }
    }

    impl RankingEngine for Canned {
        fn rank(&self, _query: &str, _params: &Bm25Params, top_k: usize) -> Result<Vec<(DocPosition, f32)>> {
            match &self.ranking {
                Some(r) => Ok(r.iter().copied().take(top_k).collect()),
                None => Err(Error::IndexUnavailable { path: PathBuf::from("idx"), reason: "gone".into() }),
            }
        }
    }

    fn store() -> Arc<MetadataStore> {
        Arc::new(MetadataStore::from_records([
            DocumentRecord { doc_id: "RFC2001".into(), title: "TCP Slow Start".into(), ..Default::default() },
            DocumentRecord { doc_id: "RFC5681".into(), title: "TCP Congestion Control".into(), ..Default::default() },
        ]))
    }

    #[test]
    fn keeps_hits_without_metadata() {
        let engine = Canned {
            paths: vec!["rfcs/rfc5681.txt", "rfcs/rfc8999.txt", "rfcs/rfc2001.txt", "rfcs/notes.txt"],
            ranking: Some(vec![(0, 9.0), (1, 5.0), (2, 5.0), (3, 1.0)]),
        };
        let svc = SearchService::new(Arc::new(engine), store());
        let hits = svc.search("congestion", 10, &Bm25Params::default()).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.record.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["RFC5681", "RFC8999", "RFC2001", ""]);
        assert_eq!(hits[0].record.title, "TCP Congestion Control");
        assert_eq!(hits[1].record.title, "");
        assert_eq!(hits[1].score, 5.0);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn respects_top_k() {
        let engine = Canned { paths: vec!["rfc2001.txt", "rfc5681.txt"], ranking: Some(vec![(1, 2.0), (0, 1.0)]) };
        let svc = SearchService::new(Arc::new(engine), store());
        let hits = svc.search("tcp", 1, &Bm25Params::default()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.doc_id, "RFC5681");
    }

    #[test]
    fn surfaces_unavailable_index() {
        let engine = Canned { paths: vec![], ranking: None };
        let svc = SearchService::new(Arc::new(engine), store());
        let err = svc.search("tcp", 10, &Bm25Params::default()).unwrap_err();
        assert!(matches!(err, Error::IndexUnavailable { .. }));
    }
}
