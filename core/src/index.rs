use crate::error::{Error, Result};
use crate::persist::{load_index_header, load_postings_for_term, IndexPaths, MetaFile};
use crate::tokenizer::term_frequencies;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
/// Position of a document in the corpus index, assigned in corpus listing order.
pub type DocPosition = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocEntry {
    /// Path relative to the corpus root, e.g. `rfcs/rfc2001.txt`.
    pub path: String,
    /// Number of indexed tokens.
    pub length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: DocPosition,
    pub tf: u32,
}

/// Okapi BM25 relevance parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
    pub k3: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.785, k3: 500.0 }
    }
}

/// Position-level view of the corpus: document paths and term texts.
pub trait ForwardIndex {
    fn num_docs(&self) -> usize;
    fn doc_path(&self, doc: DocPosition) -> Option<&str>;
    fn term_text(&self, term: TermId) -> Option<&str>;
}

/// A ranked-retrieval backend.
///
/// `rank` returns at most `top_k` `(position, score)` pairs ordered by
/// descending score; equal scores keep ascending position order.
pub trait RankingEngine: ForwardIndex {
    fn rank(&self, query: &str, params: &Bm25Params, top_k: usize) -> Result<Vec<(DocPosition, f32)>>;
}

/// The persisted corpus index opened read-only: the header lives in memory,
/// postings are read from disk per query term.
pub struct CorpusIndex {
    paths: IndexPaths,
    dictionary: HashMap<String, TermId>,
    df: Vec<u32>,
    terms: Vec<String>,
    docs: Vec<DocEntry>,
    meta: MetaFile,
}

impl CorpusIndex {
    pub fn open(paths: IndexPaths) -> Result<Self> {
        let header = load_index_header(&paths).map_err(|e| Error::index_unavailable(&paths.root, e))?;
        tracing::info!(
            root = %paths.root.display(),
            num_docs = header.meta.num_docs,
            unique_terms = header.meta.unique_terms,
            "opened corpus index"
        );
        Ok(Self {
            paths,
            dictionary: header.dictionary,
            df: header.df,
            terms: header.terms,
            docs: header.docs,
            meta: header.meta,
        })
    }

    pub fn meta(&self) -> &MetaFile { &self.meta }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.dictionary.get(term).copied() }

    fn postings(&self, term_id: TermId) -> Result<Vec<Posting>> {
        load_postings_for_term(&self.paths, term_id).map_err(|e| Error::index_unavailable(&self.paths.root, e))
    }
}

impl ForwardIndex for CorpusIndex {
    fn num_docs(&self) -> usize { self.docs.len() }

    fn doc_path(&self, doc: DocPosition) -> Option<&str> {
        self.docs.get(doc as usize).map(|d| d.path.as_str())
    }

    fn term_text(&self, term: TermId) -> Option<&str> {
        self.terms.get(term as usize).map(String::as_str)
    }
}

impl RankingEngine for CorpusIndex {
    fn rank(&self, query: &str, params: &Bm25Params, top_k: usize) -> Result<Vec<(DocPosition, f32)>> {
        if top_k == 0 || self.docs.is_empty() {
            return Ok(Vec::new());
        }
        // Ordered by term id so score accumulation is deterministic.
        let (raw, _) = term_frequencies(query);
        let query_tf: BTreeMap<TermId, u32> = raw
            .into_iter()
            .filter_map(|(term, qtf)| self.term_id(&term).map(|tid| (tid, qtf)))
            .collect();
        if query_tf.is_empty() {
            return Ok(Vec::new());
        }

        let n = self.docs.len() as f32;
        let avg_dl = if self.meta.avg_doc_length > 0.0 { self.meta.avg_doc_length } else { 1.0 };
        let mut scores = vec![0.0f32; self.docs.len()];
        let mut touched = vec![false; self.docs.len()];

        for (tid, qtf) in query_tf {
            let df = *self.df.get(tid as usize).unwrap_or(&0) as f32;
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
            let qtf = qtf as f32;
            let query_weight = ((params.k3 + 1.0) * qtf) / (params.k3 + qtf);
            for p in self.postings(tid)? {
                let Some(entry) = self.docs.get(p.doc as usize) else {
                    tracing::warn!(doc = p.doc, term = tid, "posting points past the document table");
                    continue;
                };
                let tf = p.tf as f32;
                let norm = params.k1 * ((1.0 - params.b) + params.b * entry.length as f32 / avg_dl);
                scores[p.doc as usize] += idf * (tf * (params.k1 + 1.0)) / (tf + norm) * query_weight;
                touched[p.doc as usize] = true;
            }
        }

        let mut ranked: Vec<(DocPosition, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|(pos, _)| touched[*pos])
            .map(|(pos, score)| (pos as DocPosition, score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(top_k);
        tracing::debug!(query, hits = ranked.len(), "ranked query");
        Ok(ranked)
    }
}
