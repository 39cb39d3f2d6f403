use crate::persist::{
    save_corpus_listing, save_dictionary, save_docs, save_meta, save_postings_for_term, save_terms, IndexPaths,
    MetaFile, INDEX_VERSION,
};
use crate::tokenizer::term_frequencies;
use crate::{DocEntry, DocPosition, Posting, TermId};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

/// Accumulates documents in corpus order and writes the persisted corpus index.
///
/// Positions are assigned in the order documents are added, so callers feed
/// documents in listing order.
#[derive(Default)]
pub struct IndexBuilder {
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    df: Vec<u32>,
    postings: Vec<Vec<Posting>>,
    docs: Vec<DocEntry>,
    total_length: u64,
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    /// Tokenize `text` and append it as the next document. `path` is relative to the corpus root.
    pub fn add_document(&mut self, path: impl Into<String>, text: &str) -> DocPosition {
        let doc = self.docs.len() as DocPosition;
        let (counts, length) = term_frequencies(text);
        // Sorted so term ids are assigned deterministically.
        let mut counts: Vec<(String, u32)> = counts.into_iter().collect();
        counts.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        for (term, tf) in counts {
            let tid = match self.dictionary.get(&term) {
                Some(&tid) => tid,
                None => {
                    let tid = self.terms.len() as TermId;
                    self.dictionary.insert(term.clone(), tid);
                    self.terms.push(term);
                    self.df.push(0);
                    self.postings.push(Vec::new());
                    tid
                }
            };
            self.df[tid as usize] += 1;
            self.postings[tid as usize].push(Posting { doc, tf });
        }
        self.docs.push(DocEntry { path: path.into(), length });
        self.total_length += u64::from(length);
        doc
    }

    pub fn num_docs(&self) -> usize { self.docs.len() }

    /// Persist dictionary, terms, docs, postings, the corpus listing and meta.json under `paths`.
    pub fn write(self, paths: &IndexPaths, created_at: String) -> Result<MetaFile> {
        let num_docs = self.docs.len() as u32;
        let avg_doc_length = if num_docs == 0 { 0.0 } else { (self.total_length as f64 / num_docs as f64) as f32 };

        for (tid, plist) in self.postings.iter().enumerate() {
            save_postings_for_term(paths, tid as TermId, plist)?;
        }
        let listing: Vec<String> = self
            .docs
            .iter()
            .map(|d| Path::new(&d.path).file_name().map_or_else(|| d.path.clone(), |f| f.to_string_lossy().into_owned()))
            .collect();
        save_corpus_listing(paths, &listing)?;
        save_terms(paths, &self.terms)?;
        save_docs(paths, &self.docs)?;
        let unique_terms = self.terms.len() as u32;
        save_dictionary(paths, &(self.dictionary, self.df))?;

        let meta = MetaFile { num_docs, unique_terms, avg_doc_length, created_at, version: INDEX_VERSION };
        // meta.json goes last: a half-written index has none and fails to open.
        save_meta(paths, &meta)?;
        tracing::info!(
            root = %paths.root.display(),
            num_docs,
            unique_terms,
            avg_doc_length,
            "corpus index written"
        );
        Ok(meta)
    }
}
