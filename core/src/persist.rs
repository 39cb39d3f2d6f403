use crate::{DocEntry, Posting, TermId};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const INDEX_VERSION: u32 = 2;

/// Name of the corpus listing written next to the index, one `[none] rfcs/<file>` line per document.
pub const CORPUS_LISTING: &str = "rfcs-full-corpus.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub unique_terms: u32,
    pub avg_doc_length: f32,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn dictionary(&self) -> PathBuf { self.root.join("dictionary.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn terms(&self) -> PathBuf { self.root.join("terms.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn postings_dir(&self) -> PathBuf { self.root.join("postings") }
    fn postings(&self, term_id: TermId) -> PathBuf { self.postings_dir().join(format!("{term_id:08}.postings.bin")) }
    pub fn corpus_listing(&self) -> PathBuf { self.root.join(CORPUS_LISTING) }
}

fn write_bin<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    bincode::serialize_into(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn read_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value = bincode::deserialize_from(BufReader::new(f))
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

pub fn save_dictionary(paths: &IndexPaths, dict: &(HashMap<String, TermId>, Vec<u32>)) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bin(&paths.dictionary(), dict)
}

pub fn load_dictionary(paths: &IndexPaths) -> Result<(HashMap<String, TermId>, Vec<u32>)> {
    read_bin(&paths.dictionary())
}

pub fn save_terms(paths: &IndexPaths, terms: &[String]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bin(&paths.terms(), terms)
}

pub fn load_terms(paths: &IndexPaths) -> Result<Vec<String>> {
    read_bin(&paths.terms())
}

pub fn save_docs(paths: &IndexPaths, docs: &[DocEntry]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bin(&paths.docs(), docs)
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<DocEntry>> {
    read_bin(&paths.docs())
}

pub fn save_postings_for_term(paths: &IndexPaths, term_id: TermId, postings: &[Posting]) -> Result<()> {
    create_dir_all(paths.postings_dir())?;
    write_bin(&paths.postings(term_id), postings)
}

pub fn load_postings_for_term(paths: &IndexPaths, term_id: TermId) -> Result<Vec<Posting>> {
    read_bin(&paths.postings(term_id))
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    if meta.version != INDEX_VERSION {
        anyhow::bail!("index version {} is not supported (expected {INDEX_VERSION})", meta.version);
    }
    Ok(meta)
}

/// Write the corpus listing; `files` are bare file names such as `rfc2001.txt`.
pub fn save_corpus_listing(paths: &IndexPaths, files: &[String]) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut w = BufWriter::new(File::create(paths.corpus_listing())?);
    for file in files {
        writeln!(w, "[none] rfcs/{file}")?;
    }
    w.flush()?;
    Ok(())
}

/// Index header needed to rank and to resolve positions: dictionary, df, terms, docs, meta.
pub struct IndexHeader {
    pub dictionary: HashMap<String, TermId>,
    pub df: Vec<u32>,
    pub terms: Vec<String>,
    pub docs: Vec<DocEntry>,
    pub meta: MetaFile,
}

/// Load only the header structures required to search; postings stay on disk.
pub fn load_index_header(paths: &IndexPaths) -> Result<IndexHeader> {
    let meta = load_meta(paths)?;
    let (dictionary, df) = load_dictionary(paths)?;
    let terms = load_terms(paths)?;
    let docs = load_docs(paths)?;
    if docs.len() != meta.num_docs as usize {
        anyhow::bail!("meta.json declares {} docs but docs.bin holds {}", meta.num_docs, docs.len());
    }
    Ok(IndexHeader { dictionary, df, terms, docs, meta })
}

/// Location of a trained topic model, keyed by the topic count used at training time.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub root: PathBuf,
}

impl ModelPaths {
    pub fn new<P: AsRef<Path>>(models_dir: P, topic_count: usize) -> Self {
        Self { root: models_dir.as_ref().join(format!("lda-pgibbs-{topic_count}")) }
    }
    fn phi(&self) -> PathBuf { self.root.join("phi.bin") }
    fn theta(&self) -> PathBuf { self.root.join("theta.bin") }
    pub fn exists(&self) -> bool { self.phi().is_file() && self.theta().is_file() }
}

/// Topic-term probabilities, one dense row per topic.
pub fn save_phi(paths: &ModelPaths, phi: &[Vec<f64>]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bin(&paths.phi(), phi)
}

pub fn load_phi(paths: &ModelPaths) -> Result<Vec<Vec<f64>>> {
    read_bin(&paths.phi())
}

/// Sparse doc-topic distributions, one row per document position.
pub fn save_theta(paths: &ModelPaths, theta: &[Vec<(u32, f64)>]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bin(&paths.theta(), theta)
}

pub fn load_theta(paths: &ModelPaths) -> Result<Vec<Vec<(u32, f64)>>> {
    read_bin(&paths.theta())
}
