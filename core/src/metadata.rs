use crate::docid::canonical_url;
use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::path::Path;

/// Normalized metadata of one RFC, immutable after load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentRecord {
    #[serde(rename = "doc-id")]
    pub doc_id: String,
    pub title: String,
    /// Author names in source order; rendered as one comma-joined string on the wire.
    #[serde(serialize_with = "serialize_authors")]
    pub authors: Vec<String>,
    /// Rendered as a string on the wire; `""` when unknown.
    #[serde(serialize_with = "serialize_optional_number")]
    pub year: Option<u16>,
    #[serde(serialize_with = "serialize_optional_number")]
    pub pages: Option<u32>,
    pub status: String,
    pub area: String,
    pub wg: String,
    pub stream: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
}

impl DocumentRecord {
    /// Record for a doc-id with no known metadata: every field empty except the id.
    pub fn unknown(doc_id: impl Into<String>) -> Self {
        Self { doc_id: doc_id.into(), ..Self::default() }
    }
}

/// A record with the relevance or coverage score it was retrieved with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: DocumentRecord,
    pub score: f64,
}

fn serialize_authors<S: Serializer>(authors: &[String], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&authors.join(", "))
}

fn serialize_optional_number<S, N>(value: &Option<N>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    N: std::fmt::Display,
{
    match value {
        Some(n) => s.collect_str(n),
        None => s.serialize_str(""),
    }
}

// Raw shape of `rfc-index.xml`. Only `rfc-entry` children are kept; the
// interleaved bcp/fyi/std/not-issued entries are skipped by serde. Every
// field defaults, so an entry with an odd shape loads with what it has.
#[derive(Debug, Deserialize)]
struct RawIndex {
    #[serde(rename = "rfc-entry", default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEntry {
    #[serde(rename = "doc-id")]
    doc_id: String,
    title: String,
    #[serde(rename = "author")]
    authors: Vec<RawAuthor>,
    date: RawDate,
    #[serde(rename = "page-count")]
    page_count: String,
    #[serde(rename = "current-status")]
    current_status: String,
    area: String,
    wg_acronym: String,
    stream: String,
    #[serde(rename = "abstract")]
    abstract_: Option<RawAbstract>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAuthor {
    name: String,
    // `<author>Jane Doe</author>` without a `<name>` child.
    #[serde(rename = "$text")]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDate {
    year: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAbstract {
    #[serde(rename = "p")]
    paragraphs: Vec<String>,
    #[serde(rename = "$text")]
    text: String,
}

fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl From<RawEntry> for DocumentRecord {
    fn from(raw: RawEntry) -> Self {
        let doc_id = raw.doc_id.trim().to_string();
        let authors = raw
            .authors
            .into_iter()
            .map(|a| squash_whitespace(if a.name.trim().is_empty() { &a.text } else { &a.name }))
            .filter(|name| !name.is_empty())
            .collect();
        let abstract_text = raw
            .abstract_
            .map(|a| {
                a.paragraphs
                    .iter()
                    .chain(std::iter::once(&a.text))
                    .map(|p| squash_whitespace(p))
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        let url = canonical_url(&doc_id);
        Self {
            title: squash_whitespace(&raw.title),
            authors,
            year: raw.date.year.trim().parse().ok(),
            pages: raw.page_count.trim().parse().ok(),
            status: raw.current_status.trim().to_string(),
            area: raw.area.trim().to_string(),
            wg: raw.wg_acronym.trim().to_string(),
            stream: raw.stream.trim().to_string(),
            abstract_text,
            url,
            doc_id,
        }
    }
}

/// All RFC records in source order plus a doc-id → position index.
#[derive(Debug, Default)]
pub struct MetadataStore {
    records: Vec<DocumentRecord>,
    index: HashMap<String, usize>,
}

impl MetadataStore {
    /// Read and parse an `rfc-index.xml` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let xml = std::fs::read_to_string(path)?;
        let store = Self::load(&xml)?;
        tracing::info!(path = %path.display(), records = store.len(), "loaded rfc metadata");
        Ok(store)
    }

    /// Parse the text of an `rfc-index.xml` document.
    pub fn load(xml: &str) -> Result<Self> {
        check_root(xml)?;
        let raw: RawIndex = quick_xml::de::from_str(xml).map_err(|e| Error::Parse(e.to_string()))?;
        Ok(Self::from_records(raw.entries.into_iter().map(DocumentRecord::from)))
    }

    /// Build the store from already normalized records. The first record wins on duplicate ids.
    pub fn from_records<I: IntoIterator<Item = DocumentRecord>>(records: I) -> Self {
        let mut store = Self::default();
        for record in records {
            if record.doc_id.is_empty() {
                tracing::warn!(title = %record.title, "skipping rfc entry without doc-id");
                continue;
            }
            if store.index.contains_key(&record.doc_id) {
                tracing::warn!(doc_id = %record.doc_id, "duplicate rfc entry ignored");
                continue;
            }
            store.index.insert(record.doc_id.clone(), store.records.len());
            store.records.push(record);
        }
        store
    }

    pub fn get(&self, doc_id: &str) -> Option<&DocumentRecord> {
        self.index.get(doc_id).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

/// serde does not look at the root element name, so check it up front.
fn check_root(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"rfc-index" {
                    return Ok(());
                }
                return Err(Error::Parse(format!(
                    "expected <rfc-index> root, found <{}>",
                    String::from_utf8_lossy(name.as_ref())
                )));
            }
            Ok(Event::Eof) => return Err(Error::Parse("missing <rfc-index> root".into())),
            Ok(_) => {}
            Err(e) => return Err(Error::Parse(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rfc-index xmlns="https://www.rfc-editor.org/rfc-index">
  <bcp-entry><doc-id>BCP0001</doc-id><is-also><doc-id>RFC1818</doc-id></is-also></bcp-entry>
  <rfc-entry>
    <doc-id>RFC0001</doc-id>
    <title>Host Software</title>
    <author><name>S. Crocker</name></author>
    <date><month>April</month><year>1969</year></date>
    <format><file-format>ASCII</file-format></format>
    <page-count>11</page-count>
    <current-status>UNKNOWN</current-status>
    <publication-status>UNKNOWN</publication-status>
    <stream>Legacy</stream>
  </rfc-entry>
  <rfc-not-issued-entry><doc-id>RFC0014</doc-id></rfc-not-issued-entry>
  <rfc-entry>
    <doc-id>RFC5681</doc-id>
    <title>TCP Congestion Control</title>
    <author><name>M. Allman</name></author>
    <author><name>V. Paxson</name></author>
    <date><month>September</month><year>2009</year></date>
    <page-count>18</page-count>
    <keywords><kw>TCP</kw></keywords>
    <abstract><p>This document defines TCP's four intertwined congestion control algorithms.</p><p>It obsoletes RFC 2581.</p></abstract>
    <obsoletes><doc-id>RFC2581</doc-id></obsoletes>
    <current-status>DRAFT STANDARD</current-status>
    <stream>IETF</stream>
    <area>tsv</area>
    <wg_acronym>tcpm</wg_acronym>
  </rfc-entry>
</rfc-index>"#;

    #[test]
    fn normalizes_single_and_multiple_authors() {
        let store = MetadataStore::load(SAMPLE).unwrap();
        assert_eq!(store.len(), 2);
        let one = store.get("RFC0001").unwrap();
        assert_eq!(one.authors, vec!["S. Crocker"]);
        let two = store.get("RFC5681").unwrap();
        assert_eq!(two.authors, vec!["M. Allman", "V. Paxson"]);
    }

    #[test]
    fn joins_abstract_paragraphs() {
        let store = MetadataStore::load(SAMPLE).unwrap();
        let r = store.get("RFC5681").unwrap();
        assert_eq!(
            r.abstract_text,
            "This document defines TCP's four intertwined congestion control algorithms. It obsoletes RFC 2581."
        );
        assert_eq!(r.area, "tsv");
        assert_eq!(r.wg, "tcpm");
        assert_eq!(r.year, Some(2009));
        assert_eq!(r.pages, Some(18));
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let store = MetadataStore::load(SAMPLE).unwrap();
        let r = store.get("RFC0001").unwrap();
        assert_eq!(r.area, "");
        assert_eq!(r.wg, "");
        assert_eq!(r.abstract_text, "");
        assert_eq!(r.stream, "Legacy");
        assert_eq!(r.url, "https://www.rfc-editor.org/rfc/rfc1.html");
    }

    #[test]
    fn missing_ids_are_not_errors() {
        let store = MetadataStore::load(SAMPLE).unwrap();
        assert!(store.get("RFC0014").is_none());
        assert!(store.get("RFC9999").is_none());
        assert!(store.get("").is_none());
    }

    #[test]
    fn rejects_wrong_root() {
        let err = MetadataStore::load("<catalog><rfc-entry/></catalog>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
        let err = MetadataStore::load("").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn rejects_malformed_xml() {
        let err = MetadataStore::load("<rfc-index><rfc-entry><doc-id>RFC0001</rfc-entry>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn serializes_wire_shape() {
        let store = MetadataStore::load(SAMPLE).unwrap();
        let v = serde_json::to_value(store.get("RFC5681").unwrap()).unwrap();
        assert_eq!(v["doc-id"], "RFC5681");
        assert_eq!(v["authors"], "M. Allman, V. Paxson");
        assert!(!v["abstract"].as_str().unwrap().is_empty());
        assert_eq!(v["year"], "2009");
        assert_eq!(v["pages"], "18");
    }

    #[test]
    fn unknown_year_and_pages_are_empty_strings() {
        let v = serde_json::to_value(DocumentRecord::unknown("RFC8000")).unwrap();
        assert_eq!(v["year"], "");
        assert_eq!(v["pages"], "");
        assert_eq!(v["authors"], "");
    }

    #[test]
    fn tolerates_oddly_shaped_entries() {
        let xml = r#"<rfc-index>
  <rfc-entry>
    <doc-id>RFC0100</doc-id>
    <title>Before</title>
    <author><name>A. Before</name></author>
    <date><year>1971</year></date>
  </rfc-entry>
  <rfc-entry>
    <doc-id>RFC0101</doc-id>
    <title>Odd</title>
    <author>Jane Doe</author>
    <date/>
    <page-count>many</page-count>
    <abstract>Plain text</abstract>
  </rfc-entry>
  <rfc-entry>
    <doc-id>RFC0102</doc-id>
    <title>After</title>
    <author><name>B. After</name></author>
    <author><name>C. After</name></author>
    <abstract><p>First.</p><p>Second.</p></abstract>
  </rfc-entry>
</rfc-index>"#;
        let store = MetadataStore::load(xml).unwrap();
        assert_eq!(store.len(), 3);

        let odd = store.get("RFC0101").unwrap();
        assert_eq!(odd.authors, vec!["Jane Doe"]);
        assert_eq!(odd.abstract_text, "Plain text");
        assert_eq!(odd.year, None);
        assert_eq!(odd.pages, None);

        let before = store.get("RFC0100").unwrap();
        assert_eq!(before.authors, vec!["A. Before"]);
        assert_eq!(before.year, Some(1971));
        let after = store.get("RFC0102").unwrap();
        assert_eq!(after.authors, vec!["B. After", "C. After"]);
        assert_eq!(after.abstract_text, "First. Second.");
    }
}
