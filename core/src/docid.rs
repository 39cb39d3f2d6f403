//! Doc-id conventions shared by the corpus files, the metadata file and the
//! topic tables.
//!
//! A doc-id is `RFC` followed by the RFC number zero padded to four digits
//! (`RFC0001`, `RFC2001`, `RFC10000`). Corpus files are named `rfc<digits>.txt`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CORPUS_FILE: Regex = Regex::new(r"rfc(\d+)\.txt$").expect("valid regex");
    static ref BARE_FILE: Regex = Regex::new(r"^rfc\d+\.txt$").expect("valid regex");
    static ref DOC_ID: Regex = Regex::new(r"\d+").expect("valid regex");
}

const RFC_EDITOR_BASE: &str = "https://www.rfc-editor.org/rfc/rfc";

/// Canonical doc-id for an RFC number.
pub fn canonical_doc_id(number: u32) -> String {
    format!("RFC{number:04}")
}

/// Map a corpus path such as `rfcs/rfc793.txt` to `RFC0793`.
pub fn doc_id_from_path(path: &str) -> Option<String> {
    let caps = CORPUS_FILE.captures(path)?;
    let number: u32 = caps[1].parse().ok()?;
    Some(canonical_doc_id(number))
}

/// RFC number carried by a doc-id, with leading zeroes dropped.
pub fn rfc_number(doc_id: &str) -> Option<u32> {
    DOC_ID.find(doc_id)?.as_str().parse().ok()
}

/// Canonical RFC Editor URL for a doc-id, or an empty string when it carries no number.
pub fn canonical_url(doc_id: &str) -> String {
    match rfc_number(doc_id) {
        Some(n) => format!("{RFC_EDITOR_BASE}{n}.html"),
        None => String::new(),
    }
}

/// True for bare corpus file names (`rfc2001.txt`), used when scanning a corpus directory.
pub fn is_corpus_file_name(name: &str) -> bool {
    BARE_FILE.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_four_digits() {
        assert_eq!(doc_id_from_path("rfcs/rfc1.txt").as_deref(), Some("RFC0001"));
        assert_eq!(doc_id_from_path("rfcs/rfc5681.txt").as_deref(), Some("RFC5681"));
        assert_eq!(doc_id_from_path("/corpus/rfcs/rfc10000.txt").as_deref(), Some("RFC10000"));
    }

    #[test]
    fn rejects_other_files() {
        assert_eq!(doc_id_from_path("rfcs/rfc-index.xml"), None);
        assert_eq!(doc_id_from_path("rfcs/bcp14.txt"), None);
        assert!(!is_corpus_file_name("rfc1.txt.bak"));
        assert!(is_corpus_file_name("rfc0793.txt"));
    }

    #[test]
    fn url_drops_leading_zeroes() {
        assert_eq!(canonical_url("RFC0001"), "https://www.rfc-editor.org/rfc/rfc1.html");
        assert_eq!(canonical_url("RFC5681"), "https://www.rfc-editor.org/rfc/rfc5681.html");
        assert_eq!(canonical_url("RFC"), "");
    }
}
