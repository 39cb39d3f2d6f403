use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // RFC text is full of alphanumeric identifiers (ipv6, http2, tls13), so digits may start a token.
    static ref WORD: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Longest token kept; longer runs are hex dumps, base64 blobs or ASCII art.
const MAX_TOKEN_LEN: usize = 40;

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into stemmed terms using NFKC normalization, lowercase and
/// stopword removal. Indexing and querying must go through this same path.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    WORD.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|token| token.len() <= MAX_TOKEN_LEN && !is_stopword(token))
        .map(|token| STEMMER.stem(token).into_owned())
        .collect()
}

/// Count occurrences of every term in `text`. Returns the counts and the total token count.
pub fn term_frequencies(text: &str) -> (HashMap<String, u32>, u32) {
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut total = 0u32;
    for term in tokenize(text) {
        *counts.entry(term).or_insert(0) += 1;
        total += 1;
    }
    (counts, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Controlling congestion, congested links!");
        assert!(t.iter().any(|w| w == "congest"));
    }

    #[test]
    fn keeps_alphanumeric_identifiers() {
        let t = tokenize("IPv6 over 802.11 with TLS13");
        assert!(t.contains(&"ipv6".to_string()));
        assert!(t.contains(&"802".to_string()));
        assert!(t.contains(&"tls13".to_string()));
    }

    #[test]
    fn counts_terms() {
        let (tf, total) = term_frequencies("window window the segment");
        assert_eq!(tf.get("window"), Some(&2));
        assert_eq!(tf.get("segment"), Some(&1));
        assert_eq!(total, 3);
    }
}
