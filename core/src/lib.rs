pub mod builder;
pub mod config;
pub mod docid;
pub mod error;
pub mod finder;
pub mod index;
pub mod metadata;
pub mod persist;
pub mod search;
pub mod tokenizer;
pub mod topics;

pub use builder::IndexBuilder;
pub use config::FinderConfig;
pub use error::{Error, Result};
pub use finder::RfcFinder;
pub use index::*;
pub use metadata::{DocumentRecord, MetadataStore, ScoredRecord};
pub use search::SearchService;
