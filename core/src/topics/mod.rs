//! Topic-model browsing: the trained model boundary, the per-document
//! coverage table derived from it, and the explorer answering topic queries.

pub mod coverage;
pub mod explorer;
pub mod model;

pub use coverage::{parse_topic_name, topic_name, TopicCoverageTable};
pub use explorer::{TopicExplorer, TopicReport, TopicSnapshot, TopicWord};
pub use model::{BlTermScorer, LdaModel, TermScorer, TopicId, TopicModel};
