use super::model::{LdaModel, TopicId, TopicModel};
use crate::docid::doc_id_from_path;
use crate::error::{Error, Result};
use crate::index::{DocPosition, ForwardIndex};
use crate::persist::ModelPaths;
use std::collections::HashMap;
use std::path::Path;

/// Column name of a topic: topic `0` is `t01`.
pub fn topic_name(topic: TopicId) -> String {
    format!("t{:02}", topic + 1)
}

/// Inverse of [`topic_name`].
pub fn parse_topic_name(name: &str) -> Option<TopicId> {
    let digits = name.strip_prefix('t')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let ordinal: TopicId = digits.parse().ok()?;
    ordinal.checked_sub(1)
}

fn by_value_desc<K: Ord>(a: &(K, f64), b: &(K, f64)) -> std::cmp::Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Dense per-document topic coverage.
///
/// One row per doc-id (sorted ascending), one column per topic. A cell is
/// `None` when the model recorded no coverage for that pair; such cells are
/// never ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCoverageTable {
    topic_count: usize,
    doc_ids: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
    row_index: HashMap<String, usize>,
}

impl TopicCoverageTable {
    /// Scatter the model's sparse distributions into one row per corpus document.
    pub fn build(model: &dyn TopicModel, forward: &dyn ForwardIndex) -> Self {
        let topic_count = model.num_topics();
        let mut rows: Vec<(String, Vec<Option<f64>>)> = Vec::with_capacity(forward.num_docs());
        for pos in 0..forward.num_docs() as DocPosition {
            let Some(doc_id) = forward.doc_path(pos).and_then(doc_id_from_path) else {
                tracing::warn!(position = pos, path = ?forward.doc_path(pos), "skipping document outside the rfc naming scheme");
                continue;
            };
            let mut row = vec![None; topic_count];
            for (topic, p) in model.topic_distribution(pos) {
                match row.get_mut(topic as usize) {
                    Some(cell) => *cell = Some(p),
                    None => tracing::warn!(%doc_id, topic, topic_count, "topic id out of range"),
                }
            }
            rows.push((doc_id, row));
        }
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.dedup_by(|next, kept| {
            let dup = next.0 == kept.0;
            if dup {
                tracing::warn!(doc_id = %next.0, "document listed twice in the corpus index");
            }
            dup
        });

        let row_index = rows.iter().enumerate().map(|(i, (id, _))| (id.clone(), i)).collect();
        let (doc_ids, rows) = rows.into_iter().unzip();
        Self { topic_count, doc_ids, rows, row_index }
    }

    /// Open the model trained for `topic_count` topics and build its table.
    pub fn load<P: AsRef<Path>>(models_dir: P, topic_count: usize, forward: &dyn ForwardIndex) -> Result<Self> {
        let model = LdaModel::load(&models_dir, topic_count)?;
        check_doc_count(&model, forward, &models_dir, topic_count)?;
        Ok(Self::build(&model, forward))
    }

    pub fn topic_count(&self) -> usize { self.topic_count }

    pub fn len(&self) -> usize { self.rows.len() }

    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    pub fn contains(&self, doc_id: &str) -> bool { self.row_index.contains_key(doc_id) }

    pub fn doc_ids(&self) -> &[String] { &self.doc_ids }

    pub fn row(&self, doc_id: &str) -> Option<&[Option<f64>]> {
        self.row_index.get(doc_id).map(|&i| self.rows[i].as_slice())
    }

    /// Up to `k` recorded topics of `doc_id`, highest coverage first, ties by topic ordinal.
    pub fn top_topics(&self, doc_id: &str, k: usize) -> Vec<(TopicId, f64)> {
        let Some(row) = self.row(doc_id) else {
            return Vec::new();
        };
        let mut cells: Vec<(TopicId, f64)> = row
            .iter()
            .enumerate()
            .filter_map(|(t, cell)| cell.map(|p| (t as TopicId, p)))
            .collect();
        cells.sort_by(by_value_desc);
        cells.truncate(k);
        cells
    }

    /// Up to `k` documents with the highest recorded coverage of `topic`, ties by doc-id.
    pub fn top_docs(&self, topic: TopicId, k: usize) -> Vec<(&str, f64)> {
        let mut cells: Vec<(&str, f64)> = self
            .doc_ids
            .iter()
            .zip(&self.rows)
            .filter_map(|(id, row)| row.get(topic as usize).copied().flatten().map(|p| (id.as_str(), p)))
            .collect();
        cells.sort_by(by_value_desc);
        cells.truncate(k);
        cells
    }
}

pub(crate) fn check_doc_count<P: AsRef<Path>>(
    model: &dyn TopicModel,
    forward: &dyn ForwardIndex,
    models_dir: P,
    topic_count: usize,
) -> Result<()> {
    if model.num_docs() != forward.num_docs() {
        return Err(Error::model_not_found(
            topic_count,
            ModelPaths::new(models_dir, topic_count).root,
            format!(
                "model covers {} documents but the corpus index holds {}; re-run topic discovery",
                model.num_docs(),
                forward.num_docs()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TermId;

    struct Paths(Vec<&'static str>);

    impl ForwardIndex for Paths {
        fn num_docs(&self) -> usize { self.0.len() }
        fn doc_path(&self, doc: DocPosition) -> Option<&str> { self.0.get(doc as usize).copied() }
        fn term_text(&self, _term: TermId) -> Option<&str> { None }
    }

    fn fixture() -> (LdaModel, Paths) {
        let model = LdaModel::new(
            vec![vec![1.0]; 4],
            vec![
                vec![(0, 0.6), (2, 0.2), (3, 0.2)],
                vec![(1, 0.7), (0, 0.3)],
                vec![(0, 0.6)],
                vec![(2, 1.0)],
            ],
        )
        .unwrap();
        let paths = Paths(vec!["rfcs/rfc793.txt", "rfcs/rfc2001.txt", "rfcs/rfc0001.txt", "rfcs/readme.txt"]);
        (model, paths)
    }

    #[test]
    fn rows_are_sorted_by_doc_id() {
        let (model, paths) = fixture();
        let table = TopicCoverageTable::build(&model, &paths);
        assert_eq!(table.doc_ids(), &["RFC0001", "RFC0793", "RFC2001"]);
        assert_eq!(table.topic_count(), 4);
        assert_eq!(table.row("RFC2001").unwrap(), &[Some(0.3), Some(0.7), None, None]);
    }

    #[test]
    fn top_topics_skip_unrecorded_cells() {
        let (model, paths) = fixture();
        let table = TopicCoverageTable::build(&model, &paths);
        assert_eq!(table.top_topics("RFC0793", 2), vec![(0, 0.6), (2, 0.2)]);
        assert_eq!(table.top_topics("RFC0793", 10), vec![(0, 0.6), (2, 0.2), (3, 0.2)]);
        assert_eq!(table.top_topics("RFC0001", 5), vec![(0, 0.6)]);
        assert!(table.top_topics("RFC9999", 5).is_empty());
    }

    #[test]
    fn top_docs_break_ties_by_doc_id() {
        let (model, paths) = fixture();
        let table = TopicCoverageTable::build(&model, &paths);
        assert_eq!(table.top_docs(0, 5), vec![("RFC0001", 0.6), ("RFC0793", 0.6), ("RFC2001", 0.3)]);
        assert_eq!(table.top_docs(0, 1), vec![("RFC0001", 0.6)]);
        assert_eq!(table.top_docs(3, 5), vec![("RFC0793", 0.2)]);
        assert!(table.top_docs(9, 5).is_empty());
    }

    #[test]
    fn build_is_deterministic() {
        let (model, paths) = fixture();
        assert_eq!(TopicCoverageTable::build(&model, &paths), TopicCoverageTable::build(&model, &paths));
    }

    #[test]
    fn topic_names_round_trip() {
        assert_eq!(topic_name(0), "t01");
        assert_eq!(topic_name(19), "t20");
        assert_eq!(topic_name(119), "t120");
        assert_eq!(parse_topic_name("t07"), Some(6));
        assert_eq!(parse_topic_name("t00"), None);
        assert_eq!(parse_topic_name("x01"), None);
        assert_eq!(parse_topic_name("t120"), Some(119));
    }

    #[test]
    fn topic_names_need_plain_digits() {
        assert_eq!(parse_topic_name("t+1"), None);
        assert_eq!(parse_topic_name("t-1"), None);
        assert_eq!(parse_topic_name("t"), None);
        assert_eq!(parse_topic_name("t 1"), None);
        assert_eq!(parse_topic_name("T01"), None);
    }

    #[test]
    fn load_rejects_mismatched_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let (model, _) = fixture();
        model.save(dir.path()).unwrap();
        let short = Paths(vec!["rfcs/rfc1.txt"]);
        let err = TopicCoverageTable::load(dir.path(), 4, &short).unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
        let (_, paths) = fixture();
        assert_eq!(TopicCoverageTable::load(dir.path(), 4, &paths).unwrap().len(), 3);
    }
}
