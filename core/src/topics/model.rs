use crate::error::{Error, Result};
use crate::index::{DocPosition, TermId};
use crate::persist::{load_phi, load_theta, save_phi, save_theta, ModelPaths};
use std::path::Path;

/// Zero-based topic ordinal; topic `0` is named `t01`.
pub type TopicId = u32;

/// Read-only view of a trained topic model.
pub trait TopicModel {
    fn num_topics(&self) -> usize;
    fn num_docs(&self) -> usize;
    fn num_terms(&self) -> usize;

    /// p(term | topic), `0.0` when either id is out of range.
    fn term_probability(&self, topic: TopicId, term: TermId) -> f64;

    /// Sparse topic distribution of the document at `doc`. Topics the model
    /// recorded nothing for are absent; an unknown position yields an empty list.
    fn topic_distribution(&self, doc: DocPosition) -> Vec<(TopicId, f64)>;

    /// The `k` best terms of `topic` under `scorer`, best first, ties by term id.
    fn top_k(&self, topic: TopicId, k: usize, scorer: &dyn TermScorer) -> Vec<(TermId, f64)>
    where
        Self: Sized,
    {
        let mut scored: Vec<(TermId, f64)> = (0..self.num_terms() as TermId)
            .map(|term| (term, scorer.score(self, topic, term)))
            .filter(|(_, s)| s.is_finite())
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        scored
    }
}

/// Ranks the terms of a topic.
pub trait TermScorer {
    fn score(&self, model: &dyn TopicModel, topic: TopicId, term: TermId) -> f64;
}

/// Blei-Lafferty term score: `p(w|t) * ln(p(w|t) / geomean_t' p(w|t'))`.
///
/// Favors terms that are likely in this topic and unlikely in the others,
/// which hides corpus-wide filler terms that top every topic by raw probability.
#[derive(Debug, Clone)]
pub struct BlTermScorer {
    /// Mean over topics of ln p(w|t), per term.
    log_mean: Vec<f64>,
}

impl BlTermScorer {
    pub fn new(model: &dyn TopicModel) -> Self {
        let k = model.num_topics().max(1) as f64;
        let log_mean = (0..model.num_terms() as TermId)
            .map(|term| {
                (0..model.num_topics() as TopicId)
                    .map(|topic| model.term_probability(topic, term).max(f64::MIN_POSITIVE).ln())
                    .sum::<f64>()
                    / k
            })
            .collect();
        Self { log_mean }
    }
}

impl TermScorer for BlTermScorer {
    fn score(&self, model: &dyn TopicModel, topic: TopicId, term: TermId) -> f64 {
        let p = model.term_probability(topic, term);
        if p <= 0.0 {
            return 0.0;
        }
        let log_mean = self.log_mean.get(term as usize).copied().unwrap_or(0.0);
        p * (p.ln() - log_mean)
    }
}

/// LDA parameters persisted by the offline topic discovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct LdaModel {
    /// p(term | topic), one dense row per topic.
    phi: Vec<Vec<f64>>,
    /// Recorded (topic, probability) pairs per document position.
    theta: Vec<Vec<(TopicId, f64)>>,
}

impl LdaModel {
    /// Build a model from raw parameters. Every `phi` row must cover the same vocabulary.
    pub fn new(phi: Vec<Vec<f64>>, theta: Vec<Vec<(TopicId, f64)>>) -> anyhow::Result<Self> {
        if let Some(first) = phi.first() {
            if let Some(bad) = phi.iter().position(|row| row.len() != first.len()) {
                anyhow::bail!("topic {bad} covers {} terms, topic 0 covers {}", phi[bad].len(), first.len());
            }
        }
        Ok(Self { phi, theta })
    }

    /// Open the model trained for exactly `topic_count` topics under `models_dir`.
    pub fn load<P: AsRef<Path>>(models_dir: P, topic_count: usize) -> Result<Self> {
        let paths = ModelPaths::new(models_dir, topic_count);
        if !paths.exists() {
            return Err(Error::model_not_found(topic_count, &paths.root, "no trained parameters"));
        }
        let phi = load_phi(&paths).map_err(|e| Error::model_not_found(topic_count, &paths.root, format!("{e:#}")))?;
        let theta = load_theta(&paths).map_err(|e| Error::model_not_found(topic_count, &paths.root, format!("{e:#}")))?;
        let model = Self::new(phi, theta).map_err(|e| Error::model_not_found(topic_count, &paths.root, format!("{e:#}")))?;
        if model.num_topics() != topic_count {
            return Err(Error::model_not_found(
                topic_count,
                &paths.root,
                format!("parameters describe {} topics", model.num_topics()),
            ));
        }
        tracing::info!(
            path = %paths.root.display(),
            topics = topic_count,
            docs = model.num_docs(),
            terms = model.num_terms(),
            "loaded topic model"
        );
        Ok(model)
    }

    pub fn save<P: AsRef<Path>>(&self, models_dir: P) -> anyhow::Result<()> {
        let paths = ModelPaths::new(models_dir, self.num_topics());
        save_phi(&paths, &self.phi)?;
        save_theta(&paths, &self.theta)?;
        Ok(())
    }
}

impl TopicModel for LdaModel {
    fn num_topics(&self) -> usize { self.phi.len() }

    fn num_docs(&self) -> usize { self.theta.len() }

    fn num_terms(&self) -> usize { self.phi.first().map_or(0, Vec::len) }

    fn term_probability(&self, topic: TopicId, term: TermId) -> f64 {
        self.phi
            .get(topic as usize)
            .and_then(|row| row.get(term as usize))
            .copied()
            .unwrap_or(0.0)
    }

    fn topic_distribution(&self, doc: DocPosition) -> Vec<(TopicId, f64)> {
        self.theta.get(doc as usize).cloned().unwrap_or_default()
    }
}
