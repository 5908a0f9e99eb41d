// ============================================================
// Layer 5 — Training Pipeline
// ============================================================
// Pairs the bag-of-words Vocabulary with the LinearClassifier
// into one fit / predict unit:
//
//   text ──► Vocabulary::transform ──► sparse counts
//        ──► FeatureBatcher ──► [batch, n_features]
//        ──► LinearClassifier ──► score ──► score > 0
//
// The Pipeline owns ALL mutable state (vocabulary + weights).
// partial_fit consumes the pipeline and returns the next
// version with rounds_completed bumped by one, so every caller
// holds an explicit, versioned copy of the state.
//
// The vocabulary is learned once, from the training texts
// handed to initialize(). Later passes re-vectorize the text
// against that same vocabulary; refitting it on identical
// training data would produce the same mapping anyway.
//
// Reference: Burn Book §5 (Training, Inference)

use anyhow::{anyhow, ensure, Result};
use burn::{data::dataloader::batcher::Batcher, module::AutodiffModule};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{batcher::FeatureBatcher, dataset::EncodedSample};
use crate::domain::record::LabeledRecord;
use crate::infra::checkpoint;
use crate::ml::model::{LinearClassifier, LinearClassifierConfig};
use crate::ml::trainer::{device, train_pass, InferBackend, PassSettings, PassStats, TrainBackend};
use crate::ml::vectorizer::Vocabulary;

// Texts scored per forward pass at prediction time
const PREDICT_BATCH_SIZE: usize = 256;

// ─── Pipeline Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// L2 regularization strength
    pub alpha:         f64,
    pub learning_rate: f64,
    /// Passes run by `fit`
    pub epochs:        usize,
    pub batch_size:    usize,
    /// Base shuffle seed; pass n shuffles with seed + n
    pub seed:          u64,
    /// Keep only the most frequent words
    pub max_features:  Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alpha:         1e-4,
            learning_rate: 0.01,
            epochs:        5,
            batch_size:    16,
            seed:          42,
            max_features:  None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.alpha.is_finite() && self.alpha >= 0.0,
            "alpha must be a finite non-negative number, got {}",
            self.alpha
        );
        ensure!(
            self.learning_rate.is_finite() && self.learning_rate > 0.0,
            "learning rate must be a finite positive number, got {}",
            self.learning_rate
        );
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(self.batch_size > 0, "batch size must be at least 1");
        ensure!(self.max_features != Some(0), "max_features must be at least 1");
        Ok(())
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────
pub struct Pipeline {
    config:           PipelineConfig,
    vocabulary:       Vocabulary,
    model:            LinearClassifier<TrainBackend>,
    rounds_completed: usize,
}

impl Pipeline {
    /// Learn the vocabulary from `training` and start from zero weights.
    pub fn initialize(config: PipelineConfig, training: &[LabeledRecord]) -> Result<Self> {
        config.validate()?;
        ensure!(!training.is_empty(), "Cannot fit a pipeline on zero records");

        let texts: Vec<&str> = training.iter().map(|r| r.text.as_str()).collect();
        let vocabulary = Vocabulary::fit(&texts, config.max_features)?;
        let model = LinearClassifierConfig::new(vocabulary.len()).init(&device());

        tracing::debug!(
            "Pipeline initialised: {} features, alpha={}",
            vocabulary.len(),
            config.alpha
        );

        Ok(Self {
            config,
            vocabulary,
            model,
            rounds_completed: 0,
        })
    }

    /// Rebuild a pipeline from persisted parts.
    pub fn from_parts(
        config:           PipelineConfig,
        vocabulary:       Vocabulary,
        model:            LinearClassifier<TrainBackend>,
        rounds_completed: usize,
    ) -> Self {
        Self { config, vocabulary, model, rounds_completed }
    }

    /// initialize + `config.epochs` passes.
    pub fn fit(config: PipelineConfig, training: &[LabeledRecord]) -> Result<Self> {
        let epochs = config.epochs;
        let mut pipeline = Self::initialize(config, training)?;

        for epoch in 1..=epochs {
            let (next, stats) = pipeline.partial_fit(training)?;
            pipeline = next;
            tracing::info!(
                "Epoch {:>2}/{} | train_loss={:.4}",
                epoch,
                epochs,
                stats.mean_loss
            );
        }
        Ok(pipeline)
    }

    /// One incremental pass starting from the current weights.
    pub fn partial_fit(self, training: &[LabeledRecord]) -> Result<(Self, PassStats)> {
        let samples  = self.encode(training)?;
        let settings = PassSettings {
            alpha:         self.config.alpha,
            learning_rate: self.config.learning_rate,
            batch_size:    self.config.batch_size,
            seed:          self.config.seed.wrapping_add(self.rounds_completed as u64),
        };

        let Self { config, vocabulary, model, rounds_completed } = self;
        let (model, stats) = train_pass(model, samples, vocabulary.len(), settings)?;

        let next = Self {
            config,
            vocabulary,
            model,
            rounds_completed: rounds_completed + 1,
        };
        Ok((next, stats))
    }

    /// Raw decision scores, one per text.
    pub fn decision_scores<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model   = self.model.valid();
        let batcher = FeatureBatcher::<InferBackend>::new(device(), self.vocabulary.len());

        let mut scores = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(PREDICT_BATCH_SIZE) {
            let samples = chunk
                .iter()
                .map(|t| Ok(EncodedSample::new(self.vocabulary.transform(t.as_ref())?, false)))
                .collect::<Result<Vec<_>>>()?;

            let batch  = batcher.batch(samples);
            let values = model
                .forward(batch.features)
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("Cannot read classifier scores: {e:?}"))?;
            scores.extend(values);
        }
        Ok(scores)
    }

    /// One popularity label per text. Unknown words are ignored.
    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<bool>> {
        Ok(self
            .decision_scores(texts)?
            .into_iter()
            .map(|s| s > 0.0)
            .collect())
    }

    /// Fraction of records whose predicted label matches, in [0, 1].
    pub fn evaluate(&self, data: &[LabeledRecord]) -> Result<f64> {
        ensure!(!data.is_empty(), "Cannot evaluate on zero records");

        let texts: Vec<&str> = data.iter().map(|r| r.text.as_str()).collect();
        let predictions      = self.predict(&texts)?;

        let correct = predictions
            .iter()
            .zip(data)
            .filter(|(p, r)| **p == r.label)
            .count();
        Ok(correct as f64 / data.len() as f64)
    }

    /// Write a complete snapshot into `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        checkpoint::write_snapshot(dir, self)
    }

    /// Load a snapshot written by `save`.
    pub fn load(dir: &Path) -> Result<Self> {
        checkpoint::read_snapshot(dir)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn model(&self) -> &LinearClassifier<TrainBackend> {
        &self.model
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    fn encode(&self, records: &[LabeledRecord]) -> Result<Vec<EncodedSample>> {
        records
            .iter()
            .map(|r| Ok(EncodedSample::new(self.vocabulary.transform(&r.text)?, r.label)))
            .collect()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;

    fn records(rows: &[(&str, bool)]) -> Vec<LabeledRecord> {
        rows.iter()
            .map(|(t, label)| LabeledRecord {
                text:  t.to_string(),
                score: if *label { 10.0 } else { 0.0 },
                label: *label,
            })
            .collect()
    }

    fn training() -> Vec<LabeledRecord> {
        records(&[
            ("amazing news today", true),
            ("great thing happened", true),
            ("amazing great launch", true),
            ("great amazing results", true),
            ("boring post", false),
            ("another boring post", false),
            ("dull boring update", false),
            ("dull post again", false),
        ])
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            learning_rate: 0.1,
            batch_size:    4,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_fit_learns_separable_words() {
        let pipeline = Pipeline::fit(config(), &training()).unwrap();
        assert_eq!(pipeline.rounds_completed(), 5);
        assert_eq!(pipeline.evaluate(&training()).unwrap(), 1.0);

        let held_out = records(&[("amazing update", true), ("boring news", false)]);
        let acc = pipeline.evaluate(&held_out).unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn test_predict_handles_unseen_words() {
        let pipeline = Pipeline::fit(config(), &training()).unwrap();
        let labels   = pipeline.predict(&["zebra quantum", "xylophone"]).unwrap();
        assert_eq!(labels.len(), 2);
        assert!(pipeline.predict::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let a = Pipeline::fit(config(), &training()).unwrap();
        let b = Pipeline::fit(config(), &training()).unwrap();
        let texts = ["amazing post", "boring news", "great dull thing"];
        assert_eq!(
            a.decision_scores(&texts).unwrap(),
            b.decision_scores(&texts).unwrap()
        );
    }

    #[test]
    fn test_partial_fit_bumps_version() {
        let p = Pipeline::initialize(config(), &training()).unwrap();
        assert_eq!(p.rounds_completed(), 0);
        let (p, stats) = p.partial_fit(&training()).unwrap();
        let (p, _)     = p.partial_fit(&training()).unwrap();
        assert_eq!(p.rounds_completed(), 2);
        assert_eq!(stats.batches, 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let bad = PipelineConfig { alpha: -1.0, ..config() };
        assert!(Pipeline::initialize(bad, &training()).is_err());
        let bad = PipelineConfig { batch_size: 0, ..config() };
        assert!(Pipeline::initialize(bad, &training()).is_err());
        let bad = PipelineConfig { learning_rate: f64::NAN, ..config() };
        assert!(Pipeline::initialize(bad, &training()).is_err());
    }

    #[test]
    fn test_evaluate_rejects_empty_set() {
        let pipeline = Pipeline::fit(config(), &training()).unwrap();
        assert!(pipeline.evaluate(&[]).is_err());
    }

    #[test]
    fn test_reloaded_snapshot_reproduces_accuracy() {
        let dir      = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::fit(config(), &training()).unwrap();
        let eval     = records(&[
            ("amazing update", true),
            ("boring news", false),
            ("great post", true),
            ("dull thing", false),
        ]);

        pipeline.save(dir.path()).unwrap();
        let loaded = Pipeline::load(dir.path()).unwrap();

        assert_eq!(loaded.rounds_completed(), 5);
        assert_eq!(loaded.config(), pipeline.config());
        assert_eq!(loaded.evaluate(&eval).unwrap(), pipeline.evaluate(&eval).unwrap());
        assert_eq!(
            loaded.decision_scores(&["amazing boring"]).unwrap(),
            pipeline.decision_scores(&["amazing boring"]).unwrap()
        );
    }

    #[test]
    fn test_training_accuracy_not_below_held_out_on_average() {
        use crate::data::splitter::{split_train_eval, SplitConfig};

        // Titles share vocabulary only loosely, so held-out accuracy suffers.
        let corpus: Vec<Record> = (0..60)
            .map(|i| {
                let popular = i % 2 == 0;
                let word    = if popular { "amazing" } else { "boring" };
                Record::new(format!("{word} story number{i} topic{}", i % 7), if popular { 9.0 } else { 1.0 })
            })
            .collect();
        let labeled = crate::data::labeler::label_records(corpus).unwrap();

        let (mut train_sum, mut eval_sum) = (0.0, 0.0);
        for seed in 0..4 {
            let split = SplitConfig { held_out_fraction: 0.25, seed: Some(seed) };
            let (train, eval) = split_train_eval(labeled.records.clone(), &split).unwrap();
            let pipeline = Pipeline::fit(config(), &train).unwrap();
            train_sum += pipeline.evaluate(&train).unwrap();
            eval_sum  += pipeline.evaluate(&eval).unwrap();
        }
        assert!(train_sum >= eval_sum, "train {train_sum} < eval {eval_sum}");
    }
}
