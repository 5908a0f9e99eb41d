// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Fits a single pipeline with fixed hyperparameters:
//
//   Step 1: Prepare labeled splits    (Layer 2 - prepare)
//   Step 2: Save config               (Layer 6 - infra)
//   Step 3: Fit the pipeline          (Layer 5 - ml)
//   Step 4: Score train and eval      (Layer 5 - ml)
//   Step 5: Save the snapshot         (Layer 6 - infra)
//
// Output layout:
//   <output_dir>/train_config.json
//   <output_dir>/model/{model.mpk, tokenizer.json, pipeline.json}
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::prepare::prepare_data;
use crate::data::splitter::SplitConfig;
use crate::infra::checkpoint::write_json;
use crate::ml::pipeline::{Pipeline, PipelineConfig};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data:       Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub split:      SplitConfig,
    pub pipeline:   PipelineConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data:       vec![PathBuf::from("data/posts.jsonl")],
            output_dir: PathBuf::from("runs/train"),
            split:      SplitConfig::default(),
            pipeline:   PipelineConfig::default(),
        }
    }
}

/// What a training run produced, for the CLI to print.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub threshold:      f64,
    pub total:          usize,
    /// Records labeled popular, before the split
    pub positives:      usize,
    pub train_size:     usize,
    pub eval_size:      usize,
    pub train_accuracy: f64,
    pub eval_accuracy:  f64,
    pub model_dir:      PathBuf,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainSummary> {
        let cfg = &self.config;
        cfg.pipeline.validate()?;

        // ── Step 1: Prepare labeled splits ───────────────────────────────────
        let data = prepare_data(&cfg.data, &cfg.split)?;

        // ── Step 2: Save config next to the outputs ──────────────────────────
        fs::create_dir_all(&cfg.output_dir).with_context(|| {
            format!("Cannot create output directory '{}'", cfg.output_dir.display())
        })?;
        write_json(&cfg.output_dir.join("train_config.json"), cfg)?;

        // ── Step 3: Fit ──────────────────────────────────────────────────────
        tracing::info!(
            "Fitting pipeline: alpha={}, lr={}, epochs={}",
            cfg.pipeline.alpha,
            cfg.pipeline.learning_rate,
            cfg.pipeline.epochs
        );
        let pipeline = Pipeline::fit(cfg.pipeline.clone(), &data.train)?;

        // ── Step 4: Score ────────────────────────────────────────────────────
        let train_accuracy = pipeline.evaluate(&data.train)?;
        let eval_accuracy  = pipeline.evaluate(&data.eval)?;

        // ── Step 5: Save ─────────────────────────────────────────────────────
        let model_dir = cfg.output_dir.join("model");
        pipeline.save(&model_dir)?;
        tracing::info!("Saved model to '{}'", model_dir.display());

        Ok(TrainSummary {
            threshold:  data.threshold,
            total:      data.total,
            positives:  data.positives,
            train_size: data.train.len(),
            eval_size:  data.eval.len(),
            train_accuracy,
            eval_accuracy,
            model_dir,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::write_posts;

    #[test]
    fn test_train_writes_loadable_model() {
        let tmp    = tempfile::tempdir().unwrap();
        let posts  = write_posts(tmp.path(), "posts.jsonl", 40);
        let config = TrainConfig {
            data:       vec![posts],
            output_dir: tmp.path().join("out"),
            split:      SplitConfig { held_out_fraction: 0.25, seed: Some(11) },
            pipeline:   PipelineConfig { learning_rate: 0.1, ..PipelineConfig::default() },
        };

        let summary = TrainUseCase::new(config).execute().unwrap();
        assert_eq!(summary.total, 40);
        assert_eq!((summary.train_size, summary.eval_size), (30, 10));
        assert_eq!(summary.train_accuracy, 1.0);
        assert!((0.0..=1.0).contains(&summary.eval_accuracy));

        assert!(tmp.path().join("out/train_config.json").is_file());
        let loaded = Pipeline::load(&summary.model_dir).unwrap();
        assert_eq!(loaded.rounds_completed(), 5);
    }

    #[test]
    fn test_missing_file_fails() {
        let tmp    = tempfile::tempdir().unwrap();
        let config = TrainConfig {
            data:       vec![tmp.path().join("absent.jsonl")],
            output_dir: tmp.path().join("out"),
            ..TrainConfig::default()
        };
        assert!(TrainUseCase::new(config).execute().is_err());
    }
}
