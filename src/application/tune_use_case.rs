// ============================================================
// Layer 2 — TuneUseCase
// ============================================================
// Runs the hyperparameter search:
//
//   Step 1: Prepare labeled splits     (Layer 2 - prepare)
//   Step 2: Save config                (Layer 6 - infra)
//   Step 3: Put splits in the store    (Layer 7 - search)
//   Step 4: Run all trials             (Layer 7 - search)
//
// Every trial starts from `base` with its own alpha and
// learning rate swapped in.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::prepare::prepare_data;
use crate::data::splitter::SplitConfig;
use crate::infra::checkpoint::write_json;
use crate::ml::pipeline::PipelineConfig;
use crate::search::{
    coordinator::SearchOutcome,
    runner::{run_search, SearchOptions},
    space::SearchSpace,
    store::DatasetStore,
    trial::PipelineTrainable,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneConfig {
    pub data:       Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub split:      SplitConfig,
    pub space:      SearchSpace,
    pub options:    SearchOptions,
    /// Settings shared by every trial
    pub base:       PipelineConfig,
}

impl Default for TuneConfig {
    fn default() -> Self {
        Self {
            data:       vec![PathBuf::from("data/posts.jsonl")],
            output_dir: PathBuf::from("runs/tune"),
            split:      SplitConfig::default(),
            space:      SearchSpace::default(),
            options:    SearchOptions::default(),
            base:       PipelineConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TuneSummary {
    pub threshold:  f64,
    pub positives:  usize,
    pub train_size: usize,
    pub eval_size:  usize,
    pub outcome:    SearchOutcome,
}

pub struct TuneUseCase {
    config: TuneConfig,
}

impl TuneUseCase {
    pub fn new(config: TuneConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TuneSummary> {
        let cfg = &self.config;

        // Reject a bad search before reading any data
        cfg.space.validate()?;
        cfg.options.validate()?;
        cfg.base.validate()?;

        // ── Step 1: Prepare labeled splits ───────────────────────────────────
        let data = prepare_data(&cfg.data, &cfg.split)?;
        let (train_size, eval_size) = (data.train.len(), data.eval.len());

        // ── Step 2: Save config ──────────────────────────────────────────────
        fs::create_dir_all(&cfg.output_dir).with_context(|| {
            format!("Cannot create output directory '{}'", cfg.output_dir.display())
        })?;
        write_json(&cfg.output_dir.join("search_config.json"), cfg)?;

        // ── Step 3: Shared datasets ──────────────────────────────────────────
        let handle = DatasetStore::put(data.train, data.eval)?;

        // ── Step 4: Search ───────────────────────────────────────────────────
        let base    = cfg.base.clone();
        let outcome = run_search(
            &cfg.space,
            &cfg.options,
            &handle,
            &cfg.output_dir,
            move |trial, data| PipelineTrainable::new(trial, &base, data),
        )?;

        Ok(TuneSummary {
            threshold: data.threshold,
            positives: data.positives,
            train_size,
            eval_size,
            outcome,
        })
    }
}
