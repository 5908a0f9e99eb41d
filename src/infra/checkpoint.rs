// ============================================================
// Layer 6 — Checkpoints
// ============================================================
// Two concerns live here:
//
// 1. Pipeline snapshots. A snapshot is a directory holding
//    everything needed to rebuild a Pipeline for prediction:
//
//      <snapshot>/
//        model.mpk        ← classifier weights (NamedMpkFileRecorder)
//        tokenizer.json   ← fitted vocabulary
//        pipeline.json    ← PipelineConfig, n_features, rounds_completed
//
//    Weights are stored at full precision so a reloaded pipeline
//    scores exactly like the one that was saved.
//
// 2. Per-trial round checkpoints (CheckpointManager):
//
//      trial_000_alpha=0.0001_lr=0.01/
//        round_3/             ← snapshot after round 3
//        round_5/             ← snapshot after round 5
//        latest_round.json    ← 5
//        params.json
//
//    A round is written into round_<n>.tmp and renamed into
//    place once complete; only then does latest_round.json move
//    (itself via write + rename). A reader therefore never sees
//    a half-written round through the pointer.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, ensure, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::{LinearClassifierConfig, LinearClassifierRecord};
use crate::ml::pipeline::{Pipeline, PipelineConfig};
use crate::ml::trainer::{device, TrainBackend};
use crate::ml::vectorizer::Vocabulary;

const MODEL_FILE:     &str = "model";
const TOKENIZER_FILE: &str = "tokenizer.json";
const META_FILE:      &str = "pipeline.json";
const LATEST_FILE:    &str = "latest_round.json";
const PARAMS_FILE:    &str = "params.json";

/// Everything in a snapshot besides the weights and the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PipelineMeta {
    config:           PipelineConfig,
    n_features:       usize,
    rounds_completed: usize,
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// Write a full pipeline snapshot into `dir` (created if missing).
pub fn write_snapshot(dir: &Path, pipeline: &Pipeline) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create snapshot directory '{}'", dir.display()))?;

    let model_path = dir.join(MODEL_FILE);
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
        .record(pipeline.model().clone().into_record(), model_path.clone())
        .with_context(|| format!("Failed to save weights to '{}'", model_path.display()))?;

    pipeline.vocabulary().save(&dir.join(TOKENIZER_FILE))?;

    let meta = PipelineMeta {
        config:           pipeline.config().clone(),
        n_features:       pipeline.vocabulary().len(),
        rounds_completed: pipeline.rounds_completed(),
    };
    write_json(&dir.join(META_FILE), &meta)?;

    tracing::debug!("Wrote snapshot '{}'", dir.display());
    Ok(())
}

/// Rebuild a pipeline from a snapshot directory.
pub fn read_snapshot(dir: &Path) -> Result<Pipeline> {
    let meta_path = dir.join(META_FILE);
    let meta: PipelineMeta = read_json(&meta_path).with_context(|| {
        format!("'{}' does not look like a model snapshot", dir.display())
    })?;

    let vocabulary = Vocabulary::load(&dir.join(TOKENIZER_FILE), meta.n_features)?;
    ensure!(
        !vocabulary.is_empty(),
        "Snapshot '{}' records an empty vocabulary",
        dir.display()
    );

    let model_path = dir.join(MODEL_FILE);
    let record: LinearClassifierRecord<TrainBackend> =
        NamedMpkFileRecorder::<FullPrecisionSettings>::new()
            .load(model_path.clone(), &device())
            .with_context(|| format!("Cannot load weights '{}'", model_path.display()))?;

    let model = LinearClassifierConfig::new(meta.n_features)
        .init::<TrainBackend>(&device())
        .load_record(record);

    Ok(Pipeline::from_parts(
        meta.config,
        vocabulary,
        model,
        meta.rounds_completed,
    ))
}

/// Accept either a snapshot directory or a trial directory.
/// A trial directory resolves to its latest round.
pub fn resolve_snapshot(path: &Path) -> Result<PathBuf> {
    if path.join(META_FILE).is_file() {
        return Ok(path.to_path_buf());
    }
    if path.join(LATEST_FILE).is_file() {
        return CheckpointManager::open(path).latest_dir();
    }
    bail!(
        "'{}' is neither a model snapshot nor a trial directory",
        path.display()
    )
}

// ─── CheckpointManager ───────────────────────────────────────────────────────

/// Owns one trial's checkpoint directory. Exactly one worker
/// writes through a given manager.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the directory (like `mkdir -p`) and manage it.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Manage an existing directory without touching the filesystem.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn round_dir(&self, round: usize) -> PathBuf {
        self.dir.join(format!("round_{round}"))
    }

    /// Write round `round` through `write`, then publish it.
    ///
    /// `write` receives an empty staging directory. If it fails the
    /// staging directory is removed and latest_round.json is left
    /// pointing at the previous round.
    pub fn save_round<F>(&self, round: usize, write: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let final_dir = self.round_dir(round);
        let staging   = self.dir.join(format!("round_{round}.tmp"));

        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)
            .with_context(|| format!("Cannot create '{}'", staging.display()))?;

        if let Err(e) = write(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e.context(format!("Checkpoint for round {round} failed")));
        }

        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&staging, &final_dir).with_context(|| {
            format!("Cannot move '{}' into place", staging.display())
        })?;

        let pointer = self.dir.join(LATEST_FILE);
        let tmp     = self.dir.join(format!("{LATEST_FILE}.tmp"));
        write_json(&tmp, &round)?;
        fs::rename(&tmp, &pointer)
            .with_context(|| format!("Cannot update '{}'", pointer.display()))?;

        tracing::debug!("Saved checkpoint: round {} → '{}'", round, final_dir.display());
        Ok(final_dir)
    }

    /// Round number recorded in latest_round.json.
    pub fn latest_round(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_FILE);
        read_json(&path).with_context(|| {
            format!("No completed round recorded in '{}'", self.dir.display())
        })
    }

    pub fn latest_dir(&self) -> Result<PathBuf> {
        Ok(self.round_dir(self.latest_round()?))
    }

    /// Delete every round directory whose number is not in `keep`.
    /// Returns how many were removed.
    pub fn prune(&self, keep: &[usize]) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name  = entry.file_name();
            let Some(round) = name
                .to_str()
                .and_then(|n| n.strip_prefix("round_"))
                .and_then(|n| n.parse::<usize>().ok())
            else {
                continue;
            };

            if !keep.contains(&round) && entry.path().is_dir() {
                fs::remove_dir_all(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Persist the trial's parameters as params.json.
    pub fn save_params<T: Serialize>(&self, params: &T) -> Result<()> {
        write_json(&self.dir.join(PARAMS_FILE), params)
    }
}

// ─── JSON helpers ────────────────────────────────────────────────────────────

/// Pretty-print `value` as JSON into `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))
}

pub fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid JSON in '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn marker(dir: &Path) -> Result<()> {
        fs::write(dir.join("marker"), "ok")?;
        Ok(())
    }

    #[test]
    fn test_save_round_publishes_and_moves_pointer() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("trial")).unwrap();

        let r1 = mgr.save_round(1, marker).unwrap();
        assert_eq!(r1, mgr.round_dir(1));
        assert!(r1.join("marker").is_file());
        assert_eq!(mgr.latest_round().unwrap(), 1);

        mgr.save_round(2, marker).unwrap();
        assert_eq!(mgr.latest_round().unwrap(), 2);
        assert_eq!(mgr.latest_dir().unwrap(), mgr.round_dir(2));
        assert!(!mgr.dir().join("round_2.tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_pointer_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path()).unwrap();
        mgr.save_round(1, marker).unwrap();

        let err = mgr
            .save_round(2, |_| anyhow::bail!("disk full"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));

        assert_eq!(mgr.latest_round().unwrap(), 1);
        assert!(!mgr.round_dir(2).exists());
        assert!(!mgr.dir().join("round_2.tmp").exists());
    }

    #[test]
    fn test_prune_keeps_requested_rounds() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path()).unwrap();
        for round in 1..=4 {
            mgr.save_round(round, marker).unwrap();
        }
        mgr.save_params(&serde_json::json!({"alpha": 0.1})).unwrap();

        assert_eq!(mgr.prune(&[2, 4]).unwrap(), 2);
        assert!(!mgr.round_dir(1).exists());
        assert!(mgr.round_dir(2).exists());
        assert!(!mgr.round_dir(3).exists());
        assert!(mgr.round_dir(4).exists());
        assert!(mgr.dir().join(PARAMS_FILE).is_file());
    }

    #[test]
    fn test_latest_round_missing_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path()).unwrap();
        assert!(mgr.latest_round().is_err());
    }

    #[test]
    fn test_resolve_snapshot_follows_trial_pointer() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path().join("trial")).unwrap();
        mgr.save_round(3, |dir| {
            fs::write(dir.join(META_FILE), "{}")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(resolve_snapshot(mgr.dir()).unwrap(), mgr.round_dir(3));
        assert_eq!(resolve_snapshot(&mgr.round_dir(3)).unwrap(), mgr.round_dir(3));
        assert!(resolve_snapshot(tmp.path()).is_err());
    }

    #[test]
    fn test_snapshot_with_empty_vocabulary_is_rejected() {
        use crate::domain::record::LabeledRecord;
        use crate::ml::pipeline::PipelineConfig;

        let tmp = tempfile::tempdir().unwrap();
        let rec = |t: &str, label| LabeledRecord { text: t.into(), score: 0.0, label };
        let pipeline = Pipeline::initialize(
            PipelineConfig::default(),
            &[rec("amazing news", true), rec("boring post", false)],
        )
        .unwrap();
        write_snapshot(tmp.path(), &pipeline).unwrap();
        assert!(read_snapshot(tmp.path()).is_ok());

        let meta_path = tmp.path().join(META_FILE);
        let mut meta: PipelineMeta = read_json(&meta_path).unwrap();
        meta.n_features = 0;
        write_json(&meta_path, &meta).unwrap();

        let err = read_snapshot(tmp.path()).err().unwrap();
        assert!(format!("{err:#}").contains("empty vocabulary"), "{err:#}");
    }
}
