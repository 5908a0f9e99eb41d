// ============================================================
// Layer 7 — Trial Worker
// ============================================================
// Runs one trial end to end inside its own thread:
//
//   Started
//   for round in 1..=rounds:
//       (stop if cancelled)
//       train_round        (warm start from the previous round)
//       save_round         (round_<n>.tmp → round_<n>, pointer)
//       evaluate           (held-out accuracy of that snapshot)
//       progress.csv row
//       (stop if cancelled)
//       prune              (keep latest + this trial's best)
//       Round(report)
//   Finished | Failed(error chain)
//
// The trial is the only writer of its directory. Sending never
// blocks, and a send to a coordinator that has stopped
// listening is ignored: the files on disk are still complete.
//
// A cancelled trial (the coordinator timed it out) stops at the
// next check without pruning. Its best as seen by the coordinator
// may be older than its local best, so nothing it already wrote
// may be deleted after that point.

use anyhow::{bail, Context, Result};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
};

use crate::domain::traits::Trainable;
use crate::domain::trial::{RoundReport, RoundStats, TieBreak, TrialConfig, TrialEvent};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::pipeline::{Pipeline, PipelineConfig};
use crate::search::store::DatasetHandle;

// ─── PipelineTrainable ────────────────────────────────────────────────────────
/// A Pipeline trained on the shared train split and scored on
/// the shared eval split.
pub struct PipelineTrainable {
    pipeline: Pipeline,
    data:     DatasetHandle,
}

impl PipelineTrainable {
    /// Start a fresh pipeline using the trial's alpha and learning rate.
    pub fn new(trial: &TrialConfig, base: &PipelineConfig, data: &DatasetHandle) -> Result<Self> {
        let config = PipelineConfig {
            alpha:         trial.alpha,
            learning_rate: trial.learning_rate,
            ..base.clone()
        };
        let pipeline = Pipeline::initialize(config, data.train())?;
        Ok(Self { pipeline, data: data.clone() })
    }

    #[cfg(test)]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl Trainable for PipelineTrainable {
    fn train_round(self) -> Result<(Self, RoundStats)> {
        let Self { pipeline, data } = self;
        let (pipeline, pass) = pipeline.partial_fit(data.train())?;
        let train_accuracy   = pipeline.evaluate(data.train())?;

        let stats = RoundStats { train_loss: pass.mean_loss, train_accuracy };
        Ok((Self { pipeline, data }, stats))
    }

    fn save_checkpoint(&self, dir: &Path) -> Result<()> {
        self.pipeline.save(dir)
    }

    fn evaluate(&self) -> Result<f64> {
        self.pipeline.evaluate(self.data.eval())
    }
}

// ─── Worker ──────────────────────────────────────────────────────────────────
/// What a worker needs besides the model.
#[derive(Debug, Clone)]
pub struct TrialPlan {
    pub trial:     TrialConfig,
    pub rounds:    usize,
    pub tie_break: TieBreak,
    /// Set by the runner once the coordinator has given up on the trial
    pub cancel:    Arc<AtomicBool>,
}

impl TrialPlan {
    pub fn new(trial: TrialConfig, rounds: usize, tie_break: TieBreak) -> Self {
        Self { trial, rounds, tie_break, cancel: Arc::new(AtomicBool::new(false)) }
    }

    fn ensure_live(&self, round: usize) -> Result<()> {
        if self.cancel.load(Ordering::SeqCst) {
            bail!("Cancelled before finishing round {round}");
        }
        Ok(())
    }
}

/// Run one trial and report its terminal state.
/// `build` constructs the initial model inside the worker.
pub fn run_trial<T, F>(plan: &TrialPlan, dir: &Path, build: F, events: &Sender<TrialEvent>)
where
    T: Trainable,
    F: FnOnce() -> Result<T>,
{
    let id = plan.trial.id;
    let _ = events.send(TrialEvent::Started { trial: id });

    match drive(plan, dir, build, events) {
        Ok(()) => {
            tracing::debug!("Trial {} finished", id);
            let _ = events.send(TrialEvent::Finished { trial: id });
        }
        Err(e) => {
            let error = format!("{e:#}");
            tracing::debug!("Trial {} failed: {}", id, error);
            let _ = events.send(TrialEvent::Failed { trial: id, error });
        }
    }
}

fn drive<T, F>(plan: &TrialPlan, dir: &Path, build: F, events: &Sender<TrialEvent>) -> Result<()>
where
    T: Trainable,
    F: FnOnce() -> Result<T>,
{
    let checkpoints = CheckpointManager::new(dir)?;
    checkpoints.save_params(&plan.trial)?;
    let metrics = MetricsLogger::new(dir)?;

    let mut model = build().context("Cannot initialise the trial model")?;
    // (round, eval accuracy) of this trial's best snapshot
    let mut best: Option<(usize, f64)> = None;

    tracing::debug!(
        "Trial {} writes checkpoints under '{}', metrics to '{}'",
        plan.trial.id,
        checkpoints.dir().display(),
        metrics.csv_path().display()
    );

    for round in 1..=plan.rounds {
        plan.ensure_live(round)?;
        let (next, stats) = model
            .train_round()
            .with_context(|| format!("Training round {round} failed"))?;
        model = next;

        let checkpoint    = checkpoints.save_round(round, |d| model.save_checkpoint(d))?;
        let eval_accuracy = model
            .evaluate()
            .with_context(|| format!("Evaluating round {round} failed"))?;

        let report = RoundReport {
            trial: plan.trial.id,
            round,
            eval_accuracy,
            train_accuracy: stats.train_accuracy,
            train_loss: stats.train_loss,
            checkpoint,
        };
        metrics.log(&report)?;
        plan.ensure_live(round)?;

        if best.map_or(true, |(_, acc)| plan.tie_break.prefers(eval_accuracy, acc)) {
            best = Some((round, eval_accuracy));
        }
        let keep: Vec<usize> = [Some(round), best.map(|(r, _)| r)]
            .into_iter()
            .flatten()
            .collect();
        if let Err(e) = checkpoints.prune(&keep) {
            tracing::warn!("Trial {}: could not prune old rounds: {:#}", plan.trial.id, e);
        }

        let _ = events.send(TrialEvent::Round(report));
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::LabeledRecord;
    use crate::search::store::DatasetStore;
    use std::sync::mpsc;

    /// Scripted accuracies, one per round.
    struct Scripted {
        round:        usize,
        accuracies:   Vec<f64>,
        fail_save_at: Option<usize>,
    }

    impl Scripted {
        fn new(accuracies: Vec<f64>) -> Self {
            Self { round: 0, accuracies, fail_save_at: None }
        }
    }

    fn round_numbers(events: &[TrialEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                TrialEvent::Round(r) => Some(r.round),
                _ => None,
            })
            .collect()
    }

    impl Trainable for Scripted {
        fn train_round(self) -> Result<(Self, RoundStats)> {
            let stats = RoundStats { train_loss: 0.5, train_accuracy: 0.9 };
            Ok((Self { round: self.round + 1, ..self }, stats))
        }

        fn save_checkpoint(&self, dir: &Path) -> Result<()> {
            std::fs::write(dir.join("round.txt"), self.round.to_string())?;
            if self.fail_save_at == Some(self.round) {
                anyhow::bail!("disk full");
            }
            Ok(())
        }

        fn evaluate(&self) -> Result<f64> {
            Ok(self.accuracies[self.round - 1])
        }
    }

    fn plan(rounds: usize) -> TrialPlan {
        TrialPlan::new(
            TrialConfig { id: 7, alpha: 0.1, learning_rate: 0.01 },
            rounds,
            TieBreak::FirstObserved,
        )
    }

    #[test]
    fn test_reports_every_round_and_keeps_best_and_latest() {
        let tmp      = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let accs     = vec![0.5, 0.8, 0.6, 0.8];

        run_trial(
            &plan(4),
            tmp.path(),
            || Ok(Scripted::new(accs.clone())),
            &tx,
        );
        drop(tx);

        let events: Vec<TrialEvent> = rx.iter().collect();
        assert!(matches!(events[0], TrialEvent::Started { trial: 7 }));
        assert!(matches!(events.last(), Some(TrialEvent::Finished { trial: 7 })));

        let rounds: Vec<&RoundReport> = events
            .iter()
            .filter_map(|e| match e {
                TrialEvent::Round(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(rounds.len(), 4);
        assert_eq!(rounds.iter().map(|r| r.round).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

        // First-observed best is round 2; round 4 is the latest.
        let mgr = CheckpointManager::open(tmp.path());
        assert!(!mgr.round_dir(1).exists());
        assert!(mgr.round_dir(2).exists());
        assert!(!mgr.round_dir(3).exists());
        assert!(mgr.round_dir(4).exists());
        assert_eq!(mgr.latest_round().unwrap(), 4);
        assert!(tmp.path().join("params.json").is_file());

        let csv = std::fs::read_to_string(tmp.path().join("progress.csv")).unwrap();
        assert_eq!(csv.lines().count(), 5);
    }

    #[test]
    fn test_build_failure_becomes_failed_event() {
        let tmp      = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();

        run_trial::<Scripted, _>(&plan(3), tmp.path(), || anyhow::bail!("no model"), &tx);
        drop(tx);

        let events: Vec<TrialEvent> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        match &events[1] {
            TrialEvent::Failed { trial, error } => {
                assert_eq!(*trial, 7);
                assert!(error.contains("no model"), "{error}");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_checkpoint_failure_mid_trial_keeps_previous_round() {
        let tmp      = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let build    = || Ok(Scripted { fail_save_at: Some(2), ..Scripted::new(vec![0.5, 0.9, 0.7]) });

        run_trial(&plan(3), tmp.path(), build, &tx);
        drop(tx);

        let events: Vec<TrialEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);
        assert_eq!(round_numbers(&events), vec![1]);
        match events.last() {
            Some(TrialEvent::Failed { error, .. }) => {
                assert!(error.contains("Checkpoint for round 2 failed"), "{error}");
                assert!(error.contains("disk full"), "{error}");
            }
            other => panic!("unexpected event {other:?}"),
        }

        let mgr = CheckpointManager::open(tmp.path());
        assert_eq!(mgr.latest_round().unwrap(), 1);
        assert!(mgr.round_dir(1).join("round.txt").is_file());
        assert!(!mgr.round_dir(2).exists());
        assert!(!tmp.path().join("round_2.tmp").exists());

        let csv = std::fs::read_to_string(tmp.path().join("progress.csv")).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_cancelled_trial_stops_without_pruning() {
        let tmp      = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let plan     = plan(3);
        let cancel   = Arc::clone(&plan.cancel);

        // Round 2 beats round 1, then the cancel lands before round 2 is pruned against.
        struct CancelAfterSave {
            inner:  Scripted,
            cancel: Arc<AtomicBool>,
        }
        impl Trainable for CancelAfterSave {
            fn train_round(self) -> Result<(Self, RoundStats)> {
                let (inner, stats) = self.inner.train_round()?;
                Ok((Self { inner, ..self }, stats))
            }
            fn save_checkpoint(&self, dir: &Path) -> Result<()> {
                self.inner.save_checkpoint(dir)?;
                if self.inner.round == 2 {
                    self.cancel.store(true, Ordering::SeqCst);
                }
                Ok(())
            }
            fn evaluate(&self) -> Result<f64> {
                self.inner.evaluate()
            }
        }

        let build = move || Ok(CancelAfterSave { inner: Scripted::new(vec![0.5, 0.9, 0.7]), cancel });
        run_trial(&plan, tmp.path(), build, &tx);
        drop(tx);

        let events: Vec<TrialEvent> = rx.iter().collect();
        assert_eq!(round_numbers(&events), vec![1]);
        match events.last() {
            Some(TrialEvent::Failed { error, .. }) => assert!(error.contains("Cancelled"), "{error}"),
            other => panic!("unexpected event {other:?}"),
        }

        let mgr = CheckpointManager::open(tmp.path());
        assert!(mgr.round_dir(1).join("round.txt").is_file());
        assert!(mgr.round_dir(2).exists());
        assert!(!mgr.round_dir(3).exists());
    }

    #[test]
    fn test_pipeline_trainable_uses_trial_parameters() {
        let rec = |t: &str, label| LabeledRecord { text: t.into(), score: 0.0, label };
        let data = DatasetStore::put(
            vec![rec("amazing news", true), rec("boring post", false)],
            vec![rec("amazing post", true)],
        )
        .unwrap();

        let trial = TrialConfig { id: 0, alpha: 0.5, learning_rate: 0.2 };
        let model = PipelineTrainable::new(&trial, &PipelineConfig::default(), &data).unwrap();
        assert_eq!(model.pipeline().config().alpha, 0.5);
        assert_eq!(model.pipeline().config().learning_rate, 0.2);

        let (model, stats) = model.train_round().unwrap();
        assert_eq!(model.pipeline().rounds_completed(), 1);
        assert!((0.0..=1.0).contains(&stats.train_accuracy));
        assert!((0.0..=1.0).contains(&model.evaluate().unwrap()));
    }
}
