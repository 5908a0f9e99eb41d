// ============================================================
// Layer 3 — Trial Domain Types
// ============================================================
// A Trial is one hyperparameter configuration trained over a
// fixed number of rounds. Its lifecycle:
//
//   Created ──► Running ──► RoundComplete(1) ──► ... ──► Finished
//                  │               │
//                  └───────────────┴──────────────────► Failed
//
// Trial workers never touch coordinator state directly. They
// push TrialEvent messages down a channel and the coordinator
// folds them into its own view of every trial.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One point of the search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Position in the expanded search space (0-based)
    pub id: usize,
    /// L2 regularization strength
    pub alpha: f64,
    pub learning_rate: f64,
}

impl TrialConfig {
    /// Directory name for this trial's checkpoints and progress log.
    pub fn dir_name(&self) -> String {
        format!(
            "trial_{:03}_alpha={}_lr={}",
            self.id, self.alpha, self.learning_rate
        )
    }
}

/// Lifecycle state of a trial as seen by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrialState {
    Created,
    Running,
    /// Holds the number of the last completed round (1-based)
    RoundComplete(usize),
    Finished,
    Failed(String),
}

impl TrialState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrialState::Finished | TrialState::Failed(_))
    }

    /// Can a report for `round` be accepted in this state?
    pub fn accepts_round(&self, round: usize) -> bool {
        match self {
            TrialState::Running          => round == 1,
            TrialState::RoundComplete(n) => round == n + 1,
            _                            => false,
        }
    }
}

/// Training-side statistics for one incremental pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub train_loss:     f64,
    pub train_accuracy: f64,
}

/// The metric report a trial sends after each completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub trial:          usize,
    /// 1-based round number
    pub round:          usize,
    pub eval_accuracy:  f64,
    pub train_accuracy: f64,
    pub train_loss:     f64,
    /// Snapshot directory written for this round
    pub checkpoint:     PathBuf,
}

/// Messages from trial workers to the coordinator.
#[derive(Debug, Clone)]
pub enum TrialEvent {
    Started { trial: usize },
    Round(RoundReport),
    Finished { trial: usize },
    Failed { trial: usize, error: String },
}

impl TrialEvent {
    pub fn trial(&self) -> usize {
        match self {
            TrialEvent::Started { trial }
            | TrialEvent::Finished { trial }
            | TrialEvent::Failed { trial, .. } => *trial,
            TrialEvent::Round(report) => report.trial,
        }
    }
}

/// How to resolve two reports with identical accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreak {
    /// Keep whichever result was observed first
    #[default]
    FirstObserved,
    /// Replace the current best with the newer equal result
    LastObserved,
}

impl TieBreak {
    /// Should `candidate` replace `current` as the best accuracy?
    pub fn prefers(&self, candidate: f64, current: f64) -> bool {
        match self {
            TieBreak::FirstObserved => candidate > current,
            TieBreak::LastObserved  => candidate >= current,
        }
    }
}

/// The best round observed across every trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestResult {
    pub trial:         usize,
    pub round:         usize,
    pub eval_accuracy: f64,
    pub checkpoint:    PathBuf,
}

impl From<&RoundReport> for BestResult {
    fn from(r: &RoundReport) -> Self {
        Self {
            trial:         r.trial,
            round:         r.round,
            eval_accuracy: r.eval_accuracy,
            checkpoint:    r.checkpoint.clone(),
        }
    }
}
