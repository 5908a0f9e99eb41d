// ============================================================
// Layer 7 — Coordinator
// ============================================================
// Folds TrialEvents into the search-wide view:
//
//   - one TrialState per trial, advanced only along legal
//     transitions (anything else is logged and dropped)
//   - every accepted RoundReport, in arrival order
//   - the best report so far, replaced only when the TieBreak
//     prefers the newcomer, so its accuracy never decreases
//
// Timeouts: with a per-trial timeout set, a trial that stays
// silent longer than the timeout is marked Failed and any event
// it sends later is ignored.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::Path,
    time::{Duration, Instant},
};

use crate::domain::trial::{BestResult, RoundReport, TieBreak, TrialConfig, TrialEvent, TrialState};
use crate::infra::checkpoint::write_json;

struct TrialEntry {
    config:        TrialConfig,
    state:         TrialState,
    last_activity: Instant,
    timed_out:     bool,
    best_accuracy: Option<f64>,
}

pub struct Coordinator {
    trials:    BTreeMap<usize, TrialEntry>,
    reports:   Vec<RoundReport>,
    best:      Option<BestResult>,
    tie_break: TieBreak,
    timeout:   Option<Duration>,
}

impl Coordinator {
    pub fn new(trials: &[TrialConfig], tie_break: TieBreak, timeout: Option<Duration>) -> Self {
        let now = Instant::now();
        let trials = trials
            .iter()
            .map(|config| {
                let entry = TrialEntry {
                    config:        config.clone(),
                    state:         TrialState::Created,
                    last_activity: now,
                    timed_out:     false,
                    best_accuracy: None,
                };
                (config.id, entry)
            })
            .collect();

        Self {
            trials,
            reports: Vec::new(),
            best: None,
            tie_break,
            timeout,
        }
    }

    /// Apply one event. Returns false when the event was rejected.
    pub fn observe(&mut self, event: TrialEvent) -> bool {
        let id = event.trial();
        let Some(entry) = self.trials.get_mut(&id) else {
            tracing::warn!("Event for unknown trial {} ignored", id);
            return false;
        };

        let accepted = match event {
            TrialEvent::Started { .. } if entry.state == TrialState::Created => {
                entry.state = TrialState::Running;
                true
            }
            TrialEvent::Round(report)
                if entry.state.accepts_round(report.round)
                    && (0.0..=1.0).contains(&report.eval_accuracy) =>
            {
                entry.state = TrialState::RoundComplete(report.round);
                if entry
                    .best_accuracy
                    .map_or(true, |acc| self.tie_break.prefers(report.eval_accuracy, acc))
                {
                    entry.best_accuracy = Some(report.eval_accuracy);
                }

                let improves = self
                    .best
                    .as_ref()
                    .map_or(true, |b| self.tie_break.prefers(report.eval_accuracy, b.eval_accuracy));
                if improves {
                    tracing::info!(
                        "New best: trial {} round {} eval_accuracy={:.4}",
                        report.trial,
                        report.round,
                        report.eval_accuracy
                    );
                    self.best = Some(BestResult::from(&report));
                }

                tracing::debug!(
                    "Trial {} round {} | train_loss={:.4} train_acc={:.4} eval_acc={:.4}",
                    report.trial,
                    report.round,
                    report.train_loss,
                    report.train_accuracy,
                    report.eval_accuracy
                );
                self.reports.push(report);
                true
            }
            TrialEvent::Finished { .. }
                if matches!(entry.state, TrialState::Running | TrialState::RoundComplete(_)) =>
            {
                entry.state = TrialState::Finished;
                true
            }
            TrialEvent::Failed { error, .. } if !entry.state.is_terminal() => {
                tracing::warn!("Trial {} failed: {}", id, error);
                entry.state = TrialState::Failed(error);
                true
            }
            other => {
                tracing::warn!(
                    "Ignoring {:?} for trial {} in state {:?}",
                    other,
                    id,
                    entry.state
                );
                false
            }
        };

        if accepted {
            entry.last_activity = Instant::now();
        }
        accepted
    }

    /// The best round observed so far across all trials.
    pub fn best_trial(&self) -> Result<&BestResult> {
        self.best
            .as_ref()
            .context("No trial completed a round, so there is no best result")
    }

    pub fn reports(&self) -> &[RoundReport] {
        &self.reports
    }

    pub fn state(&self, trial: usize) -> Option<&TrialState> {
        self.trials.get(&trial).map(|e| &e.state)
    }

    /// Every trial has reached Finished or Failed.
    pub fn is_complete(&self) -> bool {
        self.trials.values().all(|e| e.state.is_terminal())
    }

    /// Earliest moment at which some live trial times out.
    pub fn next_deadline(&self) -> Option<Instant> {
        let timeout = self.timeout?;
        self.trials
            .values()
            .filter(|e| !e.state.is_terminal())
            .map(|e| e.last_activity + timeout)
            .min()
    }

    /// Fail every live trial that has been silent past the timeout.
    /// Returns the ids that expired.
    pub fn expire(&mut self, now: Instant) -> Vec<usize> {
        let Some(timeout) = self.timeout else {
            return Vec::new();
        };

        let mut expired = Vec::new();
        for (id, entry) in self.trials.iter_mut() {
            if !entry.state.is_terminal() && now.duration_since(entry.last_activity) >= timeout {
                tracing::warn!("Trial {} timed out after {:?} without progress", id, timeout);
                entry.state     = TrialState::Failed(format!("timed out after {timeout:?}"));
                entry.timed_out = true;
                expired.push(*id);
            }
        }
        expired
    }

    /// Fail every trial that is still live, e.g. after its worker vanished.
    pub fn abandon_unfinished(&mut self, reason: &str) {
        for (id, entry) in self.trials.iter_mut() {
            if !entry.state.is_terminal() {
                tracing::warn!("Trial {} abandoned: {}", id, reason);
                entry.state = TrialState::Failed(reason.to_string());
            }
        }
    }

    pub fn timed_out(&self, trial: usize) -> bool {
        self.trials.get(&trial).is_some_and(|e| e.timed_out)
    }

    pub fn into_outcome(self) -> SearchOutcome {
        let reports = self.reports;
        let trials = self
            .trials
            .into_values()
            .map(|e| TrialSummary {
                rounds_completed: reports.iter().filter(|r| r.trial == e.config.id).count(),
                best_eval_accuracy: e.best_accuracy,
                config: e.config,
                state:  e.state,
            })
            .collect();

        SearchOutcome {
            trials,
            reports,
            best: self.best,
        }
    }
}

// ─── Search Outcome ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSummary {
    pub config:             TrialConfig,
    pub state:              TrialState,
    pub rounds_completed:   usize,
    pub best_eval_accuracy: Option<f64>,
}

/// Everything a finished search produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub trials:  Vec<TrialSummary>,
    pub reports: Vec<RoundReport>,
    pub best:    Option<BestResult>,
}

impl SearchOutcome {
    pub fn best(&self) -> Result<&BestResult> {
        self.best
            .as_ref()
            .context("No trial completed a round, so there is no best result")
    }

    pub fn failed(&self) -> impl Iterator<Item = &TrialSummary> {
        self.trials
            .iter()
            .filter(|t| matches!(t.state, TrialState::Failed(_)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }
}
