// ============================================================
// Layer 7 — Search Runner
// ============================================================
// Spawns one named worker thread per trial, then drives the
// Coordinator from the receiving end of a single mpsc channel
// until every trial is Finished or Failed.
//
//   workers ──TrialEvent──► rx ──► Coordinator::observe
//                             │
//                   recv_timeout(next deadline)
//                             │
//                             ▼
//                   Coordinator::expire
//
// A worker that drops its sender without a terminal event is
// failed once the channel disconnects. Timed-out workers are
// told to stop through their cancel flag and then detached
// rather than joined.
//
// Reference: Rust Book §16 (Message Passing)

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::Path,
    sync::{
        atomic::Ordering,
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crate::domain::traits::Trainable;
use crate::domain::trial::{TieBreak, TrialConfig};
use crate::search::coordinator::{Coordinator, SearchOutcome};
use crate::search::space::SearchSpace;
use crate::search::store::DatasetHandle;
use crate::search::trial::{run_trial, TrialPlan};

pub const RESULTS_FILE: &str = "results.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Incremental training rounds per trial
    pub rounds:        usize,
    pub tie_break:     TieBreak,
    /// Fail a trial that sends nothing for this long
    pub trial_timeout: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            rounds:        5,
            tie_break:     TieBreak::FirstObserved,
            trial_timeout: None,
        }
    }
}

impl SearchOptions {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.rounds > 0, "A search needs at least one round per trial");
        ensure!(
            self.trial_timeout != Some(Duration::ZERO),
            "Trial timeout must be longer than zero"
        );
        Ok(())
    }
}

/// Run every trial of `space` concurrently and collect the outcome.
///
/// `factory` builds each trial's initial model inside its worker
/// thread. Results are written to `<output_dir>/results.json`.
pub fn run_search<T, F>(
    space:      &SearchSpace,
    options:    &SearchOptions,
    data:       &DatasetHandle,
    output_dir: &Path,
    factory:    F,
) -> Result<SearchOutcome>
where
    T: Trainable + 'static,
    F: Fn(&TrialConfig, &DatasetHandle) -> Result<T> + Send + Sync + 'static,
{
    space.validate()?;
    options.validate()?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory '{}'", output_dir.display()))?;

    let trials = space.trials();
    tracing::info!(
        "Starting search: {} trials × {} rounds",
        space.len(),
        options.rounds
    );

    let mut coordinator = Coordinator::new(&trials, options.tie_break, options.trial_timeout);
    let (tx, rx)        = mpsc::channel();
    let factory         = Arc::new(factory);
    let mut workers     = BTreeMap::new();

    for trial in trials {
        let id      = trial.id;
        let dir     = output_dir.join(trial.dir_name());
        let tx      = tx.clone();
        let factory = Arc::clone(&factory);
        let data    = data.clone();
        let plan    = TrialPlan::new(trial, options.rounds, options.tie_break);
        let cancel  = Arc::clone(&plan.cancel);

        let handle = thread::Builder::new()
            .name(format!("trial-{id}"))
            .spawn(move || {
                run_trial(&plan, &dir, || (*factory)(&plan.trial, &data), &tx);
            })
            .with_context(|| format!("Cannot spawn worker for trial {id}"))?;
        workers.insert(id, (handle, cancel));
    }
    // Only workers hold senders now, so the channel disconnects
    // once the last of them exits.
    drop(tx);

    while !coordinator.is_complete() {
        let received = match coordinator.next_deadline() {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Ok(event)                          => Some(event),
                    Err(RecvTimeoutError::Timeout)     => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => Some(event),
                Err(_)    => break,
            },
        };

        if let Some(event) = received {
            coordinator.observe(event);
        }
        for id in coordinator.expire(Instant::now()) {
            if let Some((_, cancel)) = workers.get(&id) {
                cancel.store(true, Ordering::SeqCst);
            }
        }
    }
    coordinator.abandon_unfinished("worker exited without reporting a result");

    for (id, (handle, _)) in workers {
        if coordinator.timed_out(id) {
            tracing::debug!(
                "Detaching timed-out worker for trial {} ({:?})",
                id,
                coordinator.state(id)
            );
            continue;
        }
        if handle.join().is_err() {
            tracing::warn!("Worker for trial {} panicked", id);
        }
    }

    match coordinator.best_trial() {
        Ok(best) => tracing::info!(
            "Search done after {} rounds: best trial {} round {} eval_accuracy={:.4}",
            coordinator.reports().len(),
            best.trial,
            best.round,
            best.eval_accuracy
        ),
        Err(e) => tracing::warn!("Search done: {:#}", e),
    }

    let outcome = coordinator.into_outcome();
    outcome.save(&output_dir.join(RESULTS_FILE))?;
    Ok(outcome)
}
