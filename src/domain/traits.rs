// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Seams between the layers:
//   - JsonLinesLoader implements RecordSource
//   - PipelineTrainable implements Trainable
//
// The search runner only sees Trainable, so a trial can be
// driven by any incremental learner. Tests plug in learners
// that fail on purpose to exercise the failure paths.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::path::Path;

use anyhow::Result;

use crate::domain::record::Record;
use crate::domain::trial::RoundStats;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the full set of ingested records.
pub trait RecordSource {
    /// Load every record, in a deterministic order.
    fn load_all(&self) -> Result<Vec<Record>>;
}

// ─── Trainable ────────────────────────────────────────────────────────────────
/// An incrementally trained model owned by exactly one trial.
///
/// `train_round` consumes the current state and returns the next
/// version, so the warm-start weights are passed explicitly from
/// one round to the next instead of living in hidden shared state.
pub trait Trainable: Sized + Send {
    /// Run one incremental optimization pass.
    fn train_round(self) -> Result<(Self, RoundStats)>;

    /// Write a complete snapshot of the current state into `dir`.
    /// `dir` already exists and is empty.
    fn save_checkpoint(&self, dir: &Path) -> Result<()>;

    /// Accuracy on the evaluation split, in [0, 1].
    fn evaluate(&self) -> Result<f64>;
}
