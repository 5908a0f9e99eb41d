// ============================================================
// Layer 7 — Hyperparameter Search
// ============================================================
// Sweeps the regularization strength (and optionally the
// learning rate) across concurrently running trials:
//
//   SearchSpace ──trials()──► TrialConfig × N
//        │
//        ▼
//   DatasetStore::put ──► DatasetHandle (Arc, read-only)
//        │                    │ clone per trial
//        ▼                    ▼
//   run_search ──spawn──► worker thread per trial
//        ▲                    │ train → checkpoint → evaluate
//        │   TrialEvent       │ → progress.csv → report
//        └────── mpsc ────────┘
//        │
//        ▼
//   Coordinator ──► SearchOutcome { trials, reports, best }
//
// Workers own their model state and their checkpoint
// directory outright. The coordinator is the only place where
// trial states and the best result are mutated, and it only
// learns anything through the channel.

/// Candidate values and their expansion into trials
pub mod space;

/// Shared read-only train/eval datasets
pub mod store;

/// Per-trial worker loop and the Pipeline-backed Trainable
pub mod trial;

/// Trial state machine, best tracking and timeouts
pub mod coordinator;

/// Thread spawning and the event loop
pub mod runner;
