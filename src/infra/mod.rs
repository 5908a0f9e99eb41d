// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Filesystem concerns shared by the application and search
// layers:
//
//   checkpoint.rs — pipeline snapshots (burn recorder + JSON),
//                   per-trial round directories with an atomic
//                   latest_round.json pointer, pruning
//
//   metrics.rs    — per-trial progress.csv logger
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Snapshots and round checkpoints
pub mod checkpoint;

/// Round metrics CSV logger
pub mod metrics;
