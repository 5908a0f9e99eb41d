// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define the core
// concepts of the system:
//
//   record.rs  — Record, LabeledRecord, LabeledDataset
//   trial.rs   — TrialConfig, TrialState, TrialEvent, RoundReport
//   traits.rs  — RecordSource and Trainable seams
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - Only data definitions and the traits other layers implement
//
// The domain layer says what things ARE; the data, ml and
// search layers say how they are produced.

pub mod record;

pub mod trial;

pub mod traits;
