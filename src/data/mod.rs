// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from raw JSONL files to tensor batches.
//
// The pipeline flows in this order:
//
//   *.jsonl files
//       │
//       ▼
//   JsonLinesLoader   → parses files in parallel, one Record per line
//       │
//       ▼
//   Preprocessor      → normalises each title to one clean line
//       │
//       ▼
//   label_records     → median threshold, popular = score > median
//       │
//       ▼
//   split_train_eval  → random disjoint train / eval partition
//       │
//       ▼
//   EncodedDataset    → vectorized samples behind burn's Dataset trait
//       │
//       ▼
//   FeatureBatcher    → dense tensor batches for the classifier
//
// Vectorization itself (text → sparse counts) lives in the ml
// layer because it is part of the fitted pipeline state.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Parallel JSONL ingestion
pub mod loader;

/// Title text normalisation
pub mod preprocessor;

/// Median threshold and binary labels
pub mod labeler;

/// Shuffles and splits data into train/eval sets
pub mod splitter;

/// Implements burn's Dataset trait for vectorized samples
pub mod dataset;

/// Implements burn's Batcher trait to create tensor batches
pub mod batcher;
