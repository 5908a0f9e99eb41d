// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All burn model and optimiser code lives here, plus the
// tokenizer-backed vocabulary that feeds it.
//
//   vectorizer.rs — word-level Vocabulary (tokenizers crate)
//                   text → sparse term counts
//
//   model.rs      — LinearClassifier: one Linear(n → 1) layer,
//                   hinge loss + L2 penalty
//
//   trainer.rs    — one shuffled mini-batch SGD pass,
//                   backend aliases and the CPU device
//
//   pipeline.rs   — Pipeline: vocabulary + classifier as one
//                   owned, versioned unit with fit / partial_fit /
//                   predict / evaluate / save / load
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Word-level vocabulary and bag-of-words transform
pub mod vectorizer;

/// Linear SVM-style classifier
pub mod model;

/// Single incremental training pass
pub mod trainer;

/// Fit / predict pipeline over raw titles
pub mod pipeline;
