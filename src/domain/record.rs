// ============================================================
// Layer 3 — Record Domain Types
// ============================================================
// A Record is one ingested post: the title text and the
// popularity score it received. Records are immutable once
// parsed; labeling produces a new LabeledRecord instead of
// mutating the original.
//
// Example:
//   Record        { text: "amazing news today", score: 10.0 }
//   LabeledRecord { text: "amazing news today", score: 10.0, label: true }
//
// The label is only meaningful relative to a threshold, so the
// full labeled set travels together with that threshold in
// LabeledDataset.

use serde::{Deserialize, Serialize};

/// One ingested post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Cleaned title text
    pub text: String,

    /// Popularity score (non-negative)
    pub score: f64,
}

impl Record {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self { text: text.into(), score }
    }
}

/// A Record extended with its binary popularity label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub text:  String,
    pub score: f64,
    /// `score > threshold` for the threshold of the owning dataset
    pub label: bool,
}

impl LabeledRecord {
    /// Attach a label derived from `threshold` (strictly greater-than).
    pub fn from_record(record: Record, threshold: f64) -> Self {
        let label = record.score > threshold;
        Self {
            text:  record.text,
            score: record.score,
            label,
        }
    }
}

/// The full labeled corpus plus the threshold that produced its labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledDataset {
    pub threshold: f64,
    pub records:   Vec<LabeledRecord>,
}

impl LabeledDataset {
    /// Number of records labeled popular.
    pub fn positives(&self) -> usize {
        self.records.iter().filter(|r| r.label).count()
    }
}
