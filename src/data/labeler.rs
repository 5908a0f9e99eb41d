// ============================================================
// Layer 4 — Popularity Labeler
// ============================================================
// Turns raw scores into a binary "popular" label.
//
// The threshold is the median score of the FULL ingested set,
// computed exactly once before the train/eval split. Using the
// median gives a roughly balanced label distribution without
// hand-picking a cut-off.
//
//   scores   [5, 0, 1, 10]
//   sorted   [0, 1, 5, 10]
//   median   (1 + 5) / 2 = 3
//   labels   [5>3, 0>3, 1>3, 10>3] = [true, false, false, true]
//
// The comparison is strict: a score equal to the median is
// NOT popular.

use anyhow::{ensure, Result};

use crate::domain::record::{LabeledDataset, LabeledRecord, Record};

/// Median of all scores. Even-sized sets average the two middle values.
pub fn median_score(records: &[Record]) -> Result<f64> {
    ensure!(!records.is_empty(), "Cannot compute a median of zero records");

    let mut scores: Vec<f64> = records.iter().map(|r| r.score).collect();
    scores.sort_by(f64::total_cmp);

    let mid = scores.len() / 2;
    let median = if scores.len() % 2 == 0 {
        (scores[mid - 1] + scores[mid]) / 2.0
    } else {
        scores[mid]
    };
    Ok(median)
}

/// Compute the threshold once and label every record against it.
pub fn label_records(records: Vec<Record>) -> Result<LabeledDataset> {
    let threshold = median_score(&records)?;

    let records: Vec<LabeledRecord> = records
        .into_iter()
        .map(|r| LabeledRecord::from_record(r, threshold))
        .collect();

    let dataset = LabeledDataset { threshold, records };
    tracing::info!(
        "Labeled {} records at threshold {} ({} popular)",
        dataset.records.len(),
        threshold,
        dataset.positives()
    );
    Ok(dataset)
}
