// ============================================================
// Layer 2 — Data Preparation
// ============================================================
//   Step 1: Load every JSONL file      (Layer 4 - data)
//   Step 2: Median threshold + labels  (Layer 4 - data)
//   Step 3: Train / eval split         (Layer 4 - data)
//
// The threshold is fixed over the full ingested set before the
// split ever happens.

use anyhow::Result;
use std::path::PathBuf;

use crate::data::{
    labeler::label_records,
    loader::JsonLinesLoader,
    splitter::{split_train_eval, SplitConfig},
};
use crate::domain::record::LabeledRecord;
use crate::domain::traits::RecordSource;

/// Labeled splits ready for training.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub threshold: f64,
    pub total:     usize,
    pub positives: usize,
    pub train:     Vec<LabeledRecord>,
    pub eval:      Vec<LabeledRecord>,
}

pub fn prepare_data(paths: &[PathBuf], split: &SplitConfig) -> Result<PreparedData> {
    let records = JsonLinesLoader::new(paths.iter().cloned()).load_all()?;

    let labeled = label_records(records)?;
    let (threshold, total, positives) = (labeled.threshold, labeled.records.len(), labeled.positives());

    let (train, eval) = split_train_eval(labeled.records, split)?;
    Ok(PreparedData { threshold, total, positives, train, eval })
}
