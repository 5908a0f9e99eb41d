// ============================================================
// Layer 7 — Shared Dataset Store
// ============================================================
// The train and eval splits are placed into the store once,
// before any trial starts. Trials receive a DatasetHandle,
// which is a reference-counted pointer to the same immutable
// data: cloning a handle never copies a record.

use anyhow::{ensure, Result};
use std::sync::Arc;

use crate::domain::record::LabeledRecord;

#[derive(Debug)]
pub struct DatasetStore {
    train: Vec<LabeledRecord>,
    eval:  Vec<LabeledRecord>,
}

impl DatasetStore {
    /// Freeze both splits and hand out the first handle.
    pub fn put(train: Vec<LabeledRecord>, eval: Vec<LabeledRecord>) -> Result<DatasetHandle> {
        ensure!(!train.is_empty(), "Training split is empty");
        ensure!(!eval.is_empty(), "Evaluation split is empty");

        tracing::debug!(
            "Dataset store holds {} train / {} eval records",
            train.len(),
            eval.len()
        );
        Ok(DatasetHandle {
            inner: Arc::new(DatasetStore { train, eval }),
        })
    }
}

/// Read-only view of the stored datasets, cheap to clone.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    inner: Arc<DatasetStore>,
}

impl DatasetHandle {
    pub fn train(&self) -> &[LabeledRecord] {
        &self.inner.train
    }

    pub fn eval(&self) -> &[LabeledRecord] {
        &self.inner.eval
    }

    /// Do both handles point at the same stored data?
    #[cfg(test)]
    pub fn same_data(&self, other: &DatasetHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
