// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per completed round to the trial's
// progress.csv:
//
//   round,train_loss,train_accuracy,eval_accuracy,checkpoint
//   1,0.913400,0.712000,0.655000,out/trial_000_alpha=0.0001_lr=0.01/round_1
//   2,0.804100,0.768000,0.671000,out/trial_000_alpha=0.0001_lr=0.01/round_2
//
// The checkpoint column names the directory written for that
// round; older rounds may have been pruned since.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::trial::RoundReport;

const HEADER: &str = "round,train_loss,train_accuracy,eval_accuracy,checkpoint";

/// Logs round metrics for one trial.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `<dir>/progress.csv` with its header if it does not exist.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("progress.csv");

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one round's metrics as a new row.
    pub fn log(&self, r: &RoundReport) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{}",
            r.round,
            r.train_loss,
            r.train_accuracy,
            r.eval_accuracy,
            r.checkpoint.display(),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
