// ============================================================
// Layer 4 — JSON Lines Loader
// ============================================================
// Loads posts from newline-delimited JSON files. Every line is
// one object shaped like a Reddit listing child:
//
//   {"kind": "t3", "data": {"title": "amazing news today", "score": 10, ...}}
//
// Only data.title and data.score are read; every other field
// is ignored by serde.
//
// Files are independent, so each one is parsed on the rayon
// pool. par_iter().map().collect() keeps the output in input
// order no matter which worker finishes first, and collecting
// into Result<Vec<_>> stops at the first failed file.
//
// Failure policy:
//   A line that is not JSON, misses a field, or carries a
//   negative score fails the whole file. The error names the
//   file and the 1-based line so it can be fixed by hand.
//   Blank lines are skipped.
//
// Reference: rayon crate documentation (ParallelIterator)
//            Rust Book §9 (Error Handling)

use anyhow::{bail, ensure, Context, Result};
use rayon::prelude::*;
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::data::preprocessor::Preprocessor;
use crate::domain::record::Record;
use crate::domain::traits::RecordSource;

#[derive(Debug, Deserialize)]
struct RawLine {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    title: String,
    score: f64,
}

/// Loads records from a list of JSONL files.
pub struct JsonLinesLoader {
    paths: Vec<PathBuf>,
}

impl JsonLinesLoader {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl RecordSource for JsonLinesLoader {
    fn load_all(&self) -> Result<Vec<Record>> {
        let records = load_in_order(&self.paths, load_file)?;
        tracing::info!(
            "Loaded {} records from {} files",
            records.len(),
            self.paths.len()
        );
        Ok(records)
    }
}

/// Run `load` on every path in parallel and concatenate the
/// results in input order.
fn load_in_order<F>(paths: &[PathBuf], load: F) -> Result<Vec<Record>>
where
    F: Fn(&Path) -> Result<Vec<Record>> + Sync,
{
    ensure!(!paths.is_empty(), "No input files given");

    let per_file: Vec<Vec<Record>> = paths
        .par_iter()
        .map(|path| load(path))
        .collect::<Result<_>>()?;

    Ok(per_file.into_iter().flatten().collect())
}

/// Parse a single JSONL file into records, in line order.
pub fn load_file(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open '{}'", path.display()))?;

    let preprocessor = Preprocessor::new();
    let mut records  = Vec::new();

    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| {
            format!("Cannot read '{}' line {}", path.display(), line_no)
        })?;

        if line.trim().is_empty() {
            continue;
        }

        let raw: RawLine = serde_json::from_str(&line).with_context(|| {
            format!("Malformed record in '{}' line {}", path.display(), line_no)
        })?;

        if raw.data.score < 0.0 {
            bail!(
                "Negative score {} in '{}' line {}",
                raw.data.score,
                path.display(),
                line_no
            );
        }

        records.push(Record::new(preprocessor.clean(&raw.data.title), raw.data.score));
    }

    tracing::debug!("Parsed {} records from '{}'", records.len(), path.display());
    Ok(records)
}
