// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a saved pipeline and labels new titles.
//
// The checkpoint path may be:
//   - a snapshot directory (train's <output>/model, or any
//     trial's round_<n>)
//   - a trial directory, resolved through latest_round.json
//
// Titles go through the same cleaner as ingested ones.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::infra::checkpoint::resolve_snapshot;
use crate::ml::pipeline::Pipeline;

/// One labeled input title.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub text:    String,
    pub popular: bool,
}

pub struct PredictUseCase {
    pipeline:     Pipeline,
    preprocessor: Preprocessor,
    snapshot:     PathBuf,
}

impl PredictUseCase {
    pub fn new(checkpoint: &Path) -> Result<Self> {
        let snapshot = resolve_snapshot(checkpoint)?;
        tracing::info!("Loading model from '{}'", snapshot.display());

        let pipeline = Pipeline::load(&snapshot)?;
        Ok(Self {
            pipeline,
            preprocessor: Preprocessor::new(),
            snapshot,
        })
    }

    pub fn snapshot(&self) -> &Path {
        &self.snapshot
    }

    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>> {
        let cleaned: Vec<String> = texts
            .iter()
            .map(|t| self.preprocessor.clean(t.as_ref()))
            .collect();
        let labels = self.pipeline.predict(&cleaned)?;

        Ok(texts
            .iter()
            .zip(labels)
            .map(|(text, popular)| Prediction {
                text: text.as_ref().to_string(),
                popular,
            })
            .collect())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fixtures::write_posts;
    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::splitter::SplitConfig;
    use crate::ml::pipeline::PipelineConfig;

    #[test]
    fn test_predict_from_trained_model() {
        let tmp     = tempfile::tempdir().unwrap();
        let posts   = write_posts(tmp.path(), "posts.jsonl", 40);
        let summary = TrainUseCase::new(TrainConfig {
            data:       vec![posts],
            output_dir: tmp.path().join("out"),
            split:      SplitConfig { held_out_fraction: 0.25, seed: Some(2) },
            pipeline:   PipelineConfig { learning_rate: 0.1, ..PipelineConfig::default() },
        })
        .execute()
        .unwrap();

        let use_case = PredictUseCase::new(&summary.model_dir).unwrap();
        assert_eq!(use_case.snapshot(), summary.model_dir.as_path());

        let out = use_case
            .predict(&["Amazing  great\tstory", "boring dull post", "never seen before"])
            .unwrap();
        assert_eq!(out.len(), 3);
        assert!(out[0].popular);
        assert!(!out[1].popular);
        assert_eq!(out[0].text, "Amazing  great\tstory");
    }

    #[test]
    fn test_unknown_checkpoint_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(PredictUseCase::new(tmp.path()).is_err());
    }
}
