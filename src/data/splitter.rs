// ============================================================
// Layer 4 — Train/Evaluation Splitter
// ============================================================
// Randomly shuffles records and splits them into two sets:
//   - Training set:   used to fit the vocabulary and weights
//   - Evaluation set: held out to measure generalisation
//
// The split is a uniform random partition without replacement:
// every record lands in exactly one subset and the union is the
// full dataset. The held-out size is round(f · N).
//
// Bad configuration is rejected up front, before any training:
//   - f outside the open interval (0, 1)
//   - a dataset so small that one side would end up empty
//
// Without a seed the RNG is seeded from OS entropy, so repeated
// runs produce different splits. Tests pass a seed.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use anyhow::{ensure, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

/// How to carve the evaluation subset out of the full dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of records held out for evaluation, in (0, 1)
    pub held_out_fraction: f64,
    /// Fixed seed for reproducible splits
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            held_out_fraction: 0.2,
            seed:              None,
        }
    }
}

impl SplitConfig {
    /// Number of records that go to the evaluation side for `total` records.
    pub fn eval_size(&self, total: usize) -> usize {
        ((total as f64) * self.held_out_fraction).round() as usize
    }

    /// Check the fraction and dataset size before anything is shuffled.
    pub fn validate(&self, total: usize) -> Result<()> {
        let f = self.held_out_fraction;
        ensure!(
            f.is_finite() && f > 0.0 && f < 1.0,
            "Held-out fraction must be inside (0, 1), got {f}"
        );

        let eval = self.eval_size(total);
        ensure!(
            eval > 0 && eval < total,
            "Cannot split {total} records with held-out fraction {f}: \
             both subsets must be non-empty"
        );
        Ok(())
    }
}

/// Randomly shuffle `samples` and split into (train, eval).
///
/// # Example
/// ```ignore
/// let (train, eval) = split_train_eval(records, &SplitConfig::default())?;
/// // eval holds 20% of the records, train the remaining 80%
/// ```
pub fn split_train_eval<T>(mut samples: Vec<T>, cfg: &SplitConfig) -> Result<(Vec<T>, Vec<T>)> {
    let total = samples.len();
    cfg.validate(total)?;

    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };
    samples.shuffle(&mut rng);

    // split_off(n) leaves [0..n] in `samples` and returns [n..total]
    let eval = samples.split_off(total - cfg.eval_size(total));

    tracing::info!(
        "Dataset split: {} training, {} evaluation ({}% / {}%)",
        samples.len(),
        eval.len(),
        (samples.len() * 100) / total,
        (eval.len() * 100) / total,
    );

    Ok((samples, eval))
}
