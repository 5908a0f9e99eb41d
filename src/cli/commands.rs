// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands, `train`, `tune` and
// `predict`, and all their configurable flags.
//
// Flags shared by train and tune live in DataArgs and
// PipelineArgs and are flattened into both commands.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use std::{path::PathBuf, time::Duration};

use crate::application::{train_use_case::TrainConfig, tune_use_case::TuneConfig};
use crate::data::splitter::SplitConfig;
use crate::domain::trial::TieBreak;
use crate::ml::pipeline::PipelineConfig;
use crate::search::{
    runner::SearchOptions,
    space::{ParamSpec, SearchSpace},
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit one classifier with fixed hyperparameters
    Train(TrainArgs),

    /// Search alpha (and optionally the learning rate) over concurrent trials
    Tune(TuneArgs),

    /// Label titles with a saved model
    Predict(PredictArgs),
}

// ─── Shared flags ────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct DataArgs {
    /// JSONL files with one {"data": {"title", "score"}} object per line
    #[arg(long, required = true, num_args = 1..)]
    pub data: Vec<PathBuf>,

    /// Fraction of records held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub held_out: f64,

    /// Seed for the train/eval split (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}

impl DataArgs {
    fn split(&self) -> SplitConfig {
        SplitConfig {
            held_out_fraction: self.held_out,
            seed:              self.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Mini-batch size for SGD
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Keep only the N most frequent words
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Seed for the per-pass shuffle
    #[arg(long, default_value_t = 42)]
    pub shuffle_seed: u64,
}

impl PipelineArgs {
    fn config(&self, alpha: f64, learning_rate: f64, epochs: usize) -> PipelineConfig {
        PipelineConfig {
            alpha,
            learning_rate,
            epochs,
            batch_size:   self.batch_size,
            seed:         self.shuffle_seed,
            max_features: self.max_features,
        }
    }
}

// ─── train ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// L2 regularization strength
    #[arg(long, default_value_t = 1e-4)]
    pub alpha: f64,

    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f64,

    /// Passes over the training split
    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Where train_config.json and model/ are written
    #[arg(long, default_value = "runs/train")]
    pub output_dir: PathBuf,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            split:      a.data.split(),
            pipeline:   a.pipeline.config(a.alpha, a.learning_rate, a.epochs),
            data:       a.data.data,
            output_dir: a.output_dir,
        }
    }
}

// ─── tune ────────────────────────────────────────────────────────────────────
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum TieBreakArg {
    /// Keep the first result seen at a given accuracy
    First,
    /// Prefer the most recent result at an equal accuracy
    Last,
}

impl From<TieBreakArg> for TieBreak {
    fn from(t: TieBreakArg) -> Self {
        match t {
            TieBreakArg::First => TieBreak::FirstObserved,
            TieBreakArg::Last  => TieBreak::LastObserved,
        }
    }
}

#[derive(Args, Debug)]
pub struct TuneArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Candidate alpha values, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [1e-4, 1e-3, 1e-2, 1e-1])]
    pub alpha: Vec<f64>,

    /// Candidate learning rates, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = [0.01])]
    pub learning_rate: Vec<f64>,

    /// Incremental training rounds per trial
    #[arg(long, default_value_t = 5)]
    pub rounds: usize,

    /// Which of two equally accurate results counts as best
    #[arg(long, value_enum, default_value_t = TieBreakArg::First)]
    pub tie_break: TieBreakArg,

    /// Fail a trial that reports nothing for this many seconds
    #[arg(long)]
    pub trial_timeout_secs: Option<u64>,

    /// Where trial directories and results.json are written
    #[arg(long, default_value = "runs/tune")]
    pub output_dir: PathBuf,
}

impl TryFrom<TuneArgs> for TuneConfig {
    type Error = anyhow::Error;

    fn try_from(a: TuneArgs) -> Result<Self> {
        let space = SearchSpace {
            alpha:         ParamSpec::from_values(a.alpha)?,
            learning_rate: ParamSpec::from_values(a.learning_rate)?,
        };
        let options = SearchOptions {
            rounds:        a.rounds,
            tie_break:     a.tie_break.into(),
            trial_timeout: a.trial_timeout_secs.map(Duration::from_secs),
        };

        // Each round is one pass, so epochs play no part in a search.
        let defaults = PipelineConfig::default();
        let base     = a.pipeline.config(defaults.alpha, defaults.learning_rate, defaults.epochs);

        Ok(TuneConfig {
            split:      a.data.split(),
            data:       a.data.data,
            output_dir: a.output_dir,
            space,
            options,
            base,
        })
    }
}

// ─── predict ─────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Snapshot directory, or a trial directory to use its latest round
    #[arg(long)]
    pub checkpoint: PathBuf,

    /// Title to label; repeat for several
    #[arg(long, required = true)]
    pub text: Vec<String>,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("popularity-tune").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_tune_defaults_sweep_four_alphas() {
        let Commands::Tune(args) = parse(&["tune", "--data", "a.jsonl", "b.jsonl"]) else {
            panic!("expected tune");
        };
        let cfg = TuneConfig::try_from(args).unwrap();

        assert_eq!(cfg.data.len(), 2);
        assert_eq!(cfg.space.trials().len(), 4);
        assert_eq!(cfg.space.learning_rate, ParamSpec::Fixed(0.01));
        assert_eq!(cfg.options, SearchOptions::default());
        assert_eq!(cfg.split.held_out_fraction, 0.2);
    }

    #[test]
    fn test_tune_lists_and_timeout() {
        let cmd = parse(&[
            "tune", "--data", "a.jsonl",
            "--alpha", "0.5,1.5",
            "--learning-rate", "0.1,0.2",
            "--tie-break", "last",
            "--trial-timeout-secs", "30",
            "--seed", "9",
        ]);
        let Commands::Tune(args) = cmd else { panic!("expected tune") };
        let cfg = TuneConfig::try_from(args).unwrap();

        assert_eq!(cfg.space.alpha, ParamSpec::Grid(vec![0.5, 1.5]));
        assert_eq!(cfg.space.len(), 4);
        assert_eq!(cfg.options.tie_break, TieBreak::LastObserved);
        assert_eq!(cfg.options.trial_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.split.seed, Some(9));
    }

    #[test]
    fn test_train_args_become_config() {
        let Commands::Train(args) = parse(&[
            "train", "--data", "a.jsonl", "--alpha", "0.01", "--epochs", "3", "--max-features", "500",
        ]) else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.pipeline.alpha, 0.01);
        assert_eq!(cfg.pipeline.epochs, 3);
        assert_eq!(cfg.pipeline.max_features, Some(500));
        assert_eq!(cfg.output_dir, PathBuf::from("runs/train"));
    }

    #[test]
    fn test_data_is_required() {
        let argv = ["popularity-tune", "train"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
