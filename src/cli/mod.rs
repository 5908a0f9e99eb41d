// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, hands the resulting config to a
// Layer 2 use case and prints what comes back.
//
//   1. `train`   — fit one model and save it
//   2. `tune`    — concurrent search over alpha / learning rate
//   3. `predict` — label titles with a saved model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs, TuneArgs};

use crate::domain::trial::TrialState;

#[derive(Parser, Debug)]
#[command(
    name = "popularity-tune",
    version = "0.1.0",
    about = "Predict post popularity from titles and tune the regularization strength."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Tune(args)    => run_tune(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!("Threshold (median score): {}", summary.threshold);
    println!(
        "Records: {} ({} popular; {} train / {} eval)",
        summary.total, summary.positives, summary.train_size, summary.eval_size
    );
    println!("Train accuracy: {:.4}", summary.train_accuracy);
    println!("Eval accuracy:  {:.4}", summary.eval_accuracy);
    println!("Model saved to {}", summary.model_dir.display());
    Ok(())
}

fn run_tune(args: TuneArgs) -> Result<()> {
    use crate::application::tune_use_case::{TuneConfig, TuneUseCase};

    let config  = TuneConfig::try_from(args)?;
    let summary = TuneUseCase::new(config).execute()?;
    let outcome = &summary.outcome;

    println!("Threshold (median score): {} ({} popular)", summary.threshold, summary.positives);
    println!("Split: {} train / {} eval", summary.train_size, summary.eval_size);
    println!();
    println!("{:>5}  {:>10}  {:>10}  {:>7}  {:>9}  status", "trial", "alpha", "lr", "rounds", "best_acc");
    for t in &outcome.trials {
        let status = match &t.state {
            TrialState::Finished      => "finished".to_string(),
            TrialState::Failed(error) => format!("failed: {error}"),
            other                     => format!("{other:?}"),
        };
        let best = t
            .best_eval_accuracy
            .map_or_else(|| "-".to_string(), |a| format!("{a:.4}"));
        println!(
            "{:>5}  {:>10}  {:>10}  {:>7}  {:>9}  {}",
            t.config.id, t.config.alpha, t.config.learning_rate, t.rounds_completed, best, status
        );
    }
    println!();

    let best = outcome.best()?;
    let config = outcome
        .trials
        .iter()
        .find(|t| t.config.id == best.trial)
        .map(|t| &t.config);
    match config {
        Some(c) => println!(
            "Best: trial {} (alpha={}, lr={}) round {} eval_accuracy={:.4}",
            best.trial, c.alpha, c.learning_rate, best.round, best.eval_accuracy
        ),
        None => println!(
            "Best: trial {} round {} eval_accuracy={:.4}",
            best.trial, best.round, best.eval_accuracy
        ),
    }
    println!("Checkpoint: {}", best.checkpoint.display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.checkpoint)?;
    println!("Model: {}", use_case.snapshot().display());
    for p in use_case.predict(&args.text)? {
        let label = if p.popular { "popular" } else { "not popular" };
        println!("{label}\t{}", p.text);
    }
    Ok(())
}
