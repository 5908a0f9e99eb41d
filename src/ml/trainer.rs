// ============================================================
// Layer 5 — Training Pass
// ============================================================
// One incremental optimisation pass over the training data:
// shuffled mini-batches through burn's DataLoader, hinge loss
// plus L2 penalty, plain SGD update per batch.
//
//   θ = θ - lr · ∇(hinge + alpha/2 · ‖w‖²)
//
// The model comes in by value and goes back out by value, so
// the caller always holds the latest weights explicitly. Plain
// SGD carries no optimiser state, which means a fresh optimiser
// per pass is an exact warm start from the incoming weights.
//
// Training uses TrainBackend (Autodiff<NdArray>) for gradients;
// prediction goes through model.valid() on InferBackend.
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::DataLoaderBuilder,
    optim::{GradientsParams, Optimizer, SgdConfig},
    prelude::*,
};

use crate::data::{
    batcher::FeatureBatcher,
    dataset::{EncodedDataset, EncodedSample},
};
use crate::ml::model::LinearClassifier;

pub type TrainBackend = Autodiff<NdArray>;
pub type InferBackend = NdArray;

/// Every tensor lives on the CPU ndarray device.
pub fn device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

/// Knobs for a single pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSettings {
    pub alpha:         f64,
    pub learning_rate: f64,
    pub batch_size:    usize,
    /// Shuffle seed for this pass's data order
    pub seed:          u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStats {
    /// Mean of the per-batch losses
    pub mean_loss: f64,
    pub batches:   usize,
}

pub fn train_pass(
    mut model:  LinearClassifier<TrainBackend>,
    samples:    Vec<EncodedSample>,
    n_features: usize,
    settings:   PassSettings,
) -> Result<(LinearClassifier<TrainBackend>, PassStats)> {
    ensure!(!samples.is_empty(), "Cannot train on an empty dataset");

    let mut optim = SgdConfig::new().init();

    let batcher = FeatureBatcher::<TrainBackend>::new(device(), n_features);
    let loader  = DataLoaderBuilder::new(batcher)
        .batch_size(settings.batch_size)
        .shuffle(settings.seed)
        .build(EncodedDataset::new(samples));

    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;

    for batch in loader.iter() {
        let loss = model.forward_loss(batch.features, batch.targets, settings.alpha);

        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
        ensure!(
            loss_val.is_finite(),
            "Optimizer diverged: loss became {} at batch {}",
            loss_val,
            batches + 1
        );
        loss_sum += loss_val;
        batches  += 1;

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(settings.learning_rate, model, grads);
    }

    let stats = PassStats {
        mean_loss: loss_sum / batches as f64,
        batches,
    };
    tracing::debug!(
        "Pass done: {} batches, mean loss {:.4}",
        stats.batches,
        stats.mean_loss
    );
    Ok((model, stats))
}
