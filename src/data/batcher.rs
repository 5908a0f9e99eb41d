// ============================================================
// Layer 4 — Feature Batcher
// ============================================================
// Implements burn's Batcher trait to turn a Vec<EncodedSample>
// into dense tensors.
//
// Samples arrive sparse: only the (index, count) pairs of the
// words that actually occur in the title. The classifier needs
// a dense [batch, n_features] matrix, so the batcher scatters
// every pair into a zeroed row:
//
//   sample 0: [(2, 1.0), (5, 2.0)]     row 0: 0 0 1 0 0 2
//   sample 1: [(0, 1.0)]           →   row 1: 1 0 0 0 0 0
//
// Only one mini-batch is ever dense at a time, which keeps
// memory bounded by batch_size × n_features.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::EncodedSample;

// ─── FeatureBatch ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    /// Term counts, shape: [batch_size, n_features]
    pub features: Tensor<B, 2>,

    /// ±1 targets, shape: [batch_size]
    pub targets: Tensor<B, 1>,
}

// ─── FeatureBatcher ───────────────────────────────────────────────────────────
/// Holds the target device and the feature width of the vocabulary.
#[derive(Clone, Debug)]
pub struct FeatureBatcher<B: Backend> {
    pub device:     B::Device,
    pub n_features: usize,
}

impl<B: Backend> FeatureBatcher<B> {
    pub fn new(device: B::Device, n_features: usize) -> Self {
        Self { device, n_features }
    }
}

impl<B: Backend> Batcher<EncodedSample, FeatureBatch<B>> for FeatureBatcher<B> {
    fn batch(&self, items: Vec<EncodedSample>) -> FeatureBatch<B> {
        let batch_size = items.len();

        // ── Scatter sparse counts into one flat row-major buffer ─────────────
        let mut dense = vec![0.0f32; batch_size * self.n_features];
        for (row, sample) in items.iter().enumerate() {
            let offset = row * self.n_features;
            for &(idx, count) in &sample.features {
                dense[offset + idx as usize] += count;
            }
        }

        let targets: Vec<f32> = items.iter().map(|s| s.target).collect();

        let features = Tensor::<B, 2>::from_data(
            TensorData::new(dense, [batch_size, self.n_features]),
            &self.device,
        );
        let targets = Tensor::<B, 1>::from_data(
            TensorData::new(targets, [batch_size]),
            &self.device,
        );

        FeatureBatch { features, targets }
    }
}
