use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One vectorized text: sparse bag-of-words counts plus its target.
/// `features` holds (feature index, count) pairs in ascending index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedSample {
    pub features: Vec<(u32, f32)>,
    /// +1.0 for popular, -1.0 otherwise (hinge-loss convention)
    pub target:   f32,
}

impl EncodedSample {
    pub fn new(features: Vec<(u32, f32)>, label: bool) -> Self {
        Self {
            features,
            target: if label { 1.0 } else { -1.0 },
        }
    }
}

pub struct EncodedDataset {
    samples: Vec<EncodedSample>,
}

impl EncodedDataset {
    pub fn new(samples: Vec<EncodedSample>) -> Self { Self { samples } }
}

impl Dataset<EncodedSample> for EncodedDataset {
    fn get(&self, index: usize) -> Option<EncodedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
