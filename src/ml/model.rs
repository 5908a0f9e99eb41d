use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct LinearClassifierConfig {
    pub n_features: usize,
}

impl LinearClassifierConfig {
    /// All weights and the bias start at zero so fitting is reproducible.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LinearClassifier<B> {
        let linear = LinearConfig::new(self.n_features, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);
        LinearClassifier { linear }
    }
}

/// Linear SVM: score = w·x + b, popular when score > 0.
#[derive(Module, Debug)]
pub struct LinearClassifier<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> LinearClassifier<B> {
    /// features: [batch, n_features] → decision scores: [batch]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 1> {
        let [batch_size, _] = features.dims();
        self.linear.forward(features).reshape([batch_size])
    }

    /// Mean hinge loss plus the L2 penalty alpha/2 · ‖w‖².
    /// targets are ±1.
    pub fn forward_loss(
        &self,
        features: Tensor<B, 2>,
        targets:  Tensor<B, 1>,
        alpha:    f64,
    ) -> Tensor<B, 1> {
        let scores = self.forward(features);
        let hinge  = (targets * scores)
            .neg()
            .add_scalar(1.0)
            .clamp_min(0.0)
            .mean();

        let weight  = self.linear.weight.val();
        let penalty = (weight.clone() * weight).sum().mul_scalar(alpha / 2.0);

        hinge + penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};
    use burn::tensor::TensorData;

    #[test]
    fn test_zero_model_scores_zero_and_loss_is_one() {
        let device = NdArrayDevice::Cpu;
        let model  = LinearClassifierConfig::new(3).init::<NdArray>(&device);

        let x = Tensor::<NdArray, 2>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 2.0, 0.0, 1.0, 0.0], [2, 3]),
            &device,
        );
        let y = Tensor::<NdArray, 1>::from_data(TensorData::new(vec![1.0f32, -1.0], [2]), &device);

        let scores: Vec<f32> = model.forward(x.clone()).into_data().to_vec().unwrap();
        assert_eq!(scores, vec![0.0, 0.0]);

        // Every margin is 0, so each hinge term is exactly 1 and the penalty is 0.
        let loss: f32 = model.forward_loss(x, y, 0.5).into_scalar().elem();
        assert!((loss - 1.0).abs() < 1e-6);
    }
}
