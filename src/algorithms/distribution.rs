//! Categorical action distribution over discrete actions.
//!
//! Wraps the policy head's logits and provides the three operations the
//! loss and the rollout layer need: log probability of taken actions,
//! entropy, and sampling.

use burn::tensor::activation::softmax;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

/// Categorical distribution parameterized by unnormalized logits.
#[derive(Clone)]
pub struct Categorical<B: Backend> {
    /// Unnormalized log probabilities: `[batch, n_actions]`.
    pub logits: Tensor<B, 2>,
}

impl<B: Backend> Categorical<B> {
    /// Create from a logits tensor.
    pub fn new(logits: Tensor<B, 2>) -> Self {
        Self { logits }
    }

    /// Probabilities (softmax of logits).
    pub fn probs(&self) -> Tensor<B, 2> {
        softmax(self.logits.clone(), 1)
    }

    /// Number of actions.
    pub fn n_actions(&self) -> usize {
        self.logits.dims()[1]
    }

    /// Batch size.
    pub fn batch_size(&self) -> usize {
        self.logits.dims()[0]
    }

    /// Log probability of the given actions: `[batch]`.
    pub fn log_prob(&self, actions: &[u32], device: &B::Device) -> Tensor<B, 1> {
        let batch_size = actions.len();
        assert_eq!(
            batch_size,
            self.batch_size(),
            "actions length does not match distribution batch size"
        );

        let probs = self.probs();

        let action_indices: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
        let actions_tensor: Tensor<B, 1, Int> =
            Tensor::from_ints(action_indices.as_slice(), device);
        let actions_2d: Tensor<B, 2, Int> = actions_tensor.reshape([batch_size, 1]);

        let selected = probs.gather(1, actions_2d);
        let selected_1d: Tensor<B, 1> = selected.flatten(0, 1);

        // 1e-8 floor keeps log finite for near-zero probabilities
        (selected_1d + 1e-8).log()
    }

    /// Per-element entropy: `[batch]`.
    pub fn entropy(&self) -> Tensor<B, 1> {
        let probs = self.probs();
        let log_probs = (probs.clone() + 1e-8).log();
        let neg_entropy: Tensor<B, 2> = (probs * log_probs).sum_dim(1);
        -neg_entropy.flatten(0, 1)
    }

    /// Sample one action per batch element.
    ///
    /// Returns `(actions, log_probs)` for rollout collection.
    pub fn sample(&self) -> (Vec<u32>, Vec<f32>) {
        let probs = self.probs();
        let probs_data = probs.to_data();
        let probs_slice: &[f32] = probs_data.as_slice().unwrap();

        let batch_size = self.batch_size();
        let n_actions = self.n_actions();

        let mut actions = Vec::with_capacity(batch_size);
        let mut log_probs = Vec::with_capacity(batch_size);

        for i in 0..batch_size {
            let rand_val = fastrand::f32();
            let mut cumsum = 0.0;
            let mut selected = (n_actions - 1) as u32;

            for a in 0..n_actions {
                cumsum += probs_slice[i * n_actions + a];
                // Last-action fallback absorbs float rounding in the cumsum.
                if rand_val < cumsum || a == n_actions - 1 {
                    selected = a as u32;
                    break;
                }
            }

            let prob = probs_slice[i * n_actions + selected as usize];
            actions.push(selected);
            log_probs.push((prob + 1e-8).ln());
        }

        (actions, log_probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_log_prob_matches_softmax() {
        let device = Default::default();
        let logits: Tensor<B, 2> = Tensor::from_floats([[0.0, 0.0], [2.0, 0.0]], &device);
        let dist = Categorical::new(logits);

        let lp = dist.log_prob(&[0, 1], &device);
        let lp_data = lp.into_data();
        let lp = lp_data.as_slice::<f32>().unwrap();

        // Uniform over two actions: log(0.5)
        assert!((lp[0] - 0.5f32.ln()).abs() < 1e-5);
        // softmax([2, 0])[1] = 1 / (1 + e^2)
        let expected = (1.0 / (1.0 + 2.0f32.exp())).ln();
        assert!((lp[1] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_entropy_ordering() {
        let device = Default::default();
        let uniform = Categorical::<B>::new(Tensor::from_floats([[1.0, 1.0, 1.0]], &device));
        let peaked = Categorical::<B>::new(Tensor::from_floats([[10.0, 0.0, 0.0]], &device));

        let e_uniform = uniform.entropy().into_data().as_slice::<f32>().unwrap()[0];
        let e_peaked = peaked.entropy().into_data().as_slice::<f32>().unwrap()[0];

        assert!(e_uniform > e_peaked);
        // Uniform entropy over 3 actions is ln(3)
        assert!((e_uniform - 3.0f32.ln()).abs() < 1e-4);
    }

    #[test]
    fn test_sample_in_range() {
        let device = Default::default();
        let logits: Tensor<B, 2> =
            Tensor::from_floats([[1.0, 2.0, 3.0], [3.0, 2.0, 1.0]], &device);
        let dist = Categorical::new(logits);

        let (actions, log_probs) = dist.sample();
        assert_eq!(actions.len(), 2);
        assert_eq!(log_probs.len(), 2);
        for a in actions {
            assert!(a < 3);
        }
    }
}
