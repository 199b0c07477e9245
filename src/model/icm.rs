//! Intrinsic curiosity network (ICM).
//!
//! Learns a forward dynamics model (predict the next observation encoding
//! from the current encoding and the action) and an inverse dynamics model
//! (predict the action from consecutive encodings). The forward model's
//! prediction error doubles as an intrinsic exploration reward: states the
//! model cannot yet predict are worth visiting.
//!
//! The ICM owns its encoder. It has the same architecture as the perception
//! model's encoder but independent parameters, trained against the ICM's own
//! objective; no tensors or weights are shared. All entry points are
//! separable and side-effect free so callers can combine the losses however
//! their training loop requires.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::{leaky_relu, log_softmax};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use super::encoder::{ConvEncoder, ConvEncoderConfig};

/// Configuration for the curiosity network.
#[derive(Debug, Clone)]
pub struct IcmConfig {
    /// Observation shape (height, width, channels).
    pub obs_shape: (usize, usize, usize),
    /// Action space size.
    pub n_actions: usize,
    /// Encoding width for the forward/inverse heads.
    pub feat_size: usize,
}

impl IcmConfig {
    /// Create a config for the given observation shape and action space.
    pub fn new(obs_shape: (usize, usize, usize), n_actions: usize) -> Self {
        Self {
            obs_shape,
            n_actions,
            feat_size: 256,
        }
    }

    /// Set the encoding width.
    pub fn with_feat_size(mut self, feat_size: usize) -> Self {
        self.feat_size = feat_size;
        self
    }

    /// Initialize the network.
    pub fn init<B: Backend>(&self, device: &B::Device) -> IcmNet<B> {
        let (h, w, c) = self.obs_shape;
        let encoder_config = ConvEncoderConfig::new(h, w).with_in_channels(c);
        let enc_out = encoder_config.out_features();

        IcmNet {
            encoder: encoder_config.init(device),
            feat_proj: LinearConfig::new(enc_out, self.feat_size).init(device),
            fwd_hidden: LinearConfig::new(self.feat_size + self.n_actions, self.feat_size)
                .init(device),
            fwd_out: LinearConfig::new(self.feat_size, self.feat_size).init(device),
            inv_hidden: LinearConfig::new(2 * self.feat_size, self.feat_size).init(device),
            inv_out: LinearConfig::new(self.feat_size, self.n_actions).init(device),
            n_actions: self.n_actions,
            feat_size: self.feat_size,
        }
    }
}

/// Intrinsic curiosity network.
#[derive(Module, Debug)]
pub struct IcmNet<B: Backend> {
    encoder: ConvEncoder<B>,
    feat_proj: Linear<B>,
    fwd_hidden: Linear<B>,
    fwd_out: Linear<B>,
    inv_hidden: Linear<B>,
    inv_out: Linear<B>,
    #[module(skip)]
    n_actions: usize,
    #[module(skip)]
    feat_size: usize,
}

impl<B: Backend> IcmNet<B> {
    /// Encoding width.
    pub fn feat_size(&self) -> usize {
        self.feat_size
    }

    /// Action space size.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Encode paired observation batches.
    ///
    /// Inputs are channel-last `[batch, h, w, c]`; both pass through the
    /// one ICM encoder, producing `(feat, next_feat)` of `[batch,
    /// feat_size]` each.
    pub fn encode(
        &self,
        obs: Tensor<B, 4>,
        next_obs: Tensor<B, 4>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        (self.encode_one(obs), self.encode_one(next_obs))
    }

    fn encode_one(&self, obs: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = obs.swap_dims(1, 3).swap_dims(2, 3);
        let x = self.encoder.forward(x);
        leaky_relu(self.feat_proj.forward(x), 0.01)
    }

    /// Forward dynamics: predict `next_feat` from `feat` and the action.
    pub fn forward_model(&self, feat: Tensor<B, 2>, actions: &[u32]) -> Tensor<B, 2> {
        let batch = feat.dims()[0];
        assert_eq!(
            actions.len(),
            batch,
            "actions length does not match feature batch"
        );

        let device = feat.device();
        let action_enc = one_hot::<B>(actions, self.n_actions, &device);
        let x = Tensor::cat(vec![feat, action_enc], 1);
        let x = leaky_relu(self.fwd_hidden.forward(x), 0.01);
        self.fwd_out.forward(x)
    }

    /// Inverse dynamics: predict action logits from consecutive encodings.
    pub fn inverse_model(&self, feat: Tensor<B, 2>, next_feat: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = Tensor::cat(vec![feat, next_feat], 1);
        let x = leaky_relu(self.inv_hidden.forward(x), 0.01);
        self.inv_out.forward(x)
    }

    /// Forward-model loss: mean over the batch of half squared prediction
    /// error.
    pub fn forward_loss(&self, pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
        let per_row: Tensor<B, 1> = (pred - target)
            .powf_scalar(2.0)
            .sum_dim(1)
            .flatten(0, 1)
            .mul_scalar(0.5);
        per_row.mean()
    }

    /// Per-sample intrinsic reward: half squared prediction error per row.
    pub fn intrinsic_reward(&self, pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Vec<f32> {
        let per_row: Tensor<B, 1> = (pred - target)
            .powf_scalar(2.0)
            .sum_dim(1)
            .flatten(0, 1)
            .mul_scalar(0.5);
        per_row.into_data().as_slice::<f32>().unwrap().to_vec()
    }

    /// Inverse-model loss: cross-entropy of the predicted action
    /// distribution against the actions actually taken.
    pub fn inverse_loss(&self, logits: Tensor<B, 2>, actions: &[u32]) -> Tensor<B, 1> {
        let batch = logits.dims()[0];
        assert_eq!(
            actions.len(),
            batch,
            "actions length does not match logits batch"
        );

        let device = logits.device();
        let log_probs = log_softmax(logits, 1);

        let indices: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
        let idx: Tensor<B, 2, Int> =
            Tensor::<B, 1, Int>::from_ints(indices.as_slice(), &device).reshape([batch, 1]);

        let selected: Tensor<B, 1> = log_probs.gather(1, idx).flatten(0, 1);
        -selected.mean()
    }
}

/// One-hot action encoding: `[batch, n_actions]`.
fn one_hot<B: Backend>(actions: &[u32], n_actions: usize, device: &B::Device) -> Tensor<B, 2> {
    let batch = actions.len();
    let mut data = vec![0.0f32; batch * n_actions];
    for (i, &a) in actions.iter().enumerate() {
        assert!(
            (a as usize) < n_actions,
            "action {} out of range for {} actions",
            a,
            n_actions
        );
        data[i * n_actions + a as usize] = 1.0;
    }
    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([batch, n_actions])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    const OBS: (usize, usize, usize) = (8, 8, 4);

    fn icm() -> IcmNet<B> {
        let device = Default::default();
        IcmConfig::new(OBS, 3).with_feat_size(16).init(&device)
    }

    fn obs_tensor(rows: usize, fill: f32) -> Tensor<B, 4> {
        let device = Default::default();
        Tensor::<B, 1>::from_floats(vec![fill; rows * 8 * 8 * 4].as_slice(), &device)
            .reshape([rows, 8, 8, 4])
    }

    #[test]
    fn test_encode_shapes() {
        let icm = icm();
        let (feat, next_feat) = icm.encode(obs_tensor(2, 0.1), obs_tensor(2, 0.2));

        assert_eq!(feat.dims(), [2, 16]);
        assert_eq!(next_feat.dims(), [2, 16]);
    }

    #[test]
    fn test_forward_model_shape() {
        let icm = icm();
        let (feat, _) = icm.encode(obs_tensor(2, 0.1), obs_tensor(2, 0.2));

        let pred = icm.forward_model(feat, &[0, 2]);
        assert_eq!(pred.dims(), [2, 16]);
    }

    #[test]
    fn test_inverse_model_shape() {
        let icm = icm();
        let (feat, next_feat) = icm.encode(obs_tensor(2, 0.1), obs_tensor(2, 0.2));

        let logits = icm.inverse_model(feat, next_feat);
        assert_eq!(logits.dims(), [2, 3]);
    }

    #[test]
    fn test_intrinsic_reward_zero_for_perfect_prediction() {
        let icm = icm();
        let (feat, _) = icm.encode(obs_tensor(2, 0.1), obs_tensor(2, 0.2));

        let rewards = icm.intrinsic_reward(feat.clone(), feat);
        assert_eq!(rewards.len(), 2);
        for r in rewards {
            assert!(r.abs() < 1e-7);
        }
    }

    #[test]
    fn test_inverse_loss_uniform_logits() {
        let device: <B as Backend>::Device = Default::default();
        let icm = icm();

        // Uniform logits: cross-entropy equals ln(n_actions).
        let logits: Tensor<B, 2> = Tensor::zeros([2, 3], &device);
        let loss = icm.inverse_loss(logits, &[0, 2]);
        let loss = loss.into_data().as_slice::<f32>().unwrap()[0];

        assert!((loss - 3.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_forward_loss_matches_mean_reward() {
        let device: <B as Backend>::Device = Default::default();
        let icm = icm();

        let pred: Tensor<B, 2> = Tensor::zeros([2, 16], &device);
        let target: Tensor<B, 2> = Tensor::ones([2, 16], &device);

        let loss = icm.forward_loss(pred.clone(), target.clone());
        let loss = loss.into_data().as_slice::<f32>().unwrap()[0];
        let rewards = icm.intrinsic_reward(pred, target);
        let mean_reward = rewards.iter().sum::<f32>() / rewards.len() as f32;

        // 0.5 * 16 = 8 per row
        assert!((loss - 8.0).abs() < 1e-5);
        assert!((loss - mean_reward).abs() < 1e-5);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_forward_model_rejects_bad_action() {
        let icm = icm();
        let (feat, _) = icm.encode(obs_tensor(1, 0.1), obs_tensor(1, 0.2));
        let _ = icm.forward_model(feat, &[7]);
    }
}
