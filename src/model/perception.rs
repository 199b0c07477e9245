//! Conv-LSTM perception model: policy logits and value estimate per timestep.
//!
//! Observations arrive channel-last (`[rows, h, w, c]`, the rollout layout)
//! and are reordered to channel-first before convolution. The flattened conv
//! features feed a single-layer LSTM whose hidden state is carried across
//! sequential forward calls within an episode; the LSTM output feeds an
//! action head and a scalar value head.
//!
//! Burn modules are immutable during forward, so the per-batch feature
//! caches live in [`PerceptionModel`], a plain wrapper owning the
//! [`PerceptionNet`] module. [`PerceptionModel::value_function`] serves the
//! most recently processed batch and fails loudly if no forward pass has
//! happened yet.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Lstm, LstmConfig, LstmState};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::core::recurrent::HiddenState;

use super::encoder::{ConvEncoder, ConvEncoderConfig};

/// Configuration for the perception model.
#[derive(Debug, Clone)]
pub struct PerceptionConfig {
    /// Observation shape (height, width, channels).
    pub obs_shape: (usize, usize, usize),
    /// Action space size (fixed at construction from the environment).
    pub n_actions: usize,
    /// LSTM hidden width.
    pub hidden_size: usize,
}

impl PerceptionConfig {
    /// Create a config for the given observation shape and action space.
    pub fn new(obs_shape: (usize, usize, usize), n_actions: usize) -> Self {
        Self {
            obs_shape,
            n_actions,
            hidden_size: 256,
        }
    }

    /// Set the LSTM hidden width.
    pub fn with_hidden_size(mut self, hidden_size: usize) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    /// Initialize the model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> PerceptionModel<B> {
        let (h, w, c) = self.obs_shape;
        let encoder_config = ConvEncoderConfig::new(h, w).with_in_channels(c);
        let feat = encoder_config.out_features();

        let net = PerceptionNet {
            encoder: encoder_config.init(device),
            lstm: LstmConfig::new(feat, self.hidden_size, true).init(device),
            action_head: LinearConfig::new(self.hidden_size, self.n_actions).init(device),
            value_head: LinearConfig::new(self.hidden_size, 1).init(device),
            hidden_size: self.hidden_size,
            n_actions: self.n_actions,
        };

        PerceptionModel {
            net,
            device: device.clone(),
            obs_shape: self.obs_shape,
            lstm_features: None,
            conv_features: None,
        }
    }
}

/// Output of one [`PerceptionNet::forward`] pass.
pub struct NetForward<B: Backend> {
    /// Flattened conv features: `[rows, feat]`.
    pub conv_features: Tensor<B, 2>,
    /// LSTM outputs: `[n_seqs, max_len, hidden]`.
    pub lstm_features: Tensor<B, 3>,
    /// Action logits: `[rows, n_actions]`.
    pub logits: Tensor<B, 2>,
    /// Final recurrent state after the sequence.
    pub state_out: HiddenState<B>,
}

/// The trainable network: conv encoder, LSTM core, action and value heads.
#[derive(Module, Debug)]
pub struct PerceptionNet<B: Backend> {
    encoder: ConvEncoder<B>,
    lstm: Lstm<B>,
    action_head: Linear<B>,
    value_head: Linear<B>,
    #[module(skip)]
    hidden_size: usize,
    #[module(skip)]
    n_actions: usize,
}

impl<B: Backend> PerceptionNet<B> {
    /// LSTM hidden width.
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Action space size.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Full forward pass over a padded batch of sequences.
    ///
    /// `obs` is channel-last `[rows, h, w, c]` with
    /// `rows == n_seqs * max_len`; `state` is the `[n_seqs, hidden]` initial
    /// recurrent state.
    pub fn forward(
        &self,
        obs: Tensor<B, 4>,
        state: &HiddenState<B>,
        n_seqs: usize,
        max_len: usize,
    ) -> NetForward<B> {
        let [rows, _, _, _] = obs.dims();
        assert_eq!(
            n_seqs * max_len,
            rows,
            "rows ({}) must equal n_seqs ({}) * max_len ({})",
            rows,
            n_seqs,
            max_len
        );
        assert_eq!(state.batch(), n_seqs, "state batch does not match n_seqs");
        assert_eq!(
            state.size(),
            self.hidden_size,
            "state width does not match hidden size"
        );

        // Channel-last to channel-first for convolution.
        let x = obs.swap_dims(1, 3).swap_dims(2, 3);
        let conv_features = self.encoder.forward(x);

        let feat = self.encoder.out_features();
        let inputs = conv_features.clone().reshape([n_seqs, max_len, feat]);

        let lstm_state = LstmState::new(state.cell.clone(), state.hidden.clone());
        let (lstm_features, new_state) = self.lstm.forward(inputs, Some(lstm_state));

        let flat = lstm_features.clone().reshape([rows, self.hidden_size]);
        let logits = self.action_head.forward(flat);

        NetForward {
            conv_features,
            lstm_features,
            logits,
            state_out: HiddenState::new(new_state.hidden, new_state.cell),
        }
    }

    /// Value estimates from LSTM features: `[rows]`.
    pub fn values_from_features(&self, lstm_features: Tensor<B, 3>) -> Tensor<B, 1> {
        let [n_seqs, max_len, hidden] = lstm_features.dims();
        let flat = lstm_features.reshape([n_seqs * max_len, hidden]);
        self.value_head.forward(flat).flatten(0, 1)
    }
}

/// Perception model: the network plus the per-batch feature caches.
pub struct PerceptionModel<B: Backend> {
    net: PerceptionNet<B>,
    device: B::Device,
    obs_shape: (usize, usize, usize),
    lstm_features: Option<Tensor<B, 3>>,
    conv_features: Option<Tensor<B, 2>>,
}

impl<B: Backend> PerceptionModel<B> {
    /// Forward pass over a padded observation batch.
    ///
    /// `seq_lens` holds the true length of each sequence in the batch; an
    /// empty slice treats every row as its own length-1 sequence (the
    /// single-step inference case). Returns action logits `[rows,
    /// n_actions]` and the updated recurrent state.
    pub fn forward(
        &mut self,
        obs: Tensor<B, 4>,
        state: &HiddenState<B>,
        seq_lens: &[usize],
    ) -> (Tensor<B, 2>, HiddenState<B>) {
        let [rows, h, w, c] = obs.dims();
        assert_eq!(
            (h, w, c),
            self.obs_shape,
            "observation dims do not match model obs_shape"
        );

        let (n_seqs, max_len) = if seq_lens.is_empty() {
            (rows, 1)
        } else {
            let max_len = seq_lens.iter().copied().max().unwrap_or(0);
            (seq_lens.len(), max_len)
        };

        let out = self.net.forward(obs, state, n_seqs, max_len);

        self.conv_features = Some(out.conv_features);
        self.lstm_features = Some(out.lstm_features);

        (out.logits, out.state_out)
    }

    /// Value estimates for the most recently processed batch: `[rows]`.
    ///
    /// # Panics
    ///
    /// Panics if called before any [`forward`](Self::forward) call;
    /// returning stale or default values here would silently corrupt the
    /// training signal.
    pub fn value_function(&self) -> Tensor<B, 1> {
        let features = self
            .lstm_features
            .as_ref()
            .expect("must call forward() first");
        self.net.values_from_features(features.clone())
    }

    /// Zero-valued initial recurrent state for `n_seqs` sequences.
    pub fn get_initial_state(&self, n_seqs: usize) -> HiddenState<B> {
        HiddenState::zeros(n_seqs, self.net.hidden_size(), &self.device)
    }

    /// Conv features of the most recent batch.
    ///
    /// Side channel for consumers that want to reuse the encoding; the
    /// curiosity network deliberately does not (it owns an independent
    /// encoder).
    pub fn conv_features(&self) -> Option<&Tensor<B, 2>> {
        self.conv_features.as_ref()
    }

    /// Evaluate the value function for one observation under a given
    /// recurrent state, without touching the per-batch caches.
    ///
    /// This is the bootstrap path for truncated trajectories: the
    /// post-processor replays the recorded final state through a
    /// single-row, single-step evaluation.
    pub fn bootstrap_value(&self, obs: &[f32], state: &HiddenState<B>) -> f32 {
        let (h, w, c) = self.obs_shape;
        assert_eq!(obs.len(), h * w * c, "obs length does not match obs_shape");
        assert_eq!(state.batch(), 1, "bootstrap state must have batch 1");

        let obs_tensor = Tensor::<B, 1>::from_floats(obs, &self.device).reshape([1, h, w, c]);
        let out = self.net.forward(obs_tensor, state, 1, 1);
        let values = self.net.values_from_features(out.lstm_features);

        values.into_data().as_slice::<f32>().unwrap()[0]
    }

    /// LSTM hidden width.
    pub fn hidden_size(&self) -> usize {
        self.net.hidden_size()
    }

    /// Action space size.
    pub fn num_actions(&self) -> usize {
        self.net.n_actions()
    }

    /// Observation shape (height, width, channels).
    pub fn obs_shape(&self) -> (usize, usize, usize) {
        self.obs_shape
    }

    /// Whether the model carries recurrent state across timesteps.
    pub fn is_recurrent(&self) -> bool {
        true
    }

    /// The model device.
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Borrow the trainable network (for gradient extraction).
    pub fn net(&self) -> &PerceptionNet<B> {
        &self.net
    }

    /// Replace the trainable network after an optimizer step.
    pub fn set_net(&mut self, net: PerceptionNet<B>) {
        self.net = net;
    }
}
