//! The tuned A2C policy: explicit composition of the training pieces.
//!
//! The policy owns the perception model, the curiosity network, the
//! optimizer, and the optional learning-rate schedule, and wires them
//! together through pluggable function pointers selected at construction:
//! loss computation, trajectory post-processing, and stats reporting. The
//! defaults are the tuned implementations from this crate; swapping one is
//! an explicit constructor-time decision, not a runtime patch.
//!
//! `learn_on_batch` is the whole training step for one batch: forward,
//! loss, backward, optimizer step at the scheduled rate, stats.

use burn::optim::{GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;

use crate::algorithms::loss::{actor_critic_loss, LossComponents, LossOutput, ModelOutputs};
use crate::algorithms::postprocess::add_advantages;
use crate::config::A2CConfig;
use crate::core::segment::{TrainBatch, TrajectorySegment};
use crate::metrics::stats::{loss_stats, LossStats};
use crate::model::icm::IcmNet;
use crate::model::perception::{PerceptionModel, PerceptionNet};
use crate::optim::rmsprop::lr_schedule_for;
use crate::optim::schedule::{LinearAnneal, LrSchedule};

/// Loss computation hook.
pub type LossFn<B> = fn(&A2CConfig, &ModelOutputs<B>, &TrainBatch) -> LossOutput<B>;

/// Trajectory post-processing hook.
pub type PostprocessFn<B> = fn(&PerceptionModel<B>, &mut TrajectorySegment, &A2CConfig);

/// Stats reporting hook.
pub type StatsFn = fn(&LossComponents, f64) -> LossStats;

/// Curiosity outputs for one observation batch.
pub struct CuriosityOutput<B: AutodiffBackend> {
    /// Forward-model loss (differentiable).
    pub forward_loss: Tensor<B, 1>,
    /// Inverse-model loss (differentiable).
    pub inverse_loss: Tensor<B, 1>,
    /// Per-sample intrinsic exploration reward.
    pub intrinsic_reward: Vec<f32>,
}

/// Tuned A2C policy.
pub struct TunedPolicy<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<PerceptionNet<B>, B>,
{
    model: PerceptionModel<B>,
    icm: IcmNet<B>,
    config: A2CConfig,
    optimizer: O,
    schedule: Option<LinearAnneal>,
    steps: usize,
    loss_fn: LossFn<B>,
    postprocess_fn: PostprocessFn<B>,
    stats_fn: StatsFn,
}

impl<B, O> TunedPolicy<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<PerceptionNet<B>, B>,
{
    /// Create a policy with the default loss, post-processing, and stats
    /// functions.
    ///
    /// The annealing schedule is selected here: when `lr == end_lr` no
    /// schedule object is constructed and the rate stays fixed.
    ///
    /// # Panics
    ///
    /// Panics on an invalid configuration; a bad config would silently
    /// corrupt training if allowed through.
    pub fn new(config: A2CConfig, model: PerceptionModel<B>, icm: IcmNet<B>, optimizer: O) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid A2C configuration: {}", e);
        }

        let schedule = lr_schedule_for(&config);

        Self {
            model,
            icm,
            config,
            optimizer,
            schedule,
            steps: 0,
            loss_fn: actor_critic_loss,
            postprocess_fn: add_advantages,
            stats_fn: loss_stats,
        }
    }

    /// Replace the loss function.
    pub fn with_loss_fn(mut self, loss_fn: LossFn<B>) -> Self {
        self.loss_fn = loss_fn;
        self
    }

    /// Replace the post-processing function.
    pub fn with_postprocess_fn(mut self, postprocess_fn: PostprocessFn<B>) -> Self {
        self.postprocess_fn = postprocess_fn;
        self
    }

    /// Replace the stats function.
    pub fn with_stats_fn(mut self, stats_fn: StatsFn) -> Self {
        self.stats_fn = stats_fn;
        self
    }

    /// Post-process a collected trajectory segment in place.
    pub fn postprocess(&self, segment: &mut TrajectorySegment) {
        (self.postprocess_fn)(&self.model, segment, &self.config);
    }

    /// Run one training step on a batch and report its stats.
    pub fn learn_on_batch(&mut self, batch: &TrainBatch) -> LossStats {
        batch.validate();

        let device = self.model.device().clone();
        let seq_lens = batch.seq_lens.clone().unwrap_or_default();
        let n_seqs = if seq_lens.is_empty() {
            batch.rows()
        } else {
            seq_lens.len()
        };

        let state = batch
            .initial_state::<B>(self.model.hidden_size(), &device)
            .unwrap_or_else(|| self.model.get_initial_state(n_seqs));

        let obs = batch.obs_tensor::<B>(&device);
        let (logits, _) = self.model.forward(obs, &state, &seq_lens);
        let values = self.model.value_function();

        let outputs = ModelOutputs { logits, values };
        let loss = (self.loss_fn)(&self.config, &outputs, batch);

        let cur_lr = self.cur_lr();
        let grads = loss.total.backward();
        let grads = GradientsParams::from_grads(grads, self.model.net());
        let net = self.optimizer.step(cur_lr, self.model.net().clone(), grads);
        self.model.set_net(net);

        self.steps += 1;
        log::debug!(
            "optimizer step {} at lr {:.3e}: policy {:.6}, value {:.6}, entropy {:.6}",
            self.steps,
            cur_lr,
            loss.components.policy_loss,
            loss.components.value_loss,
            loss.components.entropy
        );

        (self.stats_fn)(&loss.components, cur_lr)
    }

    /// Curiosity losses and intrinsic rewards for an observation batch.
    ///
    /// Exposed as a separable side channel: combining these losses with the
    /// actor-critic loss (and feeding the intrinsic reward back into
    /// collection) is the training loop's decision.
    pub fn curiosity(
        &self,
        obs: Tensor<B, 4>,
        next_obs: Tensor<B, 4>,
        actions: &[u32],
    ) -> CuriosityOutput<B> {
        let (feat, next_feat) = self.icm.encode(obs, next_obs);
        let pred = self.icm.forward_model(feat.clone(), actions);
        let logits = self.icm.inverse_model(feat, next_feat.clone());

        CuriosityOutput {
            forward_loss: self.icm.forward_loss(pred.clone(), next_feat.clone()),
            inverse_loss: self.icm.inverse_loss(logits, actions),
            intrinsic_reward: self.icm.intrinsic_reward(pred, next_feat),
        }
    }

    /// Learning rate that will apply to the next optimizer step.
    pub fn cur_lr(&self) -> f64 {
        match &self.schedule {
            Some(schedule) => schedule.lr_at(self.steps),
            None => self.config.lr,
        }
    }

    /// Optimizer steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Whether the policy is recurrent.
    pub fn is_recurrent(&self) -> bool {
        self.model.is_recurrent()
    }

    /// The perception model.
    pub fn model(&self) -> &PerceptionModel<B> {
        &self.model
    }

    /// The curiosity network.
    pub fn icm(&self) -> &IcmNet<B> {
        &self.icm
    }

    /// The configuration.
    pub fn config(&self) -> &A2CConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::model::icm::IcmConfig;
    use crate::model::perception::PerceptionConfig;
    use crate::optim::rmsprop::build_rmsprop;

    type B = Autodiff<NdArray<f32>>;

    const OBS: (usize, usize, usize) = (8, 8, 4);
    const N_ACTIONS: usize = 3;
    const HIDDEN: usize = 8;

    fn policy(config: A2CConfig) -> TunedPolicy<B, impl Optimizer<PerceptionNet<B>, B>> {
        let device = Default::default();
        let model = PerceptionConfig::new(OBS, N_ACTIONS)
            .with_hidden_size(HIDDEN)
            .init(&device);
        let icm = IcmConfig::new(OBS, N_ACTIONS).with_feat_size(8).init(&device);
        let optimizer = build_rmsprop::<B, PerceptionNet<B>>(&config);
        TunedPolicy::new(config, model, icm, optimizer)
    }

    fn batch(rows: usize) -> TrainBatch {
        TrainBatch {
            obs: vec![0.1; rows * 8 * 8 * 4],
            obs_shape: OBS,
            actions: (0..rows).map(|i| (i % N_ACTIONS) as u32).collect(),
            rewards: vec![1.0; rows],
            advantages: vec![0.5; rows],
            value_targets: vec![0.25; rows],
            seq_lens: Some(vec![rows]),
            state_in: None,
        }
    }

    #[test]
    fn test_learn_on_batch_reports_finite_stats() {
        let mut policy = policy(A2CConfig::new());
        let stats = policy.learn_on_batch(&batch(2));

        assert!(stats.policy_loss.is_finite());
        assert!(stats.vf_loss.is_finite());
        assert!(stats.policy_entropy.is_finite());
        assert_eq!(policy.steps(), 1);
    }

    #[test]
    fn test_fixed_rate_path_never_changes_lr() {
        let config = A2CConfig::new().with_lr(1e-3).with_end_lr(1e-3);
        let mut policy = policy(config);

        assert_eq!(policy.cur_lr(), 1e-3);
        for _ in 0..3 {
            let stats = policy.learn_on_batch(&batch(2));
            assert_eq!(stats.cur_lr, 1e-3);
        }
        assert_eq!(policy.cur_lr(), 1e-3);
    }

    #[test]
    fn test_scheduled_lr_anneals_per_step() {
        // anneal_steps = 1000 / (1 * 1 * 10) = 100
        let config = A2CConfig::new()
            .with_lr(1e-3)
            .with_end_lr(1e-4)
            .with_anneal_timesteps(1000)
            .with_num_workers(0)
            .with_num_envs_per_worker(1)
            .with_rollout_fragment_length(10);
        let mut policy = policy(config);

        // First step applies the un-annealed rate.
        let stats = policy.learn_on_batch(&batch(2));
        assert!((stats.cur_lr - 1e-3).abs() < 1e-12);

        // The next step applies factor(1) = 1 - 0.9 / 100.
        let expected = 1e-3 * (1.0 - 0.9 / 100.0);
        assert!((policy.cur_lr() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_postprocess_then_learn_roundtrip() {
        let config = A2CConfig::new().with_use_gae(false).with_use_critic(true);
        let mut policy = policy(config);

        let mut seg = TrajectorySegment::new(OBS);
        for i in 0..3 {
            let h = vec![0.01 * i as f32; HIDDEN];
            let c = vec![0.02 * i as f32; HIDDEN];
            seg.push(
                vec![0.1; 8 * 8 * 4],
                vec![0.2; 8 * 8 * 4],
                (i % N_ACTIONS) as u32,
                1.0,
                i == 2,
                0.5,
                h,
                c,
            );
        }

        policy.postprocess(&mut seg);
        assert!(seg.is_postprocessed());

        let stats = policy.learn_on_batch(&seg.to_train_batch());
        assert!(stats.policy_loss.is_finite());
    }

    #[test]
    fn test_curiosity_output_shapes() {
        let policy = policy(A2CConfig::new());
        let device = Default::default();

        let obs: Tensor<B, 4> =
            Tensor::<B, 1>::from_floats(vec![0.1; 2 * 8 * 8 * 4].as_slice(), &device)
                .reshape([2, 8, 8, 4]);
        let next_obs: Tensor<B, 4> =
            Tensor::<B, 1>::from_floats(vec![0.2; 2 * 8 * 8 * 4].as_slice(), &device)
                .reshape([2, 8, 8, 4]);

        let out = policy.curiosity(obs, next_obs, &[0, 2]);
        assert_eq!(out.intrinsic_reward.len(), 2);
        assert!(out.forward_loss.into_data().as_slice::<f32>().unwrap()[0] >= 0.0);
        assert!(out.inverse_loss.into_data().as_slice::<f32>().unwrap()[0] >= 0.0);
    }

    #[test]
    #[should_panic(expected = "invalid A2C configuration")]
    fn test_invalid_config_rejected_at_construction() {
        let _ = policy(A2CConfig::new().with_gamma(2.0));
    }
}
