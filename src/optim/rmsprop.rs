//! RMSprop construction and schedule selection.
//!
//! RMSprop is used rather than Adam for consistency in non-stationary
//! objectives. The optimizer itself is rate-agnostic: the owning policy
//! passes the current learning rate into every `Optimizer::step`, taking it
//! from the annealing schedule when one is configured.

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{Optimizer, RmsPropConfig};
use burn::tensor::backend::AutodiffBackend;

use crate::config::A2CConfig;

use super::schedule::LinearAnneal;

/// Build the RMSprop optimizer for a model from the config.
///
/// Applies the configured epsilon and optional global gradient-norm
/// clipping; momentum is disabled to match plain RMSprop.
pub fn build_rmsprop<B, M>(config: &A2CConfig) -> impl Optimizer<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut rmsprop = RmsPropConfig::new()
        .with_epsilon(config.epsilon as f32)
        .with_momentum(0.0);

    if let Some(clip) = config.grad_clip {
        rmsprop = rmsprop.with_grad_clipping(Some(GradientClippingConfig::Norm(clip)));
    }

    rmsprop.init()
}

/// Select the annealing schedule for the config.
///
/// When `lr == end_lr` there is no annealing span to divide by, so no
/// schedule object is constructed at all and the fixed-rate path is used.
pub fn lr_schedule_for(config: &A2CConfig) -> Option<LinearAnneal> {
    if config.lr == config.end_lr {
        None
    } else {
        Some(LinearAnneal::from_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::schedule::LrSchedule;

    #[test]
    fn test_equal_rates_bypass_schedule() {
        let config = A2CConfig::new().with_lr(1e-3).with_end_lr(1e-3);
        assert!(lr_schedule_for(&config).is_none());
    }

    #[test]
    fn test_distinct_rates_build_schedule() {
        let config = A2CConfig::new()
            .with_lr(1e-3)
            .with_end_lr(1e-4)
            .with_anneal_timesteps(1000)
            .with_num_workers(0)
            .with_num_envs_per_worker(1)
            .with_rollout_fragment_length(10);

        let sched = lr_schedule_for(&config).expect("schedule expected");
        assert!((sched.factor(50) - 0.55).abs() < 1e-12);
    }
}
