//! Trajectory post-processing: bootstrap value selection and advantage
//! attachment.
//!
//! The one subtlety this module exists for: when a trajectory segment is
//! truncated rather than terminal, the return tail must be estimated by the
//! value function evaluated under the model's recurrent state *as it was at
//! the end of the segment*. The segment records the state produced at each
//! timestep, so the bootstrap replays the exact final state; evaluating with
//! a zero state would bootstrap from a history the model never saw.
//!
//! Terminal segments bootstrap from zero, regardless of what the value
//! function would predict.

use burn::tensor::backend::Backend;

use crate::config::A2CConfig;
use crate::core::recurrent::HiddenState;
use crate::core::segment::TrajectorySegment;
use crate::model::perception::PerceptionModel;

use super::advantages::{compute_discounted_returns, compute_gae};

/// Compute and attach per-timestep advantages and value targets.
///
/// The bootstrap evaluation is read-only: model parameters and the
/// per-batch caches are untouched, and the segment only gains the two new
/// columns.
pub fn add_advantages<B: Backend>(
    model: &PerceptionModel<B>,
    segment: &mut TrajectorySegment,
    config: &A2CConfig,
) {
    assert!(!segment.is_empty(), "cannot post-process an empty segment");

    let last_r = if segment.last_done() {
        0.0
    } else {
        // Truncated: estimate the remaining return from the terminal
        // observation under the recorded final recurrent state.
        let state_vec = segment.last_state_vec();
        let state =
            HiddenState::from_vec(&state_vec, 1, model.hidden_size(), model.device());
        model.bootstrap_value(segment.last_next_obs(), &state)
    };

    if config.use_gae {
        debug_assert!(
            config.use_critic,
            "GAE requires the value-function baseline (use_critic)"
        );
        let (advantages, returns) = compute_gae(
            segment.rewards(),
            segment.values(),
            segment.dones(),
            last_r,
            config.gamma,
            config.gae_lambda,
        );
        segment.attach(advantages, returns);
    } else {
        let returns = compute_discounted_returns(segment.rewards(), last_r, config.gamma);
        if config.use_critic {
            let advantages: Vec<f32> = returns
                .iter()
                .zip(segment.values())
                .map(|(ret, v)| ret - v)
                .collect();
            segment.attach(advantages, returns);
        } else {
            let n = returns.len();
            segment.attach(returns, vec![0.0; n]);
        }
    }
}
