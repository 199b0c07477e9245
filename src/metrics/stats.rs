//! Training statistics.
//!
//! Stats are built directly from the [`LossComponents`] returned by the
//! loss computation, together with the learning rate actually applied at
//! that step. Because the components travel with the loss result instead of
//! being stashed on the policy, the stats always describe the same batch as
//! the most recent loss computation.

use crate::algorithms::loss::LossComponents;

/// Scalar diagnostics for one training step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossStats {
    /// Entropy term of the loss (negative mean entropy).
    pub policy_entropy: f32,
    /// Policy gradient loss.
    pub policy_loss: f32,
    /// Value function loss.
    pub vf_loss: f32,
    /// Learning rate applied at this step, post-schedule.
    pub cur_lr: f64,
}

/// Build stats from loss components and the applied learning rate.
pub fn loss_stats(components: &LossComponents, cur_lr: f64) -> LossStats {
    LossStats {
        policy_entropy: components.entropy,
        policy_loss: components.policy_loss,
        vf_loss: components.value_loss,
        cur_lr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_mirror_components() {
        let components = LossComponents {
            policy_loss: 0.5,
            value_loss: 1.25,
            entropy: -0.7,
        };
        let stats = loss_stats(&components, 5.5e-4);

        assert_eq!(stats.policy_loss, 0.5);
        assert_eq!(stats.vf_loss, 1.25);
        assert_eq!(stats.policy_entropy, -0.7);
        assert_eq!(stats.cur_lr, 5.5e-4);
    }
}
