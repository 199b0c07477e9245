//! Advantage primitives: GAE and discounted reward-to-go.
//!
//! Both functions are pure reverse scans over one trajectory segment. The
//! bootstrap value for the unobserved tail is supplied by the caller (the
//! post-processor), which is where the terminal-vs-truncated distinction
//! lives.
//!
//! GAE reference: Schulman et al., "High-Dimensional Continuous Control
//! Using Generalized Advantage Estimation" (2016).

/// Compute GAE advantages and returns for a single trajectory.
///
/// # Arguments
///
/// * `rewards` - rewards received `[T]`
/// * `values` - value estimates V(s) `[T]`
/// * `dones` - episode termination flags `[T]`
/// * `last_value` - V(s_T) for bootstrap (0 if terminal)
/// * `gamma` - discount factor
/// * `gae_lambda` - GAE lambda parameter
///
/// # Returns
///
/// `(advantages, returns)` - both `[T]`, with `returns = advantages + values`.
pub fn compute_gae(
    rewards: &[f32],
    values: &[f32],
    dones: &[bool],
    last_value: f32,
    gamma: f32,
    gae_lambda: f32,
) -> (Vec<f32>, Vec<f32>) {
    let n = rewards.len();
    assert_eq!(values.len(), n);
    assert_eq!(dones.len(), n);

    let mut advantages = vec![0.0f32; n];
    let mut returns = vec![0.0f32; n];

    let mut gae = 0.0f32;
    let mut next_value = last_value;

    for t in (0..n).rev() {
        let not_done = if dones[t] { 0.0 } else { 1.0 };

        // TD residual: delta_t = r_t + gamma * V(s_{t+1}) - V(s_t)
        let delta = rewards[t] + gamma * next_value * not_done - values[t];

        // A_t = delta_t + gamma * lambda * A_{t+1}
        gae = delta + gamma * gae_lambda * not_done * gae;

        advantages[t] = gae;
        returns[t] = gae + values[t];

        next_value = values[t];
    }

    (advantages, returns)
}

/// Discounted reward-to-go with a bootstrap tail.
///
/// `returns[t] = r_t + gamma * returns[t+1]`, seeded with `last_value`
/// past the end of the segment.
pub fn compute_discounted_returns(rewards: &[f32], last_value: f32, gamma: f32) -> Vec<f32> {
    let n = rewards.len();
    let mut returns = vec![0.0f32; n];

    let mut running = last_value;
    for t in (0..n).rev() {
        running = rewards[t] + gamma * running;
        returns[t] = running;
    }

    returns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gae_simple() {
        let rewards = vec![1.0, 1.0, 1.0];
        let values = vec![0.5, 0.5, 0.5];
        let dones = vec![false, false, false];

        let (advantages, returns) = compute_gae(&rewards, &values, &dones, 0.5, 0.99, 0.95);

        assert_eq!(advantages.len(), 3);
        for a in &advantages {
            assert!(*a > 0.0, "expected positive advantages, got {}", a);
        }
        // returns = advantages + values
        for i in 0..3 {
            assert!((returns[i] - (advantages[i] + values[i])).abs() < 1e-6);
        }
    }

    #[test]
    fn test_gae_terminal_blocks_bootstrap() {
        let rewards = vec![1.0, 1.0, 0.0];
        let values = vec![0.5, 0.5, 0.0];
        let dones = vec![false, false, true];

        // Even with a huge last_value the terminal flag zeroes the tail.
        let (advantages, _) = compute_gae(&rewards, &values, &dones, 1e6, 0.99, 0.95);
        assert!(advantages[2].abs() < 1e-6);
    }

    #[test]
    fn test_gae_lambda_zero_is_one_step_td() {
        let rewards = vec![1.0, 1.0, 1.0];
        let values = vec![0.0, 0.0, 0.0];
        let dones = vec![false, false, false];

        let (adv, _) = compute_gae(&rewards, &values, &dones, 0.0, 0.99, 0.0);
        // With zero values, A_t reduces to r_t
        assert!((adv[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_discounted_returns() {
        let rewards = vec![1.0, 1.0, 1.0];
        let returns = compute_discounted_returns(&rewards, 0.0, 0.5);

        // Back to front: 1, 1 + 0.5, 1 + 0.5 * 1.5
        assert!((returns[2] - 1.0).abs() < 1e-6);
        assert!((returns[1] - 1.5).abs() < 1e-6);
        assert!((returns[0] - 1.75).abs() < 1e-6);
    }

    #[test]
    fn test_discounted_returns_bootstrap_tail() {
        let rewards = vec![0.0, 0.0];
        let returns = compute_discounted_returns(&rewards, 8.0, 0.5);

        assert!((returns[1] - 4.0).abs() < 1e-6);
        assert!((returns[0] - 2.0).abs() < 1e-6);
    }
}
