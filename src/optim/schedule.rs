//! Learning-rate schedules.
//!
//! [`LinearAnneal`] reproduces lambda-style multiplicative annealing: the
//! base rate is scaled by `factor(x) = 1 - (1 - end_lr/lr) * (x /
//! anneal_steps)`, where `anneal_steps` is the annealing horizon expressed
//! in optimizer steps (environment timesteps divided by the effective train
//! batch size).
//!
//! Past the horizon the factor holds at the `end_lr/lr` floor. An unclamped
//! factor would keep falling and eventually turn the learning rate
//! negative, silently inverting gradient descent into ascent.

use crate::config::A2CConfig;

/// Step-dependent learning-rate schedule.
pub trait LrSchedule: Send + Sync {
    /// Multiplicative factor applied to the base rate at the given
    /// optimizer step.
    fn factor(&self, step: usize) -> f64;

    /// Learning rate at the given optimizer step.
    fn lr_at(&self, step: usize) -> f64;
}

/// Fixed learning rate (no scheduling).
#[derive(Debug, Clone)]
pub struct ConstantLr {
    lr: f64,
}

impl ConstantLr {
    /// Create a constant schedule.
    pub fn new(lr: f64) -> Self {
        debug_assert!(lr.is_finite() && lr > 0.0, "lr must be finite and > 0, got {}", lr);
        Self { lr }
    }
}

impl LrSchedule for ConstantLr {
    fn factor(&self, _step: usize) -> f64 {
        1.0
    }

    fn lr_at(&self, _step: usize) -> f64 {
        self.lr
    }
}

/// Linear annealing from `lr` to `end_lr` over `anneal_steps` optimizer
/// steps.
#[derive(Debug, Clone)]
pub struct LinearAnneal {
    lr: f64,
    end_lr: f64,
    anneal_steps: f64,
}

impl LinearAnneal {
    /// Create a schedule annealing from `lr` to `end_lr` over
    /// `anneal_steps` optimizer steps.
    ///
    /// # Panics (debug only)
    ///
    /// Panics if the rates are non-finite or non-positive, equal to each
    /// other (the fixed-rate path must be used instead), or if
    /// `anneal_steps` is not positive.
    pub fn new(lr: f64, end_lr: f64, anneal_steps: f64) -> Self {
        debug_assert!(lr.is_finite() && lr > 0.0, "lr must be finite and > 0, got {}", lr);
        debug_assert!(
            end_lr.is_finite() && end_lr > 0.0,
            "end_lr must be finite and > 0, got {}",
            end_lr
        );
        debug_assert!(
            lr != end_lr,
            "lr == end_lr has no annealing span; use the fixed-rate path"
        );
        debug_assert!(
            anneal_steps.is_finite() && anneal_steps > 0.0,
            "anneal_steps must be finite and > 0, got {}",
            anneal_steps
        );

        Self {
            lr,
            end_lr,
            anneal_steps,
        }
    }

    /// Build the schedule from a config, deriving the step horizon from
    /// the annealing timesteps and the effective train batch size.
    pub fn from_config(config: &A2CConfig) -> Self {
        Self::new(config.lr, config.end_lr, config.anneal_steps())
    }

    /// The annealing horizon in optimizer steps.
    pub fn anneal_steps(&self) -> f64 {
        self.anneal_steps
    }
}

impl LrSchedule for LinearAnneal {
    fn factor(&self, step: usize) -> f64 {
        let floor = self.end_lr / self.lr;
        let x = step as f64;
        if x >= self.anneal_steps {
            return floor;
        }
        1.0 - (1.0 - floor) * (x / self.anneal_steps)
    }

    fn lr_at(&self, step: usize) -> f64 {
        self.lr * self.factor(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_endpoints_exact() {
        let sched = LinearAnneal::new(1e-3, 1e-4, 100.0);

        assert_eq!(sched.factor(0), 1.0);
        assert_eq!(sched.factor(100), 0.1);
    }

    #[test]
    fn test_factor_midpoint() {
        // 1 - (1 - 0.1) * 0.5 = 0.55
        let sched = LinearAnneal::new(1e-3, 1e-4, 100.0);
        assert!((sched.factor(50) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_factor_holds_floor_past_horizon() {
        let sched = LinearAnneal::new(1e-3, 1e-4, 100.0);

        assert_eq!(sched.factor(100), 0.1);
        assert_eq!(sched.factor(1000), 0.1);
        assert!((sched.lr_at(1000) - 1e-4).abs() < 1e-18);
    }

    #[test]
    fn test_lr_at() {
        let sched = LinearAnneal::new(1e-3, 1e-4, 100.0);

        assert!((sched.lr_at(0) - 1e-3).abs() < 1e-18);
        assert!((sched.lr_at(100) - 1e-4).abs() < 1e-18);
        assert!((sched.lr_at(50) - 0.55e-3).abs() < 1e-12);
    }

    #[test]
    fn test_from_config_scenario() {
        // anneal_timesteps=1000, 0 workers (treated as 1), 1 env, fragment
        // length 10 -> anneal_steps = 100; factor(50) = 0.55.
        let config = A2CConfig::new()
            .with_lr(1e-3)
            .with_end_lr(1e-4)
            .with_anneal_timesteps(1000)
            .with_num_workers(0)
            .with_num_envs_per_worker(1)
            .with_rollout_fragment_length(10);

        let sched = LinearAnneal::from_config(&config);
        assert!((sched.anneal_steps() - 100.0).abs() < 1e-12);
        assert!((sched.factor(50) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_constant_lr() {
        let sched = ConstantLr::new(1e-3);

        assert_eq!(sched.factor(0), 1.0);
        assert_eq!(sched.factor(10_000), 1.0);
        assert_eq!(sched.lr_at(0), 1e-3);
        assert_eq!(sched.lr_at(10_000), 1e-3);
    }
}
