//! Configuration for tuned A2C training.
//!
//! Holds the hyperparameters consumed by the loss, the advantage
//! post-processor, and the optimizer/schedule construction. The config is
//! read-only once training starts; the worker/env counts and the rollout
//! fragment length are only used to derive the effective train batch size
//! for learning-rate annealing.

use std::fmt;

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A count parameter must be positive.
    InvalidCount {
        field: &'static str,
        value: usize,
    },
    /// A parameter is outside its valid range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// A rate parameter is NaN, infinite, or non-positive.
    InvalidRate {
        field: &'static str,
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount { field, value } => {
                write!(f, "{} must be > 0, got {}", field, value)
            }
            ConfigError::OutOfRange { field, value, min, max } => {
                write!(f, "{} must be in [{}, {}], got {}", field, min, max, value)
            }
            ConfigError::InvalidRate { field, value } => {
                write!(f, "{} must be finite and > 0, got {}", field, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Hyperparameters for tuned A2C.
///
/// Defaults match the tuned training setup: no GAE, linear learning-rate
/// annealing from `lr` to `end_lr` over `anneal_timesteps` environment
/// steps, and RMSprop with a small epsilon.
#[derive(Debug, Clone)]
pub struct A2CConfig {
    /// Use Generalized Advantage Estimation instead of plain discounted
    /// returns minus baseline.
    pub use_gae: bool,
    /// Discount factor.
    pub gamma: f32,
    /// GAE lambda parameter (only used when `use_gae` is true).
    pub gae_lambda: f32,
    /// Subtract the value-function baseline when computing advantages in
    /// the non-GAE path.
    pub use_critic: bool,

    /// Initial learning rate.
    pub lr: f64,
    /// Final learning rate after annealing. When equal to `lr` the
    /// fixed-rate optimizer path is used and no schedule is constructed.
    pub end_lr: f64,
    /// Environment timesteps over which the learning rate anneals.
    pub anneal_timesteps: usize,
    /// RMSprop epsilon.
    pub epsilon: f64,
    /// Global gradient-norm clip (None = no clipping).
    pub grad_clip: Option<f32>,

    /// Value-function loss coefficient.
    pub vf_loss_coeff: f32,
    /// Entropy bonus coefficient.
    pub entropy_coeff: f32,

    /// Number of rollout workers. Zero means local-mode collection and is
    /// treated as one worker when deriving the train batch size.
    pub num_workers: usize,
    /// Vectorized environments per worker.
    pub num_envs_per_worker: usize,
    /// Timesteps per collected trajectory fragment.
    pub rollout_fragment_length: usize,
}

impl Default for A2CConfig {
    fn default() -> Self {
        Self {
            use_gae: false,
            gamma: 0.99,
            gae_lambda: 1.0,
            use_critic: true,

            lr: 1e-3,
            end_lr: 1e-4,
            anneal_timesteps: 10_000_000,
            epsilon: 1e-8,
            grad_clip: Some(0.5),

            vf_loss_coeff: 0.5,
            entropy_coeff: 0.01,

            num_workers: 2,
            num_envs_per_worker: 1,
            rollout_fragment_length: 10,
        }
    }
}

impl A2CConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective train batch size: transitions delivered per optimizer step.
    ///
    /// A worker count of zero (local mode) still collects with one worker,
    /// so it is treated as one here to avoid a zero-size batch denominator
    /// in the annealing schedule.
    pub fn train_batch_size(&self) -> usize {
        self.num_workers.max(1) * self.num_envs_per_worker * self.rollout_fragment_length
    }

    /// Optimizer steps over which the learning rate anneals.
    pub fn anneal_steps(&self) -> f64 {
        self.anneal_timesteps as f64 / self.train_batch_size() as f64
    }

    /// Validate all configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_envs_per_worker == 0 {
            return Err(ConfigError::InvalidCount {
                field: "num_envs_per_worker",
                value: 0,
            });
        }
        if self.rollout_fragment_length == 0 {
            return Err(ConfigError::InvalidCount {
                field: "rollout_fragment_length",
                value: 0,
            });
        }
        if self.anneal_timesteps == 0 {
            return Err(ConfigError::InvalidCount {
                field: "anneal_timesteps",
                value: 0,
            });
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::OutOfRange {
                field: "gamma",
                value: self.gamma as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        if !(0.0..=1.0).contains(&self.gae_lambda) {
            return Err(ConfigError::OutOfRange {
                field: "gae_lambda",
                value: self.gae_lambda as f64,
                min: 0.0,
                max: 1.0,
            });
        }

        for (field, value) in [("lr", self.lr), ("end_lr", self.end_lr), ("epsilon", self.epsilon)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidRate { field, value });
            }
        }

        Ok(())
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    // Builder methods

    /// Enable or disable GAE.
    pub fn with_use_gae(mut self, use_gae: bool) -> Self {
        self.use_gae = use_gae;
        self
    }

    /// Set the discount factor.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the GAE lambda parameter.
    pub fn with_gae_lambda(mut self, lambda: f32) -> Self {
        self.gae_lambda = lambda;
        self
    }

    /// Enable or disable the value-function baseline in the non-GAE path.
    pub fn with_use_critic(mut self, use_critic: bool) -> Self {
        self.use_critic = use_critic;
        self
    }

    /// Set the initial learning rate.
    pub fn with_lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Set the final learning rate after annealing.
    pub fn with_end_lr(mut self, end_lr: f64) -> Self {
        self.end_lr = end_lr;
        self
    }

    /// Set the annealing horizon in environment timesteps.
    pub fn with_anneal_timesteps(mut self, timesteps: usize) -> Self {
        self.anneal_timesteps = timesteps;
        self
    }

    /// Set the RMSprop epsilon.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the gradient-norm clip (None = no clipping).
    pub fn with_grad_clip(mut self, clip: Option<f32>) -> Self {
        self.grad_clip = clip;
        self
    }

    /// Set the value-function loss coefficient.
    pub fn with_vf_loss_coeff(mut self, coeff: f32) -> Self {
        self.vf_loss_coeff = coeff;
        self
    }

    /// Set the entropy bonus coefficient.
    pub fn with_entropy_coeff(mut self, coeff: f32) -> Self {
        self.entropy_coeff = coeff;
        self
    }

    /// Set the rollout worker count (0 = local mode).
    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    /// Set environments per worker.
    pub fn with_num_envs_per_worker(mut self, envs: usize) -> Self {
        self.num_envs_per_worker = envs;
        self
    }

    /// Set the rollout fragment length.
    pub fn with_rollout_fragment_length(mut self, length: usize) -> Self {
        self.rollout_fragment_length = length;
        self
    }
}
