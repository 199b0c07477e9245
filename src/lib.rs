//! # tuned-a2c: batch-normalized recurrent A2C with curiosity
//!
//! A correction/extension layer for actor-critic training, built on Burn.
//! It is deliberately not a full RL framework: rollout collection,
//! distributed workers, and environments are external collaborators. What
//! lives here are the algorithmic details that are easy to get subtly
//! wrong:
//!
//! - **Loss normalization.** The actor-critic loss averages masked sums
//!   over the *batch size* (sequence count for recurrent policies), not
//!   over valid elements, so the loss scale is invariant to batch
//!   composition. Padded timesteps are masked out of every component.
//! - **Bootstrap correctness.** Truncated trajectories bootstrap the value
//!   function from the final next-observation under the *recorded* final
//!   recurrent state, not a fresh zero state. Terminal trajectories
//!   bootstrap from exactly zero.
//! - **Learning-rate annealing.** RMSprop with a multiplicative linear
//!   decay factor derived from the effective train batch size; equal start
//!   and end rates bypass the schedule entirely.
//! - **Curiosity.** A conv-LSTM perception model paired with an intrinsic
//!   curiosity network (forward/inverse dynamics) whose prediction error
//!   provides an exploration bonus.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use burn::backend::{Autodiff, NdArray};
//! use tuned_a2c::{
//!     build_rmsprop, A2CConfig, IcmConfig, PerceptionConfig, PerceptionNet, TunedPolicy,
//! };
//!
//! type B = Autodiff<NdArray<f32>>;
//!
//! let config = A2CConfig::new().with_lr(1e-3).with_end_lr(1e-4);
//! let device = Default::default();
//! let model = PerceptionConfig::new((42, 42, 4), n_actions).init::<B>(&device);
//! let icm = IcmConfig::new((42, 42, 4), n_actions).init::<B>(&device);
//! let optimizer = build_rmsprop::<B, PerceptionNet<B>>(&config);
//! let mut policy = TunedPolicy::new(config, model, icm, optimizer);
//!
//! // Per collected segment:
//! policy.postprocess(&mut segment);
//! let stats = policy.learn_on_batch(&segment.to_train_batch());
//! ```

pub mod algorithms;
pub mod config;
pub mod core;
pub mod metrics;
pub mod model;
pub mod optim;
pub mod policy;

// Configuration
pub use config::{A2CConfig, ConfigError};

// Core data types
pub use crate::core::recurrent::HiddenState;
pub use crate::core::segment::{sequence_mask, TrainBatch, TrajectorySegment};

// Models
pub use model::encoder::{ConvEncoder, ConvEncoderConfig};
pub use model::icm::{IcmConfig, IcmNet};
pub use model::perception::{PerceptionConfig, PerceptionModel, PerceptionNet};

// Algorithm components
pub use algorithms::advantages::{compute_discounted_returns, compute_gae};
pub use algorithms::distribution::Categorical;
pub use algorithms::loss::{actor_critic_loss, LossComponents, LossOutput, ModelOutputs};
pub use algorithms::postprocess::add_advantages;

// Optimizer and scheduling
pub use optim::rmsprop::{build_rmsprop, lr_schedule_for};
pub use optim::schedule::{ConstantLr, LinearAnneal, LrSchedule};

// Stats and logging
pub use metrics::logger::{ConsoleLogger, CsvLogger, MetricsLogger};
pub use metrics::stats::{loss_stats, LossStats};

// Policy composition
pub use policy::{CuriosityOutput, LossFn, PostprocessFn, StatsFn, TunedPolicy};
