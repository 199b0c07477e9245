//! Algorithm components.
//!
//! - `distribution`: categorical action distribution over discrete actions
//! - `advantages`: GAE and discounted reward-to-go primitives
//! - `postprocess`: bootstrap value selection + advantage attachment
//! - `loss`: masked, batch-size-normalized actor-critic loss

pub mod advantages;
pub mod distribution;
pub mod loss;
pub mod postprocess;

pub use advantages::{compute_discounted_returns, compute_gae};
pub use distribution::Categorical;
pub use loss::{actor_critic_loss, LossComponents, LossOutput, ModelOutputs};
pub use postprocess::add_advantages;
