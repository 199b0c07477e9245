//! Neural network models.
//!
//! - `encoder`: small stride-2 convolutional image encoder
//! - `perception`: conv-LSTM actor-critic model with per-batch value cache
//! - `icm`: intrinsic curiosity network (forward/inverse dynamics)

pub mod encoder;
pub mod icm;
pub mod perception;

pub use encoder::{ConvEncoder, ConvEncoderConfig};
pub use icm::{IcmConfig, IcmNet};
pub use perception::{NetForward, PerceptionConfig, PerceptionModel, PerceptionNet};
