//! Core data types shared across the crate.
//!
//! - `recurrent`: hidden/cell state pair for the LSTM perception core
//! - `segment`: trajectory segments and padded training batches

pub mod recurrent;
pub mod segment;

pub use recurrent::HiddenState;
pub use segment::{sequence_mask, TrainBatch, TrajectorySegment};
