//! Optimizer construction and learning-rate scheduling.
//!
//! - `schedule`: multiplicative-factor linear annealing
//! - `rmsprop`: RMSprop construction and scheduled-vs-fixed selection

pub mod rmsprop;
pub mod schedule;

pub use rmsprop::{build_rmsprop, lr_schedule_for};
pub use schedule::{ConstantLr, LinearAnneal, LrSchedule};
