//! Training statistics and logging.
//!
//! - `stats`: scalar diagnostics for one training step
//! - `logger`: console and CSV logging backends

pub mod logger;
pub mod stats;

pub use logger::{ConsoleLogger, CsvLogger, MetricsLogger};
pub use stats::{loss_stats, LossStats};
