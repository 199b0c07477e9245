//! Logging backends for training statistics.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::stats::LossStats;

/// Sink for per-step training statistics.
pub trait MetricsLogger: Send {
    /// Record the stats of one optimizer step.
    fn log(&mut self, step: usize, stats: &LossStats);
}

/// Logs through the `log` crate at info level.
#[derive(Debug, Default)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    /// Create a console logger.
    pub fn new() -> Self {
        Self
    }
}

impl MetricsLogger for ConsoleLogger {
    fn log(&mut self, step: usize, stats: &LossStats) {
        log::info!(
            "step {} | policy_loss {:.6} | vf_loss {:.6} | entropy {:.6} | lr {:.3e}",
            step,
            stats.policy_loss,
            stats.vf_loss,
            stats.policy_entropy,
            stats.cur_lr
        );
    }
}

/// Appends one CSV row per step.
pub struct CsvLogger {
    writer: BufWriter<File>,
}

impl CsvLogger {
    /// Create a CSV logger writing to the given path, including a header.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "step,policy_loss,vf_loss,policy_entropy,cur_lr")?;
        Ok(Self { writer })
    }

    /// Flush buffered rows to disk.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl MetricsLogger for CsvLogger {
    fn log(&mut self, step: usize, stats: &LossStats) {
        // A failed write is reported, not fatal: losing a log row should
        // never abort training.
        if let Err(e) = writeln!(
            self.writer,
            "{},{},{},{},{}",
            step, stats.policy_loss, stats.vf_loss, stats.policy_entropy, stats.cur_lr
        ) {
            log::warn!("failed to write metrics row: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> LossStats {
        LossStats {
            policy_entropy: -0.5,
            policy_loss: 0.25,
            vf_loss: 1.0,
            cur_lr: 1e-3,
        }
    }

    #[test]
    fn test_console_logger_does_not_panic() {
        let mut logger = ConsoleLogger::new();
        logger.log(1, &stats());
    }

    #[test]
    fn test_csv_logger_writes_rows() {
        let path = std::env::temp_dir().join("tuned_a2c_metrics_test.csv");
        {
            let mut logger = CsvLogger::new(&path).unwrap();
            logger.log(0, &stats());
            logger.log(1, &stats());
            logger.flush().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("step,"));
        assert!(lines[1].starts_with("0,"));
        assert!(lines[2].starts_with("1,"));

        let _ = std::fs::remove_file(&path);
    }
}
