//! Console logger for diagnostics.
//!
//! Implements the [`log`] facade. Each line carries the level, the time since
//! the logger was initialized and the target module:
//!
//! ```text
//! INFO [1s 204ms] pid_tuning_logger::threaded_impl::coordinator - motion finished: Settled
//! ERROR [1s 388ms] pid_tuning_logger::threaded_impl::sampling_thread - Input validation error: Measured value is NaN
//! ```
//!
//! Sample rows never go through here; they are written to a
//! [`LogSink`](crate::ipc::LogSink).

use std::io::Write;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use humantime::{format_duration, FormattedDuration};
use log::{LevelFilter, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger {
    start: Instant,
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let stderr = std::io::stderr();
            let mut out = stderr.lock();
            let _ = writeln!(
                out,
                "{} [{}] {} - {}",
                record.level(),
                uptime(self.start),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<ConsoleLogger> = OnceLock::new();

/// Installs the console logger as the global logger.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| ConsoleLogger { start: Instant::now() });
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

/// Uptime truncated to whole milliseconds.
fn uptime(start: Instant) -> FormattedDuration {
    let millis = start.elapsed().as_millis() as u64;
    format_duration(Duration::from_millis(millis))
}
