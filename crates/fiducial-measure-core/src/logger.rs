//! Stderr logging for the measurement tools.
//!
//! Records look like `[  0.412s  INFO segmenter] segmented 3 contours`: time
//! since installation, level, last path segment of the target, message.
//! Everything goes to stderr so reports on stdout stay machine-readable.

use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

fn format_line(elapsed: Duration, record: &Record) -> String {
    let target = record.target();
    let module = target.rsplit("::").next().unwrap_or(target);
    let mut line = String::with_capacity(64);
    let _ = write!(
        line,
        "[{:8.3}s {:>5} {}] {}",
        elapsed.as_secs_f64(),
        record.level(),
        module,
        record.args()
    );
    line
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let line = format_line(self.started.elapsed(), record);
            let _ = writeln!(std::io::stderr().lock(), "{line}");
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger at `level`.
///
/// Only the first call takes effect; later calls return `Ok` and keep the
/// original level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}

/// Install a stderr `tracing` subscriber filtered by `RUST_LOG` (default
/// `info`), as plain text with uptime or as flattened JSON events. Span
/// closes are logged so per-frame timings show up.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);
    let installed = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.with_timer(fmt::time::Uptime::default()).try_init()
    };
    if let Err(e) = installed {
        eprintln!("tracing subscriber not installed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_carries_level_and_short_target() {
        let line = format_line(
            Duration::from_millis(1500),
            &Record::builder()
                .args(format_args!("segmented {} contours", 3))
                .level(log::Level::Info)
                .target("fiducial_measure_segment::segmenter")
                .build(),
        );
        assert_eq!(line, "[   1.500s  INFO segmenter] segmented 3 contours");
    }

    #[test]
    fn init_is_idempotent() {
        init_with_level(LevelFilter::Warn).unwrap();
        init_with_level(LevelFilter::Debug).unwrap();
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }
}
