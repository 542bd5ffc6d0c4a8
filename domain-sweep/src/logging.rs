//! Daily log file setup.
//!
//! Every event is appended to `<stem>-YYYY-MM-DD<ext>` next to the configured
//! log path, so `./runtime.log` becomes `./runtime-2024-03-09.log`. The file is
//! reopened per event, which keeps the date current across midnight.

use chrono::{Local, NaiveDate};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "DS_LOG";

/// Insert `date` between the file stem and the extension of `base`.
pub fn dated_log_path(base: &Path, date: NaiveDate) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "runtime".to_string());
    let date = date.format("%Y-%m-%d");

    let file_name = match base.extension() {
        Some(ext) => format!("{}-{}.{}", stem, date, ext.to_string_lossy()),
        None => format!("{}-{}", stem, date),
    };
    base.with_file_name(file_name)
}

/// `MakeWriter` appending to today's log file.
#[derive(Debug, Clone)]
pub struct DailyLogFile {
    base: PathBuf,
}

impl DailyLogFile {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn current_path(&self) -> PathBuf {
        dated_log_path(&self.base, Local::now().date_naive())
    }
}

impl<'a> MakeWriter<'a> for DailyLogFile {
    type Writer = Box<dyn io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_path())
        {
            Ok(file) => Box::new(file),
            // Fall back to stderr rather than dropping the line.
            Err(_) => Box::new(io::stderr()),
        }
    }
}

/// Install the global subscriber writing to the daily log file.
pub fn init(log_file: &Path) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(DailyLogFile::new(log_file))
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| format!("Failed to initialise logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_dated_log_path_with_extension() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            dated_log_path(Path::new("./runtime.log"), date),
            PathBuf::from("./runtime-2024-03-09.log")
        );
    }

    #[test]
    fn test_dated_log_path_without_extension() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(
            dated_log_path(Path::new("/var/log/sweep"), date),
            PathBuf::from("/var/log/sweep-2024-12-31")
        );
    }

    #[test]
    fn test_writer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let logs = DailyLogFile::new(dir.path().join("runtime.log"));

        logs.make_writer().write_all(b"first\n").unwrap();
        logs.make_writer().write_all(b"second\n").unwrap();

        let text = std::fs::read_to_string(logs.current_path()).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }
}
