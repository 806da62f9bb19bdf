//! Tracing setup for the `estimator` binary.
//!
//! Records go to stderr and, once [`enable_file_logging`] has been called,
//! to an append-only log file as well. A single reloadable filter sits in
//! front of both.

use std::{
    fmt::Display,
    fs::File,
    io::{self, IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use anyhow::{Context, Result, bail};
use chrono::Local;
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

/// Millisecond local time with offset, e.g. `2024-06-03T09:15:02.117+02:00`.
const TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

static LEVEL: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();
static LOG_FILE: OnceLock<LogFile> = OnceLock::new();

/// One line per event: `<time> <LEVEL> <file:line> <fields>`.
struct EstimatorFormat;

impl<S, N> FormatEvent<S, N> for EstimatorFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        paint(&mut writer, DIM, Local::now().format(TIMESTAMP))?;
        write!(writer, " ")?;
        paint(&mut writer, level_style(meta.level()), format!("{:>5}", meta.level()))?;
        write!(writer, " ")?;
        if let Some(location) = source_location(meta) {
            paint(&mut writer, CYAN, location)?;
            write!(writer, " ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Writes `text`, wrapped in `style` when the writer takes colour.
fn paint(
    writer: &mut Writer<'_>,
    style: &str,
    text: impl Display,
) -> std::fmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "{style}{text}{RESET}")
    } else {
        write!(writer, "{text}")
    }
}

fn level_style(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "\x1b[1;31m",
        Level::WARN => "\x1b[1;33m",
        Level::INFO => "\x1b[1;32m",
        Level::DEBUG => "\x1b[1;34m",
        Level::TRACE => "\x1b[1;35m",
    }
}

/// `file:line` relative to the crate's `src/`, when both are known.
fn source_location(meta: &Metadata<'_>) -> Option<String> {
    let file = meta.file()?;
    let line = meta.line()?;
    let file = file
        .strip_prefix("src/")
        .or_else(|| file.strip_prefix("src\\"))
        .unwrap_or(file);
    Some(format!("{file}:{line}"))
}

/// Log file that can be opened after the subscriber is installed. Records
/// written while it is closed are dropped.
#[derive(Clone, Default)]
struct LogFile(Arc<Mutex<Option<File>>>);

impl LogFile {
    // The handle stays usable even if a writer panicked while holding it.
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(
        &self,
        file: File,
    ) {
        *self.lock() = Some(file);
    }
}

struct LogFileWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileWriter(self.lock())
    }
}

/// `RUST_LOG` wins over the configured level; an unusable level falls back
/// to `info`.
fn initial_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. Later calls are no-ops.
///
/// Stderr output is coloured only on a terminal, which keeps stdout free for
/// command output.
pub fn init_logging(default_level: &str) {
    let log_file = LOG_FILE.get_or_init(LogFile::default).clone();
    let (level_filter, level_handle) = reload::Layer::new(initial_filter(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(EstimatorFormat)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(EstimatorFormat)
        .with_ansi(false)
        .with_writer(log_file);

    if tracing_subscriber::registry()
        .with(level_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        let _ = LEVEL.set(level_handle);
    }
}

/// Replaces the active filter. Accepts a bare level (`debug`) or any
/// `EnvFilter` directive (`estimate_core=trace,info`).
pub fn set_log_level(level: &str) -> Result<()> {
    let Some(handle) = LEVEL.get() else {
        bail!("logging not yet initialized");
    };
    let filter = EnvFilter::try_new(level)
        .with_context(|| format!("invalid log level '{level}'"))?;
    handle.reload(filter).context("filter reload failed")
}

/// Starts appending records to `path`, replacing any file already open. The
/// directory must already exist.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))?;

    let Some(log_file) = LOG_FILE.get() else {
        bail!("logging not yet initialized");
    };
    log_file.open(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One test owns the global subscriber; a second would race its init.
    #[test]
    fn runtime_controls_after_init() {
        init_logging("info");

        assert!(set_log_level("debug").is_ok());
        assert!(set_log_level("estimate_core=verbose").is_err());
        assert!(enable_file_logging(Path::new("no/such/dir/estimator.log")).is_err());
    }

    #[test]
    fn closed_log_file_swallows_writes() {
        let log_file = LogFile::default();
        let mut writer = log_file.make_writer();

        assert_eq!(writer.write(b"dropped").unwrap(), 7);
        assert!(writer.flush().is_ok());
    }

    #[test]
    fn paint_is_plain_without_ansi() {
        let mut out = String::new();
        {
            let mut writer = Writer::new(&mut out);
            paint(&mut writer, CYAN, "form.rs:12").unwrap();
        }

        assert_eq!(out, "form.rs:12");
    }
}
