//! Engine logging
//!
//! Every crate of the workspace logs through this module: the renderer core,
//! the render and event threads, the Vulkan validation messenger and the demo.
//! Entries go to one global `Logger` (a colored console logger unless
//! replaced with `set_logger`). Entries below the global severity floor
//! (`set_min_severity`) are dropped before a `LogEntry` is even built.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Lowest severity that reaches the logger, stored as `LogSeverity as u8`
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(LogSeverity::Trace as u8);

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Destination of engine log entries
///
/// Called concurrently from the render thread, the event thread and the
/// owning thread, hence `Send + Sync`.
///
/// ```no_run
/// use ise_engine::ise::log::{set_logger, LogEntry, LogSeverity, Logger};
///
/// struct ErrorsOnly;
///
/// impl Logger for ErrorsOnly {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity == LogSeverity::Error {
///             eprintln!("{}: {}", entry.source, entry.message);
///         }
///     }
/// }
///
/// set_logger(ErrorsOnly);
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log message with its origin
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component, e.g. `"ise::Renderer"` or `"ise::vulkan"`
    pub source: String,
    pub message: String,
    /// Set by `engine_error!` and `engine_err!` only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogSeverity {
    /// Per-frame detail (acquire, submit, present)
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogSeverity {
    /// Fixed-width label used in console output
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Console logger
///
/// `[timestamp] [SEVERITY] [source] message`, with ` (file:line)` appended
/// when the entry carries a location. Warnings and errors go to stderr,
/// everything else to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// The console line without color codes
    pub fn format_plain(entry: &LogEntry) -> String {
        Self::compose(entry, entry.severity.label(), &entry.source)
    }

    fn compose(entry: &LogEntry, severity: impl std::fmt::Display, source: impl std::fmt::Display) -> String {
        let timestamp: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            timestamp.format(TIMESTAMP_FORMAT),
            severity,
            source,
            entry.message
        );
        if let (Some(file), Some(number)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, number));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = Self::compose(entry, entry.severity.colored_label(), entry.source.bright_blue());
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== GLOBAL LOGGER =====

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Route every subsequent entry to `logger`
pub fn set_logger<L: Logger + 'static>(logger: L) {
    if let Ok(mut current) = logger_lock().write() {
        *current = Box::new(logger);
    }
}

/// Back to `DefaultLogger`
pub fn reset_logger() {
    set_logger(DefaultLogger);
}

/// Drop entries below `severity` (default: keep everything)
pub fn set_min_severity(severity: LogSeverity) {
    MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
}

pub fn min_severity() -> LogSeverity {
    LogSeverity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
}

/// Whether an entry of `severity` would reach the logger
pub fn enabled(severity: LogSeverity) -> bool {
    severity >= min_severity()
}

fn dispatch(severity: LogSeverity, source: &str, message: String, location: Option<(&'static str, u32)>) {
    if !enabled(severity) {
        return;
    }
    // A poisoned lock means a logger panicked; logging must not panic in turn
    let Ok(logger) = logger_lock().read() else {
        return;
    };
    logger.log(&LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: location.map(|(file, _)| file),
        line: location.map(|(_, line)| line),
    });
}

/// Log without a source location (backs `engine_trace!` .. `engine_warn!`)
pub fn log(severity: LogSeverity, source: &str, message: String) {
    dispatch(severity, source, message, None);
}

/// Log with the caller's `file!()`/`line!()` (backs `engine_error!` and `engine_err!`)
pub fn log_detailed(severity: LogSeverity, source: &str, message: String, file: &'static str, line: u32) {
    dispatch(severity, source, message, Some((file, line)));
}

// ===== MACROS =====

/// Log at an explicit severity; the message is only formatted when enabled
///
/// ```no_run
/// # use ise_engine::engine_log;
/// # use ise_engine::ise::log::LogSeverity;
/// engine_log!(LogSeverity::Debug, "ise::Renderer", "Created {} frame slots", 3);
/// ```
#[macro_export]
macro_rules! engine_log {
    ($severity:expr, $source:expr, $($arg:tt)*) => {{
        let severity = $severity;
        if $crate::log::enabled(severity) {
            $crate::log::log(severity, $source, format!($($arg)*));
        }
    }};
}

/// Per-frame detail
///
/// ```no_run
/// # use ise_engine::engine_trace;
/// engine_trace!("ise::FrameScheduler", "Slot {} acquired image {}", 0, 2);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Trace, $source, $($arg)*)
    };
}

#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Debug, $source, $($arg)*)
    };
}

#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Info, $source, $($arg)*)
    };
}

/// ```no_run
/// # use ise_engine::engine_warn;
/// engine_warn!("ise::SwapchainManager", "Drawable extent is {}x{}, deferring", 0, 0);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_log!($crate::log::LogSeverity::Warn, $source, $($arg)*)
    };
}

/// Error with the caller's source location
///
/// ```no_run
/// # use ise_engine::engine_error;
/// engine_error!("ise::Renderer", "Render thread failed: {}", "device lost");
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
