use log::{Level, LevelFilter, Log, Metadata, Record};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

/// A logger that writes to stdout using println!
pub struct StdoutLogger;

/// A logger that keeps the most recent lines in a fixed-capacity ring.
///
/// This is the console-buffer model of a device without a writable
/// filesystem: the last N formatted lines stay resident in memory and can
/// be read back (e.g. relayed over the inter-core channel or a debug
/// endpoint) after the fact. Older lines are dropped as new ones arrive.
pub struct RingLogger {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    mirror_stdout: bool,
}

impl RingLogger {
    /// Create a RingLogger holding at most `capacity` lines.
    ///
    /// When `mirror_stdout` is set, every line is also printed as it is
    /// logged.
    pub fn new(capacity: usize, mirror_stdout: bool) -> Self {
        RingLogger {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            mirror_stdout,
        }
    }

    /// Snapshot the buffered lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.iter().cloned().collect()
    }

    /// Drop all buffered lines.
    pub fn clear(&self) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.clear();
    }
}

fn format_line(record: &Record) -> String {
    let uptime = format_uptime();
    let level = record.level();
    let thread = std::thread::current()
        .name()
        .unwrap_or("?")
        .to_string();
    let file = record.file().unwrap_or("unknown");
    let line = record.line().unwrap_or(0);

    format!(
        "[{uptime}] [{level}] [{thread}] {file}:{line} - {}",
        record.args()
    )
}

impl Log for StdoutLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        println!("{}", format_line(record));
    }

    fn flush(&self) {
        std::io::stdout().flush().ok();
    }
}

impl Log for RingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let line = format_line(record);
        if self.mirror_stdout {
            println!("{line}");
        }

        // Acquire mutex with poisoning recovery
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    fn flush(&self) {
        if self.mirror_stdout {
            std::io::stdout().flush().ok();
        }
    }
}

/// Format time since process start as SSSSS.mmm
///
/// The control layer has no battery-backed clock, so log lines carry
/// uptime rather than civil time.
pub fn format_uptime() -> String {
    static BOOT: OnceLock<Instant> = OnceLock::new();
    let boot = BOOT.get_or_init(Instant::now);
    let elapsed = boot.elapsed();
    format!("{:5}.{:03}", elapsed.as_secs(), elapsed.subsec_millis())
}

fn max_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initialize the global logger with StdoutLogger
///
/// Sets the max level based on build mode:
/// - Debug builds: LevelFilter::Debug (all levels active)
/// - Release builds: LevelFilter::Info (Debug suppressed)
///
/// This can only be called once per process. Subsequent calls are silently ignored.
pub fn init_stdout_logger() {
    static LOGGER: StdoutLogger = StdoutLogger;

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(max_level());
    }
}

/// Initialize the global logger with a RingLogger and return a handle to it.
///
/// The returned reference stays valid for the process lifetime and can be
/// used to read the buffered lines back. Returns `None` if a logger was
/// already installed.
pub fn init_ring_logger(capacity: usize, mirror_stdout: bool) -> Option<&'static RingLogger> {
    // Box::leak is required for the &'static reference that set_logger needs.
    // One-time init; the logger lives for the process.
    let logger: &'static RingLogger = Box::leak(Box::new(RingLogger::new(capacity, mirror_stdout)));

    if log::set_logger(logger).is_ok() {
        log::set_max_level(max_level());
        Some(logger)
    } else {
        None
    }
}

/// True if `level` is active under the current max level.
pub fn level_enabled(level: Level) -> bool {
    level <= log::max_level()
}

/// Log a fatal error and exit the process
///
/// Logs at Error level (since the log crate has no Fatal level),
/// flushes stdout, and calls std::process::exit(1).
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
        // Flush stdout to ensure message is visible
        {
            use std::io::Write;
            let _ = std::io::stdout().flush();
        }
        std::process::exit(1);
    }};
}
