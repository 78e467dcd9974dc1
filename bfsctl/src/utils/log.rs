// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Normal as u8);

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn log_level() -> LogLevel {
    match LOG_LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Quiet,
        2 => LogLevel::Verbose,
        _ => LogLevel::Normal,
    }
}

/// Sets the CLI verbosity and routes library `log` records to stderr.
///
/// `RUST_LOG` still overrides the filter derived from `level`.
pub fn init_logging(level: LogLevel) {
    set_log_level(level);
    let filter = match level {
        LogLevel::Quiet => log::LevelFilter::Error,
        LogLevel::Normal => log::LevelFilter::Warn,
        LogLevel::Verbose => log::LevelFilter::Debug,
    };
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() != $crate::utils::LogLevel::Quiet {
            println!("[bfsctl] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_verbose {
    ($($arg:tt)*) => {
        if $crate::utils::log_level() == $crate::utils::LogLevel::Verbose {
            println!("[bfsctl] {}", format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        eprintln!("[bfsctl] {} {}", colored::Colorize::yellow("warning:"), format_args!($($arg)*));
    };
}
