// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logging initialization
//!
//! ddsx emits through the `log` facade. These helpers install an `env_logger`
//! backend for binaries and tests that do not bring their own.

use crate::{Error, Result};

/// Log level for ddsx logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Initialize logging with console output at `level`.
///
/// # Errors
/// `Error::Config` if a logger is already installed.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let filter: log::LevelFilter = level.into();

    env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| Error::Config(format!("logger already initialized: {}", e)))
}

/// Initialize logging, letting `RUST_LOG` override `default_level`.
pub fn init_logging_env(default_level: LogLevel) -> Result<()> {
    let filter: log::LevelFilter = default_level.into();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(filter.to_string()),
    )
    .format_timestamp_millis()
    .try_init()
    .map_err(|e| Error::Config(format!("logger already initialized: {}", e)))
}

/// Initialize logging with a filter string such as `"ddsx=debug,ddsx_idlc=trace"`.
pub fn init_logging_with_filter(filter: &str) -> Result<()> {
    if filter.trim().is_empty() {
        return Err(Error::Config("empty log filter".into()));
    }

    env_logger::Builder::new()
        .parse_filters(filter)
        .format_timestamp_millis()
        .try_init()
        .map_err(|e| Error::Config(format!("logger already initialized: {}", e)))
}
