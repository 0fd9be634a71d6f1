//! Logger module for tickbridge
//!
//! Go-style simple logging: `[LEVEL] message`
//!
//! # Usage
//!
//! ```rust
//! use tickbridge::util::logger;
//!
//! logger::init();
//! tracing::info!("Hello, {}", "world");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Initialize logger with default configuration (INFO level)
pub fn init() {
    init_with_level(LogLevel::Info);
}

/// Initialize logger with custom level (Go style: `[LEVEL] message`)
///
/// Panics if a global subscriber is already set.
pub fn init_with_level(level: LogLevel) {
    Registry::default().with(fmt_layer(level)).init();
}

/// Like [`init_with_level`], but returns `false` instead of panicking when a
/// global subscriber already exists (embedders that install their own).
pub fn try_init_with_level(level: LogLevel) -> bool {
    Registry::default().with(fmt_layer(level)).try_init().is_ok()
}

/// Initialize logger for debug use (DEBUG level)
pub fn init_debug() {
    init_with_level(LogLevel::Debug);
}

fn fmt_layer(level: LogLevel) -> impl Layer<Registry> {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(level.into());

    // 不显示时间、不显示模块路径、无颜色
    tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter)
}
