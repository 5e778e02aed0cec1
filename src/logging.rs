//! Structured logging utilities for the mocking engine.
//!
//! This module provides helper functions for consistent, structured logging
//! across the engine using the `tracing` crate, plus an opt-in subscriber
//! for test binaries that want to see the output.

use std::fmt;
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log levels matching tracing crate levels.
#[derive(Debug, Clone, Copy)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Debug => "debug",
        };
        f.write_str(name)
    }
}

static INIT: Once = Once::new();

/// Install a stderr subscriber filtered to this crate.
///
/// `RUST_LOG` overrides the level; setting `STATIC_DOUBLE_LOG_JSON` switches
/// to JSON lines. Safe to call from every test: only the first call installs.
pub fn init_tracing(level: LogLevel) {
    INIT.call_once(|| {
        let fallback_filter = format!("static_double={}", level);
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| fallback_filter.into());

        if std::env::var("STATIC_DOUBLE_LOG_JSON").is_ok() {
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init();
        } else {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init();
        }
    });
}

/// Log a replacement being installed.
pub fn log_activation(target: &str, alias: &str) {
    tracing::info!(target_method = target, alias, "Mock activated");
}

/// Log a mocked method being restored.
pub fn log_deactivation(target: &str) {
    tracing::info!(target_method = target, "Mock deactivated");
}

/// Log a rebinder failure that was downgraded to a warning.
pub fn log_rebind_warning(target: &str, operation: &str, reason: &str) {
    tracing::warn!(
        target_method = target,
        operation,
        reason,
        "Method rebinding failed during restore"
    );
}

/// Log a by-reference capture being imported by value.
pub fn log_reference_capture(variable: &str) {
    tracing::warn!(
        variable,
        "Importing variable {} into overriding function by reference is not supported; {} will be imported by value instead.",
        variable,
        variable
    );
}

/// Log a call whose arguments fell into the unkeyed bucket.
pub fn log_unkeyed_call(target: &str, reason: &str) {
    tracing::debug!(
        target_method = target,
        reason,
        "Call arguments have no canonical encoding"
    );
}

/// Log a recording call for a target that is not mocked.
pub fn log_ignored_call(target: &str) {
    tracing::debug!(target_method = target, "Call of unmocked method not counted");
}

/// Log a source file being read into the extractor cache.
pub fn log_source_cache_miss(path: &str, bytes: usize) {
    tracing::debug!(path, bytes, "Source file cached");
}

/// Log a global reset.
pub fn log_reset(deactivated: usize) {
    tracing::debug!(deactivated, "All mocks deactivated");
}
