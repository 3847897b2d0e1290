//! Logging setup for provider processes
//!
//! Terraform owns the plugin's stdout, so everything is written to stderr.
//! The level follows the TF_LOG conventions used by Terraform itself.

use crate::error::{Result, TfplugError};
use std::sync::OnceLock;
use tracing::Level;

/// Log level for the provider process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a TF_LOG value; unrecognised values give None
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "JSON" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Reads TF_LOG_PROVIDER, then TF_LOG, falling back to Info
    pub fn from_env() -> Self {
        ["TF_LOG_PROVIDER", "TF_LOG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find_map(|value| Self::parse(&value))
            .unwrap_or(LogLevel::Info)
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

static INIT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Installs the global subscriber. Later calls return the first outcome.
pub fn init(level: LogLevel) -> Result<()> {
    INIT.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::from(level))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|e| e.to_string())
    })
    .clone()
    .map_err(TfplugError::LoggingError)
}

/// Installs the subscriber at the level named by TF_LOG_PROVIDER or TF_LOG
pub fn init_from_env() -> Result<()> {
    init(LogLevel::from_env())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("TF_LOG_PROVIDER");
        std::env::remove_var("TF_LOG");
    }

    #[test]
    fn parses_terraform_log_levels() {
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse(" info "), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("Warn"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("json"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    #[serial]
    fn from_env_prefers_provider_variable() {
        clear_env();
        assert_eq!(LogLevel::from_env(), LogLevel::Info);

        std::env::set_var("TF_LOG", "warn");
        assert_eq!(LogLevel::from_env(), LogLevel::Warn);

        std::env::set_var("TF_LOG_PROVIDER", "debug");
        assert_eq!(LogLevel::from_env(), LogLevel::Debug);

        std::env::set_var("TF_LOG_PROVIDER", "verbose");
        assert_eq!(LogLevel::from_env(), LogLevel::Warn);

        clear_env();
    }

    #[test]
    #[serial]
    fn init_is_idempotent() {
        clear_env();
        std::env::set_var("TF_LOG", "trace");

        assert!(init_from_env().is_ok());
        assert!(init(LogLevel::Debug).is_ok());
        assert!(init_from_env().is_ok());

        clear_env();
    }
}
