//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables. The log format is read
//! on its own, before any subscriber exists, so it cannot log; callers report
//! a rejected value once logging is initialized.

use std::env;

use crate::webhook::is_signature_verification_enabled;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event (default)
    Json,
    /// Human-readable, for local use
    Pretty,
}

impl LogFormat {
    /// Read `LOG_FORMAT`.
    ///
    /// Returns the default when the variable is unset or unrecognised; in the
    /// latter case the rejected value is returned alongside it.
    pub fn from_env() -> (Self, Option<String>) {
        parse_log_format("LOG_FORMAT", LogFormat::Json)
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postal's webhook public key as bare base64 (no PEM headers)
    pub postal_webhook_public_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            postal_webhook_public_key: env::var("POSTAL_WEBHOOK_PUBLIC_KEY").ok(),
        }
    }

    /// Whether a usable public key is configured.
    pub fn signature_verification_enabled(&self) -> bool {
        is_signature_verification_enabled(&self.postal_webhook_public_key)
    }
}

/// Parse a log format name ("json" or "pretty").
fn parse_log_format(name: &str, default: LogFormat) -> (LogFormat, Option<String>) {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return (default, None),
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => (LogFormat::Json, None),
        "pretty" | "text" => (LogFormat::Pretty, None),
        _ => (default, Some(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format_valid() {
        env::set_var("TEST_LOG_FORMAT_PRETTY", " Pretty ");
        assert_eq!(
            parse_log_format("TEST_LOG_FORMAT_PRETTY", LogFormat::Json),
            (LogFormat::Pretty, None)
        );
        env::remove_var("TEST_LOG_FORMAT_PRETTY");
    }

    #[test]
    fn test_parse_log_format_invalid_is_reported() {
        env::set_var("TEST_LOG_FORMAT_BOGUS", "xml");
        assert_eq!(
            parse_log_format("TEST_LOG_FORMAT_BOGUS", LogFormat::Json),
            (LogFormat::Json, Some("xml".to_string()))
        );
        env::remove_var("TEST_LOG_FORMAT_BOGUS");
    }

    #[test]
    fn test_parse_log_format_default() {
        assert_eq!(
            parse_log_format("NONEXISTENT_VAR", LogFormat::Pretty),
            (LogFormat::Pretty, None)
        );
    }

    #[test]
    fn test_signature_verification_enabled() {
        let mut config = Config {
            postal_webhook_public_key: None,
        };
        assert!(!config.signature_verification_enabled());

        config.postal_webhook_public_key = Some(" \n".to_string());
        assert!(!config.signature_verification_enabled());

        config.postal_webhook_public_key = Some("MFwwDQYJ".to_string());
        assert!(config.signature_verification_enabled());
    }
}
