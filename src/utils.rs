//! Utility functions and helpers
//!
//! Wall-clock helpers, display formatting, hex validation and logging setup.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Get current timestamp in seconds since Unix epoch, as a header timestamp.
///
/// Saturates at `u32::MAX` rather than wrapping.
pub fn current_timestamp_secs() -> u32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    u32::try_from(secs).unwrap_or(u32::MAX)
}

/// Format a header timestamp for display
pub fn format_timestamp(timestamp: u32) -> String {
    match DateTime::<Utc>::from_timestamp(i64::from(timestamp), 0) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => timestamp.to_string(),
    }
}

/// Validate hex string format
pub fn validate_hex_string(s: &str, expected_len: Option<usize>) -> Result<()> {
    if let Some(len) = expected_len {
        if s.len() != len {
            return Err(Error::config(format!(
                "Expected {} hex characters, got {}",
                len,
                s.len()
            )));
        }
    }

    if !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::config("String contains non-hexadecimal characters"));
    }

    Ok(())
}

/// Initialize the global tracing subscriber.
///
/// `level` is an `EnvFilter` directive; `RUST_LOG` wins when set.
pub fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp_secs();
        assert!(ts > 1_600_000_000); // After 2020
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_timestamp(1_231_006_505), "2009-01-03 18:15:05 UTC");
    }

    #[test]
    fn test_validate_hex_string() {
        assert!(validate_hex_string("deadbeef", Some(8)).is_ok());
        assert!(validate_hex_string("DEADBEEF", Some(8)).is_ok());
        assert!(validate_hex_string("123456789abcdef0", None).is_ok());

        assert!(validate_hex_string("deadbeef", Some(10)).is_err());
        assert!(validate_hex_string("deadbzzf", None).is_err());
        assert!(validate_hex_string("", Some(1)).is_err());
    }
}
