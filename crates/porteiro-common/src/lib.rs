//! Porteiro Common - Shared types and error taxonomy
//!
//! This crate provides the foundational types used across all Porteiro
//! components:
//! - Lock types for container-managed concurrency
//! - Access timeout settings
//! - Error types

pub mod error;

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Re-exports for convenience
pub use error::ConcurrencyError;

/// Lock types for container-managed concurrency
///
/// `Read` permits any number of concurrent holders; `Write` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockType {
    Read,
    /// Exclusive access. The conservative system-wide default: methods
    /// without an explicit declaration are treated as `Write`.
    #[default]
    Write,
}

impl LockType {
    pub fn as_str(self) -> &'static str {
        match self {
            LockType::Read => "read",
            LockType::Write => "write",
        }
    }
}

impl std::fmt::Display for LockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LockType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(LockType::Read),
            "write" => Ok(LockType::Write),
            _ => Err(format!("Invalid lock type: {}", s)),
        }
    }
}

/// Default access timeout applied when neither the method nor the
/// component declares one: 5000 milliseconds.
pub const DEFAULT_ACCESS_TIMEOUT: AccessTimeout = AccessTimeout::from_millis(5000);

/// A declared bound on how long an invocation may wait to acquire its
/// component lock.
///
/// Stored as signed milliseconds: declared values can be negative, and a
/// negative declaration is not rejected at build time. The invocation
/// gate reinterprets it as "use the component default" at admission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessTimeout {
    millis: i64,
}

impl AccessTimeout {
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self {
            millis: secs * 1000,
        }
    }

    pub const fn as_millis(self) -> i64 {
        self.millis
    }

    /// Whether the declared value is negative
    pub const fn is_negative(self) -> bool {
        self.millis < 0
    }

    /// The wait bound as a `Duration`, or `None` for a negative declaration
    pub fn duration(self) -> Option<Duration> {
        if self.millis < 0 {
            None
        } else {
            Some(Duration::from_millis(self.millis as u64))
        }
    }
}

impl Default for AccessTimeout {
    fn default() -> Self {
        DEFAULT_ACCESS_TIMEOUT
    }
}

impl std::fmt::Display for AccessTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_type() {
        assert_eq!(LockType::default(), LockType::Write);
        assert_eq!(LockType::Read.as_str(), "read");
        assert_eq!(LockType::Write.as_str(), "write");
        assert_eq!("read".parse::<LockType>().unwrap(), LockType::Read);
        assert_eq!("write".parse::<LockType>().unwrap(), LockType::Write);
        assert!("exclusive".parse::<LockType>().is_err());
    }

    #[test]
    fn test_lock_type_serde() {
        assert_eq!(serde_json::to_string(&LockType::Read).unwrap(), "\"read\"");
        let parsed: LockType = serde_json::from_str("\"write\"").unwrap();
        assert_eq!(parsed, LockType::Write);
    }

    #[test]
    fn test_access_timeout() {
        let t = AccessTimeout::from_secs(2);
        assert_eq!(t.as_millis(), 2000);
        assert!(!t.is_negative());
        assert_eq!(t.duration(), Some(Duration::from_millis(2000)));

        let negative = AccessTimeout::from_millis(-1);
        assert!(negative.is_negative());
        assert_eq!(negative.duration(), None);
    }

    #[test]
    fn test_access_timeout_default() {
        assert_eq!(AccessTimeout::default(), DEFAULT_ACCESS_TIMEOUT);
        assert_eq!(DEFAULT_ACCESS_TIMEOUT.as_millis(), 5000);
    }

    #[test]
    fn test_access_timeout_display() {
        assert_eq!(AccessTimeout::from_millis(250).to_string(), "250ms");
        assert_eq!(AccessTimeout::from_millis(-1).to_string(), "-1ms");
    }
}
