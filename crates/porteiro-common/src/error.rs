//! Error types for Porteiro
//!
//! The invocation gate has exactly two failure kinds of its own: a
//! bounded acquisition wait that elapsed, and a reentrant read-to-write
//! upgrade attempt. Anything raised by the guarded call itself passes
//! through this layer untouched.

use std::time::Duration;

/// Failures produced by the concurrency layer
///
/// A third kind described by the EE model, "lock type is neither read
/// nor write", is unrepresentable here: `LockType` is a closed enum.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConcurrencyError {
    /// The lock could not be acquired within the bounded wait.
    ///
    /// Terminal for the invocation; this layer never retries.
    #[error("component '{component}' method '{method}': failed to acquire lock within {timeout:?}")]
    AcquireTimeout {
        component: String,
        method: String,
        timeout: Duration,
    },

    /// A caller holding only a read lock attempted a reentrant write
    /// acquisition on the same component. Upgrading without releasing
    /// first is unsafe, so the attempt fails immediately instead of
    /// blocking.
    #[error("component '{component}' method '{method}': illegal lock upgrade from read to write")]
    IllegalLoopback { component: String, method: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_timeout_display() {
        let err = ConcurrencyError::AcquireTimeout {
            component: "counter".to_string(),
            method: "increment".to_string(),
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(
            format!("{}", err),
            "component 'counter' method 'increment': failed to acquire lock within 1.5s"
        );
    }

    #[test]
    fn test_illegal_loopback_display() {
        let err = ConcurrencyError::IllegalLoopback {
            component: "counter".to_string(),
            method: "reset".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "component 'counter' method 'reset': illegal lock upgrade from read to write"
        );
    }
}
