//! Porteiro Core - Container-managed concurrency for component invocations
//!
//! This crate provides:
//! - A reentrant read/write lock tracked by logical owner token
//! - Per-component concurrency policies resolved at build time
//! - An invocation gate enforcing bounded-wait admission
//! - A registry tying each lock's lifetime to its component
//!
//! # Example
//!
//! ```
//! use porteiro_common::{AccessTimeout, LockType};
//! use porteiro_core::service::{ConcurrencyPolicy, InvocationGate};
//!
//! let gate = InvocationGate::new(
//!     "counter",
//!     ConcurrencyPolicy::builder()
//!         .method_lock("peek", LockType::Read)
//!         .default_timeout(AccessTimeout::from_secs(5))
//!         .build(),
//! );
//! let value = gate.admit("peek", || 42).unwrap();
//! assert_eq!(value, 42);
//! ```

pub mod service;

// Re-export commonly used types
pub use service::{ComponentRegistry, ConcurrencyPolicy, InvocationGate, InvocationLock, OwnerToken};

// Re-export the shared error type
pub use porteiro_common::ConcurrencyError;
