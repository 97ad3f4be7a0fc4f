// Invocation gate: admits calls into a component under its concurrency policy
// Resolve lock type and timeout, bounded acquire, run, release on every path

use std::time::{Duration, Instant};

use porteiro_common::{ConcurrencyError, LockType};
use tracing::debug;

use crate::service::lock::{AcquireError, InvocationLock, OwnerToken, ReadGuard, WriteGuard};
use crate::service::policy::ConcurrencyPolicy;

/// Serializes or shares invocations on one logical component instance.
///
/// Each admitted call resolves its lock type and wait bound from the
/// component's [`ConcurrencyPolicy`], acquires the matching side of the
/// component's shared [`InvocationLock`] with a bounded wait, runs the
/// call, and releases the lock on every exit path, including unwinding.
///
/// The gate owns the lock; both live exactly as long as the component.
pub struct InvocationGate {
    component: String,
    policy: ConcurrencyPolicy,
    lock: InvocationLock,
}

/// Keeps whichever guard was acquired alive for the duration of the call
enum Hold<'a> {
    Read { _guard: ReadGuard<'a> },
    Write { _guard: WriteGuard<'a> },
}

impl InvocationGate {
    pub fn new(component: impl Into<String>, policy: ConcurrencyPolicy) -> Self {
        Self {
            component: component.into(),
            policy,
            lock: InvocationLock::new(),
        }
    }

    /// Component name, used only for diagnostics and error context
    pub fn component_name(&self) -> &str {
        &self.component
    }

    pub fn policy(&self) -> &ConcurrencyPolicy {
        &self.policy
    }

    /// Admit a call owned by the current thread.
    ///
    /// See [`InvocationGate::admit_as`].
    pub fn admit<T>(&self, method: &str, call: impl FnOnce() -> T) -> Result<T, ConcurrencyError> {
        self.admit_as(OwnerToken::current_thread(), method, call)
    }

    /// Admit a call on behalf of an explicit logical owner.
    ///
    /// Reentrant admission by the current write holder succeeds
    /// immediately regardless of the configured timeout. An owner
    /// holding only a read lock that asks for write fails immediately
    /// with [`ConcurrencyError::IllegalLoopback`].
    ///
    /// Whatever the call itself returns or panics with passes through
    /// unchanged; this layer never wraps, retries, or swallows it.
    pub fn admit_as<T>(
        &self,
        owner: OwnerToken,
        method: &str,
        call: impl FnOnce() -> T,
    ) -> Result<T, ConcurrencyError> {
        let lock_type = self.policy.lock_type_for(method);
        let wait = self.resolve_wait(method);
        let deadline = wait.map(|bound| Instant::now() + bound);

        let acquired = match lock_type {
            LockType::Read => self
                .lock
                .acquire_read(owner, deadline)
                .map(|guard| Hold::Read { _guard: guard }),
            LockType::Write => self
                .lock
                .acquire_write(owner, deadline)
                .map(|guard| Hold::Write { _guard: guard }),
        };

        match acquired {
            Ok(_hold) => Ok(call()),
            Err(AcquireError::TimedOut) => {
                let timeout = wait.unwrap_or_default();
                debug!(
                    component = %self.component,
                    method = %method,
                    ?timeout,
                    "lock acquisition timed out"
                );
                Err(ConcurrencyError::AcquireTimeout {
                    component: self.component.clone(),
                    method: method.to_string(),
                    timeout,
                })
            }
            Err(AcquireError::IllegalLoopback) => Err(ConcurrencyError::IllegalLoopback {
                component: self.component.clone(),
                method: method.to_string(),
            }),
        }
    }

    /// The wait bound actually used for `method`; `None` waits indefinitely.
    ///
    /// A negative declared timeout is reinterpreted as "use the component
    /// default". This mirrors the EE container's permissiveness and is
    /// kept for compatibility.
    fn resolve_wait(&self, method: &str) -> Option<Duration> {
        let declared = self.policy.timeout_for(method);
        if declared.is_negative() {
            let default = self.policy.default_timeout();
            debug!(
                component = %self.component,
                method = %method,
                %declared,
                %default,
                "declared access timeout is negative, substituting component default"
            );
            default.duration()
        } else {
            declared.duration()
        }
    }
}
