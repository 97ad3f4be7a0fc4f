//! Test utilities shared by the Porteiro scenario tests

use std::sync::Arc;
use std::sync::Once;
use std::thread::JoinHandle;

use porteiro_common::{AccessTimeout, LockType};
use porteiro_core::service::{ConcurrencyPolicy, InvocationGate};

/// Install a test subscriber once per process; repeated calls are no-ops
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A gate whose every method resolves to an exclusive lock
pub fn write_gate(component: &str, timeout_ms: i64) -> Arc<InvocationGate> {
    Arc::new(InvocationGate::new(
        component,
        ConcurrencyPolicy::builder()
            .default_lock(LockType::Write)
            .default_timeout(AccessTimeout::from_millis(timeout_ms))
            .build(),
    ))
}

/// A gate whose every method resolves to a shared lock
pub fn read_gate(component: &str, timeout_ms: i64) -> Arc<InvocationGate> {
    Arc::new(InvocationGate::new(
        component,
        ConcurrencyPolicy::builder()
            .default_lock(LockType::Read)
            .default_timeout(AccessTimeout::from_millis(timeout_ms))
            .build(),
    ))
}

/// Join every worker, converting panics into a single error
pub fn join_all(handles: Vec<JoinHandle<()>>) -> anyhow::Result<()> {
    for handle in handles {
        handle
            .join()
            .map_err(|panic| anyhow::anyhow!("worker panicked: {:?}", panic))?;
    }
    Ok(())
}
