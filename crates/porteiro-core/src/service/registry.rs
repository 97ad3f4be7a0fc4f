// Component registry: one invocation gate per logical component
// Owned by the embedding container, never process-wide static state

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::service::gate::InvocationGate;
use crate::service::policy::ConcurrencyPolicy;

/// Maps component names to their invocation gates.
///
/// A component's gate (and with it, its lock) is created lazily on first
/// registration and dropped when the component is deregistered. Gates are
/// `Arc`-shared, so invocations already admitted through a deregistered
/// gate finish normally; the lock is freed when the last reference goes.
#[derive(Default)]
pub struct ComponentRegistry {
    gates: DashMap<String, Arc<InvocationGate>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The gate for `component`, created from `policy` on first use.
    ///
    /// Re-registering an existing component returns the existing gate
    /// unchanged; a component's policy is fixed for its lifetime.
    pub fn register(
        &self,
        component: &str,
        policy: ConcurrencyPolicy,
    ) -> Arc<InvocationGate> {
        self.gates
            .entry(component.to_string())
            .or_insert_with(|| {
                debug!(component = %component, "created invocation gate");
                Arc::new(InvocationGate::new(component, policy))
            })
            .clone()
    }

    /// Look up the gate for a registered component
    pub fn get(&self, component: &str) -> Option<Arc<InvocationGate>> {
        self.gates.get(component).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop the component's entry, releasing the registry's ownership of
    /// its gate and lock
    pub fn deregister(&self, component: &str) -> bool {
        let removed = self.gates.remove(component).is_some();
        if removed {
            debug!(component = %component, "dropped invocation gate");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
