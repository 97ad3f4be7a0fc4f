// Core services for container-managed concurrency

pub mod gate;
pub mod lock;
pub mod policy;
pub mod registry;

// Re-export commonly used types
pub use gate::InvocationGate;
pub use lock::{InvocationLock, OwnerToken};
pub use policy::{ConcurrencyPolicy, ConcurrencyPolicyBuilder, MethodConcurrency};
pub use registry::ComponentRegistry;
