// Concurrency policy for a component
// A closed lookup table built once at component-build time, replacing
// per-call reflection over method annotations

use std::collections::HashMap;

use porteiro_common::{AccessTimeout, LockType};
use serde::{Deserialize, Serialize};

/// Per-method overrides of the component-level defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodConcurrency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<AccessTimeout>,
}

/// Static concurrency configuration for one component
///
/// Resolution is a pure lookup: per-method entry first, then the
/// component-level default, then the system default of `Write` for lock
/// types. Every method resolves to something; there is no "unconfigured"
/// answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyPolicy {
    #[serde(default)]
    default_lock: LockType,
    #[serde(default)]
    default_timeout: AccessTimeout,
    #[serde(default)]
    methods: HashMap<String, MethodConcurrency>,
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConcurrencyPolicy {
    pub fn builder() -> ConcurrencyPolicyBuilder {
        ConcurrencyPolicyBuilder::default()
    }

    /// The lock type governing `method`. Never absent.
    pub fn lock_type_for(&self, method: &str) -> LockType {
        self.methods
            .get(method)
            .and_then(|entry| entry.lock)
            .unwrap_or(self.default_lock)
    }

    /// The declared wait bound for `method`.
    ///
    /// Negative declarations are returned as-is; reinterpretation is the
    /// gate's business, not the policy's.
    pub fn timeout_for(&self, method: &str) -> AccessTimeout {
        self.methods
            .get(method)
            .and_then(|entry| entry.timeout)
            .unwrap_or(self.default_timeout)
    }

    /// The component-level default wait bound
    pub fn default_timeout(&self) -> AccessTimeout {
        self.default_timeout
    }
}

/// Builder for [`ConcurrencyPolicy`]
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyPolicyBuilder {
    default_lock: Option<LockType>,
    default_timeout: Option<AccessTimeout>,
    methods: HashMap<String, MethodConcurrency>,
}

impl ConcurrencyPolicyBuilder {
    /// Component-level lock type applied to methods without their own
    pub fn default_lock(mut self, lock: LockType) -> Self {
        self.default_lock = Some(lock);
        self
    }

    /// Component-level wait bound applied to methods without their own
    pub fn default_timeout(mut self, timeout: AccessTimeout) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    pub fn method_lock(mut self, method: impl Into<String>, lock: LockType) -> Self {
        self.methods.entry(method.into()).or_default().lock = Some(lock);
        self
    }

    pub fn method_timeout(mut self, method: impl Into<String>, timeout: AccessTimeout) -> Self {
        self.methods.entry(method.into()).or_default().timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ConcurrencyPolicy {
        ConcurrencyPolicy {
            default_lock: self.default_lock.unwrap_or_default(),
            default_timeout: self.default_timeout.unwrap_or_default(),
            methods: self.methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use porteiro_common::DEFAULT_ACCESS_TIMEOUT;
    use proptest::prelude::*;

    #[test]
    fn test_unconfigured_method_falls_back_to_write() {
        let policy = ConcurrencyPolicy::default();
        assert_eq!(policy.lock_type_for("anything"), LockType::Write);
        assert_eq!(policy.timeout_for("anything"), DEFAULT_ACCESS_TIMEOUT);
    }

    #[test]
    fn test_component_default_applies() {
        let policy = ConcurrencyPolicy::builder()
            .default_lock(LockType::Read)
            .default_timeout(AccessTimeout::from_millis(250))
            .build();
        assert_eq!(policy.lock_type_for("get"), LockType::Read);
        assert_eq!(policy.timeout_for("get"), AccessTimeout::from_millis(250));
    }

    #[test]
    fn test_method_entry_wins_over_default() {
        let policy = ConcurrencyPolicy::builder()
            .default_lock(LockType::Read)
            .method_lock("update", LockType::Write)
            .method_timeout("update", AccessTimeout::from_secs(1))
            .build();
        assert_eq!(policy.lock_type_for("update"), LockType::Write);
        assert_eq!(policy.timeout_for("update"), AccessTimeout::from_secs(1));
        // Methods without entries keep the component default
        assert_eq!(policy.lock_type_for("get"), LockType::Read);
        assert_eq!(policy.timeout_for("get"), DEFAULT_ACCESS_TIMEOUT);
    }

    #[test]
    fn test_partial_method_entry() {
        let policy = ConcurrencyPolicy::builder()
            .method_timeout("slow", AccessTimeout::from_secs(30))
            .build();
        assert_eq!(policy.lock_type_for("slow"), LockType::Write);
        assert_eq!(policy.timeout_for("slow"), AccessTimeout::from_secs(30));
    }

    #[test]
    fn test_policy_from_json() {
        let policy: ConcurrencyPolicy = serde_json::from_str(
            r#"{
                "default_lock": "read",
                "default_timeout": 2000,
                "methods": {
                    "reset": { "lock": "write", "timeout": -1 }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(policy.lock_type_for("reset"), LockType::Write);
        assert!(policy.timeout_for("reset").is_negative());
        assert_eq!(policy.lock_type_for("peek"), LockType::Read);
    }

    proptest! {
        #[test]
        fn prop_resolution_is_total(method in ".*") {
            let policy = ConcurrencyPolicy::builder()
                .default_lock(LockType::Read)
                .method_lock("update", LockType::Write)
                .build();
            // Any method name resolves without panicking
            let lock = policy.lock_type_for(&method);
            prop_assert!(lock == LockType::Read || lock == LockType::Write);
            let _ = policy.timeout_for(&method);
        }

        #[test]
        fn prop_unknown_methods_use_defaults(method in "[a-z]{1,12}") {
            let policy = ConcurrencyPolicy::builder()
                .default_timeout(AccessTimeout::from_millis(750))
                .build();
            prop_assume!(method != "update");
            prop_assert_eq!(policy.timeout_for(&method), AccessTimeout::from_millis(750));
            prop_assert_eq!(policy.lock_type_for(&method), LockType::Write);
        }
    }
}
