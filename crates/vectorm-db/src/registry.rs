//! Process-wide connection registry.
//!
//! Maps an alias string to an active storage client handle. The registry is
//! populated by registration calls made by the external connection-management
//! collaborator; the engine itself only resolves aliases at evaluation time.
//! The engine never creates, closes, or mutates entries, which is what makes
//! cancellation of in-flight operations safe: connections are looked up,
//! never owned.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use vectorm_core::{OrmError, OrmResult};

use crate::client::VectorClient;

static REGISTRY: Lazy<RwLock<HashMap<String, Arc<dyn VectorClient>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a client handle under an alias.
///
/// Called by the connection-management collaborator, not by the engine.
/// Re-registering an alias replaces the previous handle; in-flight operations
/// holding the old `Arc` finish against it undisturbed.
pub fn register(alias: impl Into<String>, client: Arc<dyn VectorClient>) {
    let alias = alias.into();
    tracing::debug!(alias = %alias, "registering connection");
    REGISTRY
        .write()
        .expect("connection registry lock poisoned")
        .insert(alias, client);
}

/// Resolves an alias to its registered client handle.
///
/// # Errors
///
/// Returns [`OrmError::ConnectionNotFound`] if the alias is unregistered.
pub fn resolve(alias: &str) -> OrmResult<Arc<dyn VectorClient>> {
    REGISTRY
        .read()
        .expect("connection registry lock poisoned")
        .get(alias)
        .cloned()
        .ok_or_else(|| OrmError::ConnectionNotFound(alias.to_string()))
}

/// Removes an alias from the registry. Returns `true` if it was present.
pub fn unregister(alias: &str) -> bool {
    REGISTRY
        .write()
        .expect("connection registry lock poisoned")
        .remove(alias)
        .is_some()
}

/// Removes every registered alias. Intended for test teardown.
pub fn clear() {
    REGISTRY
        .write()
        .expect("connection registry lock poisoned")
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{InsertResult, Row, ScalarQuery, VectorSearch};

    struct NullClient;

    #[async_trait::async_trait]
    impl VectorClient for NullClient {
        async fn query(&self, _request: ScalarQuery) -> OrmResult<Vec<Row>> {
            Ok(Vec::new())
        }
        async fn search(&self, _request: VectorSearch) -> OrmResult<Vec<Row>> {
            Ok(Vec::new())
        }
        async fn insert(&self, _collection: &str, _rows: Vec<Row>) -> OrmResult<InsertResult> {
            Ok(InsertResult::default())
        }
        async fn delete(&self, _collection: &str, _expr: &str) -> OrmResult<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_register_and_resolve() {
        register("registry_test_a", Arc::new(NullClient));
        assert!(resolve("registry_test_a").is_ok());
        assert!(unregister("registry_test_a"));
    }

    #[test]
    fn test_resolve_unknown_alias() {
        let err = resolve("registry_test_missing")
            .err()
            .expect("expected resolve to fail");
        match err {
            OrmError::ConnectionNotFound(alias) => {
                assert_eq!(alias, "registry_test_missing");
            }
            _ => panic!("expected ConnectionNotFound"),
        }
    }

    #[test]
    fn test_reregister_replaces() {
        register("registry_test_b", Arc::new(NullClient));
        let first = resolve("registry_test_b").unwrap();
        register("registry_test_b", Arc::new(NullClient));
        let second = resolve("registry_test_b").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        unregister("registry_test_b");
    }

    #[test]
    fn test_unregister_missing() {
        assert!(!unregister("registry_test_never_registered"));
    }
}
