//! In-memory resource directory for tests and local development.
//!
//! Namespaces keep registration order, and lookups always read current
//! state, so tests can register a namespace after a grant exists and watch
//! visibility pick it up immediately.

use super::{DirectoryError, DirectoryResult, LabelSet, ResourceDirectory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type ResourceKey = (String, String, String);

/// In-memory resource directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    namespaces: Arc<RwLock<Vec<String>>>,
    resources: Arc<RwLock<HashMap<ResourceKey, LabelSet>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace. Re-registering an existing name is a no-op, so
    /// order stays first-seen.
    pub async fn add_namespace(&self, name: &str) {
        let mut namespaces = self.namespaces.write().await;
        if !namespaces.iter().any(|existing| existing == name) {
            namespaces.push(name.to_string());
        }
    }

    /// Register a resource instance with its labels, replacing any previous
    /// registration of the same instance.
    pub async fn put_resource(&self, resource: &str, namespace: &str, name: &str, labels: LabelSet) {
        self.resources.write().await.insert(
            (
                resource.to_string(),
                namespace.to_string(),
                name.to_string(),
            ),
            labels,
        );
    }
}

#[async_trait]
impl ResourceDirectory for InMemoryDirectory {
    async fn list_namespaces(&self) -> DirectoryResult<Vec<String>> {
        Ok(self.namespaces.read().await.clone())
    }

    async fn get_labels(
        &self,
        resource: &str,
        namespace: &str,
        name: &str,
    ) -> DirectoryResult<LabelSet> {
        let key = (
            resource.to_string(),
            namespace.to_string(),
            name.to_string(),
        );
        self.resources
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound {
                resource: resource.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }
}
