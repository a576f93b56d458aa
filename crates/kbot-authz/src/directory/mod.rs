//! Resource directory contract.
//!
//! The directory is the core's read-only window into live cluster state:
//! which namespaces exist, and what labels a named resource instance
//! carries. Label lookups are always fresh so selector-scoped authorization
//! reflects the cluster as it is now, not as it was when the grant was
//! written.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod memory;

/// Labels of one resource instance.
pub type LabelSet = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no {resource} named {name:?} in namespace {namespace:?}")]
    NotFound {
        resource: String,
        namespace: String,
        name: String,
    },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Names of every namespace currently known, in the directory's order.
    async fn list_namespaces(&self) -> DirectoryResult<Vec<String>>;

    /// Labels of the named resource instance.
    ///
    /// # Errors
    /// - [`DirectoryError::NotFound`] when no such instance exists.
    async fn get_labels(
        &self,
        resource: &str,
        namespace: &str,
        name: &str,
    ) -> DirectoryResult<LabelSet>;
}
