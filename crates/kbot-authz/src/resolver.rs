//! Directory-backed selector matching for grant evaluation.
//!
//! A grant can constrain itself to resource instances whose labels satisfy
//! a selector. Deciding that requires live cluster state, so the resolver
//! fetches the instance's labels from the resource directory on every call;
//! nothing is cached.

use crate::directory::{DirectoryError, ResourceDirectory};
use crate::selector::{ParseError, Selector};
use std::sync::Arc;
use thiserror::Error;

pub const RESOURCE_PODS: &str = "pods";
pub const RESOURCE_DEPLOYMENTS: &str = "deployments";
pub const RESOURCE_SERVICES: &str = "services";

#[derive(Debug, Error)]
pub enum SelectorError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("selector checks are not supported for resource type {0:?}")]
    UnsupportedResource(String),
}

/// Evaluates grant selectors against live resource labels.
#[derive(Clone)]
pub struct SelectorResolver {
    directory: Arc<dyn ResourceDirectory>,
}

impl SelectorResolver {
    pub fn new(directory: Arc<dyn ResourceDirectory>) -> Self {
        Self { directory }
    }

    /// True iff the named instance satisfies `expr`.
    ///
    /// An empty expression matches unconditionally without touching the
    /// directory. Only pods and deployments support label lookups; services
    /// pass unconditionally (selector enforcement was never wired up for
    /// them, a known gap carried forward deliberately). Any other resource
    /// type is an error.
    ///
    /// # Errors
    /// - [`SelectorError::Parse`] when `expr` is malformed.
    /// - [`SelectorError::Directory`] when the instance does not exist or
    ///   the directory fails.
    /// - [`SelectorError::UnsupportedResource`] for unknown resource types.
    pub async fn matches(
        &self,
        resource: &str,
        namespace: &str,
        name: &str,
        expr: &str,
    ) -> Result<bool, SelectorError> {
        if expr.trim().is_empty() {
            return Ok(true);
        }
        match resource {
            RESOURCE_PODS | RESOURCE_DEPLOYMENTS => {
                let selector: Selector = expr.parse()?;
                let labels = self.directory.get_labels(resource, namespace, name).await?;
                Ok(selector.matches(&labels))
            }
            RESOURCE_SERVICES => Ok(true),
            other => Err(SelectorError::UnsupportedResource(other.to_string())),
        }
    }
}
