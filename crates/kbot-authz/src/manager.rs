//! Grant and revoke flows over the permission store.
//!
//! Both operations are plain read-modify-write sequences with no retry: if
//! the store rejects the save because the version token went stale, the
//! conflict propagates and the caller decides whether to re-load and
//! re-apply.

use crate::principal::PrincipalId;
use crate::record::PermissionRecord;
use crate::store::{PermissionStore, StoreError, StoreResult};
use std::sync::Arc;

/// Read-modify-write manager for permission records.
#[derive(Clone)]
pub struct PermissionManager {
    store: Arc<dyn PermissionStore>,
}

impl PermissionManager {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// Load the principal's record.
    pub async fn load(&self, principal: PrincipalId) -> StoreResult<PermissionRecord> {
        self.store.load(&principal.record_key()).await
    }

    /// Grant `(namespace, resource, verb, selector)` to the principal.
    ///
    /// A principal with no record gets a fresh one with the viewer role.
    /// The grant merges into an existing entry with the same
    /// `(namespace, selector)` scope when there is one. Returns the saved
    /// record.
    pub async fn grant(
        &self,
        principal: PrincipalId,
        namespace: &str,
        resource: &str,
        verb: &str,
        selector: &str,
    ) -> StoreResult<PermissionRecord> {
        let mut record = match self.load(principal).await {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => PermissionRecord::new(principal),
            Err(err) => return Err(err),
        };
        record.add_grant(namespace, resource, verb, selector);
        let saved = self.store.save(&record).await?;
        tracing::debug!(
            principal = %principal,
            namespace,
            resource,
            verb,
            selector,
            "permission granted"
        );
        Ok(saved)
    }

    /// Revoke `(resource, verb)` from the principal's grants in `namespace`.
    ///
    /// Revoking from a principal with no record is an error, not a no-op.
    /// The record is saved even when nothing matched; the returned record
    /// tells the caller what is left.
    pub async fn revoke(
        &self,
        principal: PrincipalId,
        namespace: &str,
        resource: &str,
        verb: &str,
    ) -> StoreResult<PermissionRecord> {
        let mut record = self.load(principal).await?;
        record.remove_grant(namespace, resource, verb);
        let saved = self.store.save(&record).await?;
        tracing::debug!(
            principal = %principal,
            namespace,
            resource,
            verb,
            "permission revoked"
        );
        Ok(saved)
    }
}
