//! Permission store contract.
//!
//! One record per principal, addressed by the key scheme in
//! [`crate::principal`]. Every authorization check loads fresh; the store is
//! the single source of truth and nothing in this crate caches records, so a
//! revocation takes effect on the very next check.

use crate::record::PermissionRecord;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence backend for permission records.
///
/// Create versus update is decided solely by the record's version token:
/// `None` means the record was never persisted and `save` must create it;
/// `Some` means `save` must update the stored record and may reject a stale
/// token with [`StoreError::Conflict`]. No retry happens at this layer.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Load the record stored under `key`.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] when no record exists for the key.
    async fn load(&self, key: &str) -> StoreResult<PermissionRecord>;

    /// Persist `record` and return the stored copy carrying its fresh
    /// version token.
    async fn save(&self, record: &PermissionRecord) -> StoreResult<PermissionRecord>;
}
