//! In-memory implementation of the permission store.
//!
//! # Purpose
//! Implements [`PermissionStore`] entirely in memory using a `HashMap`
//! guarded by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - embedders that do not need durability
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: reads take a read lock, mutations a
//!   write lock; there is no multi-node coordination.
//!
//! # Version tokens
//! Each key carries a monotonically increasing counter rendered as the
//! record's opaque version token. `save` with no token creates; `save` with
//! a token updates only when the token still matches, otherwise it returns
//! a conflict, mirroring how an optimistic-concurrency backend behaves.

use super::{PermissionStore, StoreError, StoreResult};
use crate::record::PermissionRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Versioned {
    record: PermissionRecord,
    version: u64,
}

/// In-memory permission store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPermissionStore {
    records: Arc<RwLock<HashMap<String, Versioned>>>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored. Test and diagnostics helper.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn load(&self, key: &str) -> StoreResult<PermissionRecord> {
        let records = self.records.read().await;
        let entry = records
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let mut record = entry.record.clone();
        record.version = Some(entry.version.to_string());
        Ok(record)
    }

    async fn save(&self, record: &PermissionRecord) -> StoreResult<PermissionRecord> {
        let key = record.key();
        let mut records = self.records.write().await;

        let next_version = match &record.version {
            None => {
                if records.contains_key(&key) {
                    return Err(StoreError::Conflict(format!("record {key} already exists")));
                }
                1
            }
            Some(token) => {
                let entry = records
                    .get(&key)
                    .ok_or_else(|| StoreError::NotFound(key.clone()))?;
                if entry.version.to_string() != *token {
                    return Err(StoreError::Conflict(format!(
                        "stale version {token:?} for record {key}"
                    )));
                }
                entry.version + 1
            }
        };

        let mut stored = record.clone();
        stored.version = None;
        records.insert(
            key,
            Versioned {
                record: stored.clone(),
                version: next_version,
            },
        );
        metrics::gauge!("kbot_permission_records_total").set(records.len() as f64);

        stored.version = Some(next_version.to_string());
        Ok(stored)
    }
}
