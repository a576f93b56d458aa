//! Authorization core for the kbot chat-ops Kubernetes operator.
//!
//! # Purpose
//! Decides whether a principal (a numeric operator identity asserted by the
//! chat transport) may perform a verb on a resource type, optionally a named
//! instance, inside a namespace. Decisions come from a persisted grant list
//! per principal, a configured set of bootstrap principals, and, for
//! selector-scoped grants, the live labels of the target instance.
//!
//! # How it fits
//! This crate is a library surface with two injected collaborators:
//! a [`PermissionStore`] persisting one record per principal, and a
//! [`ResourceDirectory`] exposing namespace listings and label lookups.
//! In-memory implementations of both ship here for tests and local use;
//! production backends live with the embedder.
//!
//! # Key invariants
//! - No caching anywhere: every check loads the record fresh and fetches
//!   labels fresh, so a revocation is effective on the very next request.
//! - The engine never fails open: collaborator failures abort the check as
//!   errors instead of becoming allow or deny.
//! - Grant and revoke are read-modify-write against the store with
//!   optimistic versioning; stale-token conflicts propagate, no retries.
//!
//! # Examples
//! ```rust
//! use kbot_authz::{
//!     AccessRequest, BootstrapAuthority, Engine, InMemoryDirectory,
//!     InMemoryPermissionStore, PermissionManager, PrincipalId,
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> kbot_authz::AuthzResult<()> {
//! let store = Arc::new(InMemoryPermissionStore::new());
//! let directory = Arc::new(InMemoryDirectory::new());
//! let engine = Engine::new(
//!     BootstrapAuthority::new([PrincipalId::new(1)]),
//!     store.clone(),
//!     directory,
//! );
//! let manager = PermissionManager::new(store);
//!
//! manager.grant(PrincipalId::new(42), "production", "pods", "logs", "").await?;
//! let decision = engine
//!     .authorize(&AccessRequest::new(42, "production", "pods", "logs"))
//!     .await?;
//! assert!(decision.is_allowed());
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod directory;
pub mod engine;
pub mod error;
pub mod manager;
pub mod principal;
pub mod record;
pub mod resolver;
pub mod selector;
pub mod store;

pub use bootstrap::{BootstrapAuthority, BootstrapParseError};
pub use directory::memory::InMemoryDirectory;
pub use directory::{DirectoryError, DirectoryResult, LabelSet, ResourceDirectory};
pub use engine::{normalize_namespace, AccessRequest, Decision, Engine, DEFAULT_NAMESPACE};
pub use error::{AuthzError, AuthzResult};
pub use manager::PermissionManager;
pub use principal::{PrincipalId, RECORD_KEY_PREFIX};
pub use record::{Grant, PermissionRecord, Role, WILDCARD};
pub use resolver::{SelectorError, SelectorResolver};
pub use selector::{Operator, Requirement, Selector};
pub use store::memory::InMemoryPermissionStore;
pub use store::{PermissionStore, StoreError, StoreResult};
