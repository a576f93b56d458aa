//! Permission records, grant entries, and their mutation rules.
//!
//! # Purpose
//! Defines the persisted shape of a principal's permissions and the two
//! invariant-preserving mutations: merge on grant and prune on revoke.
//!
//! # How it fits
//! [`crate::manager::PermissionManager`] loads a record, applies one of the
//! mutations, and saves it back. [`crate::engine::Engine`] only reads.
//!
//! # Key invariants
//! - `resources` and `verbs` never contain duplicate tokens; the merge step
//!   enforces this.
//! - Grant order is insertion order. Evaluation scans in that order, so it
//!   matters for selector-scoped entries (see the engine).
//! - The serialized layout is exactly
//!   `{principalId, role, grants: [{namespace, resources, verbs, selector}]}`;
//!   the store-attached version token is not part of it.

use crate::principal::PrincipalId;
use serde::{Deserialize, Serialize};

/// Matches every namespace, resource type, or verb in a grant position.
pub const WILDCARD: &str = "*";

/// Coarse role attached to a permission record.
///
/// Only [`Role::Admin`] changes behavior anywhere: it bypasses grant-entry
/// evaluation entirely. The default covers records written before roles were
/// introduced, which carried an empty role string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
    #[default]
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Viewer => "viewer",
        }
    }
}

/// One scoped rule inside a permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Exact namespace name, or [`WILDCARD`] for all namespaces.
    pub namespace: String,
    /// Resource type tokens; may contain [`WILDCARD`].
    pub resources: Vec<String>,
    /// Verb tokens; may contain [`WILDCARD`].
    pub verbs: Vec<String>,
    /// Label selector constraining the grant to matching instances.
    /// Empty means unconstrained.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selector: String,
}

impl Grant {
    pub fn new(namespace: &str, resource: &str, verb: &str, selector: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            resources: vec![resource.to_string()],
            verbs: vec![verb.to_string()],
            selector: selector.to_string(),
        }
    }

    /// Exact match or the single supported wildcard. No prefix or glob forms.
    pub fn covers_namespace(&self, namespace: &str) -> bool {
        self.namespace == WILDCARD || self.namespace == namespace
    }

    pub fn covers_resource(&self, resource: &str) -> bool {
        allows_token(&self.resources, resource)
    }

    pub fn covers_verb(&self, verb: &str) -> bool {
        allows_token(&self.verbs, verb)
    }
}

/// A token list allows a value iff it contains the value itself or `"*"`.
fn allows_token(tokens: &[String], value: &str) -> bool {
    tokens.iter().any(|token| token == value || token == WILDCARD)
}

/// Order-preserving union: first-seen order kept, unseen tokens appended.
fn merge_unique(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + incoming.len());
    for token in existing.iter().chain(incoming) {
        if !merged.contains(token) {
            merged.push(token.clone());
        }
    }
    merged
}

/// A principal's persisted permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRecord {
    pub principal_id: PrincipalId,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub grants: Vec<Grant>,
    /// Opaque concurrency token attached by the permission store on load.
    /// `None` means the record has never been persisted, which tells the
    /// store to create rather than update.
    #[serde(skip)]
    pub version: Option<String>,
}

impl PermissionRecord {
    /// Fresh record for a principal seen for the first time.
    pub fn new(principal: PrincipalId) -> Self {
        Self {
            principal_id: principal,
            role: Role::Viewer,
            grants: Vec::new(),
            version: None,
        }
    }

    pub fn key(&self) -> String {
        self.principal_id.record_key()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Merge a grant into the record.
    ///
    /// An existing entry with the exact same `(namespace, selector)` pair
    /// absorbs the resource and verb; otherwise a new singleton entry is
    /// appended. Repeated grants to the same scope therefore accumulate
    /// tokens instead of producing duplicate entries.
    pub fn add_grant(&mut self, namespace: &str, resource: &str, verb: &str, selector: &str) {
        if let Some(existing) = self
            .grants
            .iter_mut()
            .find(|grant| grant.namespace == namespace && grant.selector == selector)
        {
            existing.resources = merge_unique(&existing.resources, &[resource.to_string()]);
            existing.verbs = merge_unique(&existing.verbs, &[verb.to_string()]);
            return;
        }
        self.grants.push(Grant::new(namespace, resource, verb, selector));
    }

    /// Remove a `(resource, verb)` pair from every entry in `namespace`.
    ///
    /// The namespace comparison is literal: revoking against `"*"` touches
    /// only entries scoped to `"*"`, never concrete-namespace entries. An
    /// entry is dropped only when both its resources and verbs end up empty.
    pub fn remove_grant(&mut self, namespace: &str, resource: &str, verb: &str) {
        self.grants.retain_mut(|grant| {
            if grant.namespace != namespace {
                return true;
            }
            grant.resources.retain(|token| token != resource);
            grant.verbs.retain(|token| token != verb);
            !grant.resources.is_empty() || !grant.verbs.is_empty()
        });
    }
}
