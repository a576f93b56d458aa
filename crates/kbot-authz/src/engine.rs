//! The authorization decision procedure.
//!
//! # Purpose
//! Answers "may this principal perform this verb on this resource in this
//! namespace" by consulting, in order: the bootstrap authority, the
//! principal's role, and each grant entry. Selector-scoped entries pull the
//! instance's live labels through the resolver.
//!
//! # Key invariants
//! - Evaluation order is fixed: bootstrap, record load, admin role, grant
//!   scan. The first definitive answer wins.
//! - The scan stops at the first structurally matching entry. If that
//!   entry's selector rejects the instance the request is denied outright,
//!   even when a later entry without a selector would have allowed it, so
//!   grant order is observable. Kept as-is from the reference behavior; an
//!   open question for product owners, not something to fix silently here.
//! - Failures never become decisions: a store or directory error aborts the
//!   check instead of denying (or worse, allowing).
//!
//! # Concurrency
//! The engine is stateless between calls and caches nothing; every check
//! reads the store fresh, so a revocation is effective on the next request.

use crate::bootstrap::BootstrapAuthority;
use crate::directory::ResourceDirectory;
use crate::error::AuthzResult;
use crate::principal::PrincipalId;
use crate::record::WILDCARD;
use crate::resolver::SelectorResolver;
use crate::store::{PermissionStore, StoreError};
use std::sync::Arc;

/// Namespace assumed when the caller does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Trim a caller-supplied namespace, falling back to [`DEFAULT_NAMESPACE`].
pub fn normalize_namespace(namespace: &str) -> String {
    let trimmed = namespace.trim();
    if trimmed.is_empty() {
        DEFAULT_NAMESPACE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One authorization question. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub principal: PrincipalId,
    pub namespace: String,
    pub resource: String,
    pub verb: String,
    /// Name of the specific instance acted on, when the command names one.
    pub instance: Option<String>,
    /// Selector supplied with list-style commands. Carried for the caller's
    /// own use; authorization is driven by grant selectors, never this.
    pub selector: Option<String>,
}

impl AccessRequest {
    pub fn new(
        principal: impl Into<PrincipalId>,
        namespace: &str,
        resource: impl Into<String>,
        verb: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            namespace: normalize_namespace(namespace),
            resource: resource.into(),
            verb: verb.into(),
            instance: None,
            selector: None,
        }
    }

    pub fn with_instance(mut self, name: impl Into<String>) -> Self {
        self.instance = Some(name.into());
        self
    }

    pub fn with_selector(mut self, expr: impl Into<String>) -> Self {
        self.selector = Some(expr.into());
        self
    }
}

/// Outcome of an authorization check.
///
/// A denial is a definitive answer, not a failure. `source` carries the
/// underlying store error for the no-record case so callers can log the
/// difference between "no record" and a plain refusal.
#[derive(Debug)]
pub enum Decision {
    Allowed,
    Denied {
        reason: String,
        source: Option<StoreError>,
    },
}

impl Decision {
    fn deny(reason: impl Into<String>) -> Self {
        Decision::Denied {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::Allowed => None,
            Decision::Denied { reason, .. } => Some(reason),
        }
    }
}

/// Authorization engine over the injected collaborators.
#[derive(Clone)]
pub struct Engine {
    bootstrap: BootstrapAuthority,
    store: Arc<dyn PermissionStore>,
    directory: Arc<dyn ResourceDirectory>,
    resolver: SelectorResolver,
}

impl Engine {
    pub fn new(
        bootstrap: BootstrapAuthority,
        store: Arc<dyn PermissionStore>,
        directory: Arc<dyn ResourceDirectory>,
    ) -> Self {
        let resolver = SelectorResolver::new(directory.clone());
        Self {
            bootstrap,
            store,
            directory,
            resolver,
        }
    }

    /// Decide an authorization request.
    ///
    /// # Errors
    /// Store, directory, and selector failures propagate; only a definitive
    /// semantic answer comes back as [`Decision`].
    pub async fn authorize(&self, request: &AccessRequest) -> AuthzResult<Decision> {
        let decision = self.evaluate(request).await?;
        match &decision {
            Decision::Allowed => {
                metrics::counter!("kbot_authz_decisions_total", "decision" => "allow")
                    .increment(1);
                tracing::debug!(
                    principal = %request.principal,
                    namespace = %request.namespace,
                    resource = %request.resource,
                    verb = %request.verb,
                    "authorization allowed"
                );
            }
            Decision::Denied { reason, .. } => {
                metrics::counter!("kbot_authz_decisions_total", "decision" => "deny")
                    .increment(1);
                tracing::debug!(
                    principal = %request.principal,
                    namespace = %request.namespace,
                    resource = %request.resource,
                    verb = %request.verb,
                    reason = %reason,
                    "authorization denied"
                );
            }
        }
        Ok(decision)
    }

    async fn evaluate(&self, request: &AccessRequest) -> AuthzResult<Decision> {
        if self.bootstrap.contains(request.principal) {
            return Ok(Decision::Allowed);
        }

        let record = match self.store.load(&request.principal.record_key()).await {
            Ok(record) => record,
            Err(err @ StoreError::NotFound(_)) => {
                return Ok(Decision::Denied {
                    reason: format!("no permissions found for principal {}", request.principal),
                    source: Some(err),
                });
            }
            Err(err) => return Err(err.into()),
        };

        if record.is_admin() {
            return Ok(Decision::Allowed);
        }

        for grant in &record.grants {
            if !grant.covers_namespace(&request.namespace) {
                continue;
            }
            if !grant.covers_resource(&request.resource) {
                continue;
            }
            if !grant.covers_verb(&request.verb) {
                continue;
            }
            if !grant.selector.is_empty() {
                if let Some(name) = request.instance.as_deref() {
                    let matched = self
                        .resolver
                        .matches(&request.resource, &request.namespace, name, &grant.selector)
                        .await?;
                    if !matched {
                        // Hard deny: the scan does not continue past a
                        // structurally matching entry whose selector fails.
                        return Ok(Decision::deny(format!(
                            "resource '{name}' does not match required selector: {}",
                            grant.selector
                        )));
                    }
                }
            }
            return Ok(Decision::Allowed);
        }

        Ok(Decision::deny(format!(
            "missing '{}' access to {} in namespace '{}'",
            request.verb, request.resource, request.namespace
        )))
    }

    /// Namespaces the principal may see.
    ///
    /// Bootstrap and admin principals see everything the directory knows
    /// right now. A wildcard grant short-circuits to the same full listing;
    /// otherwise the distinct grant namespaces come back in encounter order.
    ///
    /// # Errors
    /// A missing record propagates as a store error; it is not collapsed
    /// into an empty list.
    pub async fn visible_namespaces(&self, principal: PrincipalId) -> AuthzResult<Vec<String>> {
        if self.bootstrap.contains(principal) {
            return Ok(self.directory.list_namespaces().await?);
        }

        let record = self.store.load(&principal.record_key()).await?;
        if record.is_admin() {
            return Ok(self.directory.list_namespaces().await?);
        }

        let mut namespaces: Vec<String> = Vec::new();
        for grant in &record.grants {
            if grant.namespace == WILDCARD {
                return Ok(self.directory.list_namespaces().await?);
            }
            if !namespaces.contains(&grant.namespace) {
                namespaces.push(grant.namespace.clone());
            }
        }
        Ok(namespaces)
    }
}
