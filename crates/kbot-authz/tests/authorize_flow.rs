//! End-to-end authorization flows over the in-memory backends.

use kbot_authz::{
    AccessRequest, AuthzError, BootstrapAuthority, Decision, Engine, InMemoryDirectory,
    InMemoryPermissionStore, LabelSet, PermissionManager, PermissionRecord, PrincipalId,
    PermissionStore, Role, StoreError, StoreResult,
};
use std::sync::Arc;

struct Harness {
    engine: Engine,
    manager: PermissionManager,
    store: Arc<InMemoryPermissionStore>,
    directory: Arc<InMemoryDirectory>,
}

fn harness_with_bootstrap(ids: &[i64]) -> Harness {
    let store = Arc::new(InMemoryPermissionStore::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let engine = Engine::new(
        BootstrapAuthority::new(ids.iter().copied().map(PrincipalId::new)),
        store.clone(),
        directory.clone(),
    );
    let manager = PermissionManager::new(store.clone());
    Harness {
        engine,
        manager,
        store,
        directory,
    }
}

fn harness() -> Harness {
    harness_with_bootstrap(&[])
}

fn labels(pairs: &[(&str, &str)]) -> LabelSet {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Store stand-in that fails every call, to prove a path never reaches it.
struct UnreachableStore;

#[async_trait::async_trait]
impl PermissionStore for UnreachableStore {
    async fn load(&self, key: &str) -> StoreResult<PermissionRecord> {
        Err(StoreError::Unexpected(anyhow::anyhow!(
            "permission store consulted for {key}"
        )))
    }

    async fn save(&self, _record: &PermissionRecord) -> StoreResult<PermissionRecord> {
        Err(StoreError::Unexpected(anyhow::anyhow!(
            "permission store consulted"
        )))
    }
}

#[tokio::test]
async fn bootstrap_principal_is_allowed_without_consulting_the_store() {
    let directory = Arc::new(InMemoryDirectory::new());
    let engine = Engine::new(
        BootstrapAuthority::new([PrincipalId::new(1)]),
        Arc::new(UnreachableStore),
        directory,
    );

    for (namespace, resource, verb) in [
        ("production", "pods", "logs"),
        ("staging", "deployments", "restart"),
        ("default", "services", "list"),
    ] {
        let decision = engine
            .authorize(&AccessRequest::new(1, namespace, resource, verb))
            .await
            .expect("authorize");
        assert!(decision.is_allowed(), "{namespace}/{resource}/{verb}");
    }
}

#[tokio::test]
async fn admin_role_allows_any_request() {
    let h = harness();
    let principal = PrincipalId::new(10);

    // Role edits happen outside grant/revoke (an operator applies the
    // record directly), so write through the store.
    let mut record = PermissionRecord::new(principal);
    record.role = Role::Admin;
    h.store.save(&record).await.expect("save admin record");

    for (namespace, resource, verb) in [
        ("anywhere", "deployments", "rollback"),
        ("production", "pods", "logs"),
        ("staging", "services", "list"),
    ] {
        let decision = h
            .engine
            .authorize(&AccessRequest::new(10, namespace, resource, verb))
            .await
            .expect("authorize");
        assert!(decision.is_allowed(), "{namespace}/{resource}/{verb}");
    }
}

#[tokio::test]
async fn missing_record_denies_and_surfaces_not_found() {
    let h = harness();

    let decision = h
        .engine
        .authorize(&AccessRequest::new(404, "production", "pods", "logs"))
        .await
        .expect("authorize");

    match decision {
        Decision::Denied { reason, source } => {
            assert_eq!(reason, "no permissions found for principal 404");
            assert!(matches!(source, Some(StoreError::NotFound(_))));
        }
        Decision::Allowed => panic!("expected deny"),
    }
}

#[tokio::test]
async fn store_failure_is_an_error_not_a_decision() {
    let engine = Engine::new(
        BootstrapAuthority::default(),
        Arc::new(UnreachableStore),
        Arc::new(InMemoryDirectory::new()),
    );

    let err = engine
        .authorize(&AccessRequest::new(5, "production", "pods", "logs"))
        .await
        .expect_err("store failure");
    assert!(matches!(err, AuthzError::Store(StoreError::Unexpected(_))));
}

#[tokio::test]
async fn grant_then_authorize_is_scoped_to_the_granted_namespace() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "production", "pods", "logs", "")
        .await
        .expect("grant");

    let allowed = h
        .engine
        .authorize(&AccessRequest::new(42, "production", "pods", "logs"))
        .await
        .expect("authorize");
    assert!(allowed.is_allowed());

    let denied = h
        .engine
        .authorize(&AccessRequest::new(42, "staging", "pods", "logs"))
        .await
        .expect("authorize");
    assert_eq!(
        denied.reason(),
        Some("missing 'logs' access to pods in namespace 'staging'")
    );
}

#[tokio::test]
async fn repeated_grants_to_one_scope_merge_instead_of_duplicating() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "production", "pods", "get", "")
        .await
        .expect("grant");
    let record = h
        .manager
        .grant(principal, "production", "pods", "logs", "")
        .await
        .expect("grant");

    assert_eq!(record.grants.len(), 1);
    assert_eq!(record.grants[0].verbs, vec!["get", "logs"]);
}

#[tokio::test]
async fn revoke_removes_exactly_the_targeted_pair() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "production", "pods", "get", "")
        .await
        .expect("grant");
    h.manager
        .grant(principal, "production", "deployments", "get", "")
        .await
        .expect("grant");
    h.manager
        .grant(principal, "production", "pods", "list", "")
        .await
        .expect("grant");

    let record = h
        .manager
        .revoke(principal, "production", "pods", "get")
        .await
        .expect("revoke");
    assert_eq!(record.grants.len(), 1);
    assert_eq!(record.grants[0].resources, vec!["deployments"]);
    assert_eq!(record.grants[0].verbs, vec!["list"]);

    // Deployments keep "list"; the revoked pair is gone wholesale.
    let allowed = h
        .engine
        .authorize(&AccessRequest::new(42, "production", "deployments", "list"))
        .await
        .expect("authorize");
    assert!(allowed.is_allowed());

    let denied = h
        .engine
        .authorize(&AccessRequest::new(42, "production", "deployments", "get"))
        .await
        .expect("authorize");
    assert!(!denied.is_allowed());
}

#[tokio::test]
async fn revoke_that_empties_both_sets_drops_the_entry() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "production", "pods", "get", "")
        .await
        .expect("grant");
    let record = h
        .manager
        .revoke(principal, "production", "pods", "get")
        .await
        .expect("revoke");

    assert!(record.grants.is_empty());
}

#[tokio::test]
async fn wildcard_namespace_grant_authorizes_every_namespace() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "*", "pods", "list", "")
        .await
        .expect("grant");

    for namespace in ["production", "staging", "default"] {
        let decision = h
            .engine
            .authorize(&AccessRequest::new(42, namespace, "pods", "list"))
            .await
            .expect("authorize");
        assert!(decision.is_allowed(), "namespace {namespace}");
    }
}

#[tokio::test]
async fn selector_scoped_grant_follows_live_labels() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.directory
        .put_resource(
            "pods",
            "production",
            "frontend-1",
            labels(&[("app", "frontend")]),
        )
        .await;
    h.directory
        .put_resource(
            "pods",
            "production",
            "backend-1",
            labels(&[("app", "backend")]),
        )
        .await;
    h.manager
        .grant(principal, "production", "pods", "logs", "app=frontend")
        .await
        .expect("grant");

    let allowed = h
        .engine
        .authorize(
            &AccessRequest::new(42, "production", "pods", "logs").with_instance("frontend-1"),
        )
        .await
        .expect("authorize");
    assert!(allowed.is_allowed());

    let denied = h
        .engine
        .authorize(
            &AccessRequest::new(42, "production", "pods", "logs").with_instance("backend-1"),
        )
        .await
        .expect("authorize");
    assert_eq!(
        denied.reason(),
        Some("resource 'backend-1' does not match required selector: app=frontend")
    );
}

#[tokio::test]
async fn selector_is_skipped_when_no_instance_is_named() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "production", "pods", "list", "app=frontend")
        .await
        .expect("grant");

    // List-style request without an instance name: the selector-scoped
    // grant still applies.
    let decision = h
        .engine
        .authorize(&AccessRequest::new(42, "production", "pods", "list"))
        .await
        .expect("authorize");
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn services_bypass_selector_enforcement() {
    let h = harness();
    let principal = PrincipalId::new(42);

    // No service instance registered anywhere; the check must still pass.
    h.manager
        .grant(principal, "production", "services", "get", "app=frontend")
        .await
        .expect("grant");

    let decision = h
        .engine
        .authorize(
            &AccessRequest::new(42, "production", "services", "get").with_instance("frontend"),
        )
        .await
        .expect("authorize");
    assert!(decision.is_allowed());
}

#[tokio::test]
async fn selector_failure_on_first_matching_grant_is_a_hard_deny() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.directory
        .put_resource(
            "pods",
            "production",
            "backend-1",
            labels(&[("app", "backend")]),
        )
        .await;

    // Selector-scoped entry first, unscoped entry second. The scan stops at
    // the first structural match, so the later unscoped entry never rescues
    // the request. Documented behavior; grant order is observable.
    h.manager
        .grant(principal, "production", "pods", "logs", "app=frontend")
        .await
        .expect("grant");
    h.manager
        .grant(principal, "production", "pods", "logs", "")
        .await
        .expect("grant");

    let decision = h
        .engine
        .authorize(
            &AccessRequest::new(42, "production", "pods", "logs").with_instance("backend-1"),
        )
        .await
        .expect("authorize");
    assert!(!decision.is_allowed());
}

#[tokio::test]
async fn missing_instance_during_selector_check_is_an_error() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "production", "pods", "logs", "app=frontend")
        .await
        .expect("grant");

    let err = h
        .engine
        .authorize(&AccessRequest::new(42, "production", "pods", "logs").with_instance("ghost"))
        .await
        .expect_err("missing instance");
    assert!(matches!(err, AuthzError::Selector(_)));
}

#[tokio::test]
async fn malformed_grant_selector_aborts_instead_of_failing_open() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.directory
        .put_resource("pods", "production", "web-1", labels(&[("app", "web")]))
        .await;
    h.manager
        .grant(principal, "production", "pods", "logs", "app=")
        .await
        .expect("grant");

    let err = h
        .engine
        .authorize(&AccessRequest::new(42, "production", "pods", "logs").with_instance("web-1"))
        .await
        .expect_err("malformed selector");
    assert!(matches!(err, AuthzError::Selector(_)));
}

#[tokio::test]
async fn visible_namespaces_follow_grants_in_encounter_order() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.manager
        .grant(principal, "staging", "pods", "get", "")
        .await
        .expect("grant");
    h.manager
        .grant(principal, "production", "pods", "get", "")
        .await
        .expect("grant");
    h.manager
        .grant(principal, "staging", "deployments", "get", "app=web")
        .await
        .expect("grant");

    let visible = h
        .engine
        .visible_namespaces(principal)
        .await
        .expect("visible");
    assert_eq!(visible, vec!["staging", "production"]);
}

#[tokio::test]
async fn wildcard_grant_sees_namespaces_added_after_the_grant() {
    let h = harness();
    let principal = PrincipalId::new(42);

    h.directory.add_namespace("production").await;
    h.manager
        .grant(principal, "*", "pods", "list", "")
        .await
        .expect("grant");

    let before = h
        .engine
        .visible_namespaces(principal)
        .await
        .expect("visible");
    assert_eq!(before, vec!["production"]);

    h.directory.add_namespace("staging").await;
    let after = h
        .engine
        .visible_namespaces(principal)
        .await
        .expect("visible");
    assert_eq!(after, vec!["production", "staging"]);
}

#[tokio::test]
async fn bootstrap_principal_sees_every_namespace() {
    let h = harness_with_bootstrap(&[1]);
    h.directory.add_namespace("production").await;
    h.directory.add_namespace("staging").await;

    let visible = h
        .engine
        .visible_namespaces(PrincipalId::new(1))
        .await
        .expect("visible");
    assert_eq!(visible, vec!["production", "staging"]);
}

#[tokio::test]
async fn visibility_for_unknown_principal_is_an_error() {
    let h = harness();
    let err = h
        .engine
        .visible_namespaces(PrincipalId::new(404))
        .await
        .expect_err("no record");
    assert!(matches!(err, AuthzError::Store(StoreError::NotFound(_))));
}
