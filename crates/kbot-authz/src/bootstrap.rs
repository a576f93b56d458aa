//! Break-glass principals that bypass the grant model entirely.

use crate::principal::PrincipalId;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid bootstrap principal id {0:?}")]
pub struct BootstrapParseError(String);

/// Fixed set of bootstrap principals supplied at process start.
///
/// Membership grants every request unconditionally and counts as
/// admin-equivalent wherever role is consulted. The set is an immutable
/// value injected into the engine at construction, so tests can build a
/// distinct authority per scenario.
#[derive(Debug, Clone, Default)]
pub struct BootstrapAuthority {
    principals: HashSet<PrincipalId>,
}

impl BootstrapAuthority {
    pub fn new(principals: impl IntoIterator<Item = PrincipalId>) -> Self {
        Self {
            principals: principals.into_iter().collect(),
        }
    }

    /// Parse the comma-separated ID list format used by deployment
    /// configuration, e.g. `"123456, 789012"`.
    ///
    /// Whitespace around items is trimmed and blank items are skipped. An
    /// empty result is legal; requiring at least one bootstrap principal is
    /// the embedder's configuration policy, not this library's.
    ///
    /// # Errors
    /// - [`BootstrapParseError`] when an item is not a decimal 64-bit ID.
    pub fn from_csv(raw: &str) -> Result<Self, BootstrapParseError> {
        let mut principals = HashSet::new();
        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let id: i64 = item
                .parse()
                .map_err(|_| BootstrapParseError(item.to_string()))?;
            principals.insert(PrincipalId::new(id));
        }
        Ok(Self { principals })
    }

    pub fn contains(&self, principal: PrincipalId) -> bool {
        self.principals.contains(&principal)
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}
