//! Principal identity and the permission record key scheme.
//!
//! # Purpose
//! Wraps the numeric operator ID asserted by the chat transport and owns the
//! deterministic mapping between principals and permission store keys.
//!
//! # Key invariants
//! - `record_key` and `from_record_key` are exact inverses.
//! - Keys are `"user-"` followed by the decimal ID, nothing else.

use crate::error::AuthzError;
use serde::{Deserialize, Serialize};

/// Prefix of every permission record key.
pub const RECORD_KEY_PREFIX: &str = "user-";

/// Numeric identity of an external operator.
///
/// The transport authenticates the operator; this core only needs identity
/// equality and the record key derived from the ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(i64);

impl PrincipalId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Deterministic permission store key for this principal.
    pub fn record_key(self) -> String {
        format!("{RECORD_KEY_PREFIX}{}", self.0)
    }

    /// Recover the principal from a record key produced by [`record_key`].
    ///
    /// # Errors
    /// - [`AuthzError::InvalidRecordKey`] when the prefix or the decimal ID
    ///   is missing or malformed.
    ///
    /// [`record_key`]: PrincipalId::record_key
    pub fn from_record_key(key: &str) -> Result<Self, AuthzError> {
        key.strip_prefix(RECORD_KEY_PREFIX)
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(Self)
            .ok_or_else(|| AuthzError::InvalidRecordKey(key.to_string()))
    }
}

impl From<i64> for PrincipalId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_round_trip() {
        let principal = PrincipalId::new(123_456_789);
        let key = principal.record_key();
        assert_eq!(key, "user-123456789");
        let parsed = PrincipalId::from_record_key(&key).expect("parse key");
        assert_eq!(parsed, principal);
    }

    #[test]
    fn rejects_malformed_keys() {
        for key in ["", "user-", "user-abc", "operator-5", "123"] {
            let err = PrincipalId::from_record_key(key).expect_err("malformed key");
            assert!(matches!(err, AuthzError::InvalidRecordKey(_)));
        }
    }

    #[test]
    fn serde_is_transparent() {
        let principal = PrincipalId::new(42);
        let json = serde_json::to_string(&principal).expect("serialize");
        assert_eq!(json, "42");
        let parsed: PrincipalId = serde_json::from_str("42").expect("deserialize");
        assert_eq!(parsed, principal);
    }
}
