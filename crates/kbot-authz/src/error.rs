use crate::directory::DirectoryError;
use crate::resolver::SelectorError;
use crate::store::StoreError;
use thiserror::Error;

/// Failures surfaced by authorization and grant-management flows.
///
/// A semantic denial is never represented here; it travels as
/// [`Decision::Denied`](crate::engine::Decision) with a human-readable
/// reason. Everything in this enum aborts the operation instead, so a
/// transport failure can never be mistaken for a deny, and the engine can
/// never fail open.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid permission record key: {0}")]
    InvalidRecordKey(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
