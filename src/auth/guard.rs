//! Ownership checks for mutating endpoints.
//!
//! The only access-control relationship in the API: a caller may change a
//! resource only when their id equals the resource's owning user id. Read
//! endpoints need no caller identity and never consult the guard.

use tracing::warn;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

pub fn authorize(caller: Option<i64>, owner: i64) -> Access {
    match caller {
        Some(id) if id == owner => Access::Allow,
        _ => Access::Deny,
    }
}

/// Authorizes an authenticated caller; `Deny` becomes a 401.
pub fn ensure_owner(caller: i64, owner: i64) -> Result<(), ApiError> {
    match authorize(Some(caller), owner) {
        Access::Allow => Ok(()),
        Access::Deny => {
            warn!(caller, owner, "ownership check denied");
            Err(ApiError::unauthorized())
        }
    }
}
