//! bcrypt password hashing.
//!
//! Hashing at the default cost takes hundreds of milliseconds; async callers
//! should run these on a blocking thread.

use crate::errors::{AuthError, Result};

/// Cost factor used when none is configured.
pub const DEFAULT_PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash `password` with a fresh salt at `cost`.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(AuthError::Hash)
}

/// Check `password` against a stored bcrypt hash.
///
/// A mismatch is `Ok(false)`; an unreadable hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).map_err(AuthError::Hash)
}
