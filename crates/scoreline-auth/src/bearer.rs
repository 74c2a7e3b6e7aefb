//! `Authorization: Bearer <token>` parsing.

use crate::errors::{AuthError, Result};

const SCHEME: &str = "Bearer";

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Result<&str> {
    let header = header.trim();
    if header.is_empty() {
        return Err(AuthError::MissingToken);
    }
    let rest = header
        .strip_prefix(SCHEME)
        .ok_or(AuthError::MalformedHeader)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(AuthError::MalformedHeader);
    }
    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
