//! Auth error types.

use crate::users::UserStoreError;

/// Errors that can occur while issuing or checking session tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header, or an empty token.
    #[error("missing bearer token")]
    MissingToken,

    /// The header was present but not of the form `Bearer <token>`.
    #[error("malformed authorization header")]
    MalformedHeader,

    /// The token's `exp` claim is in the past.
    #[error("token expired")]
    Expired,

    /// Bad signature, wrong algorithm or unparsable token.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    /// Signing a new token failed.
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// Hashing or checking a password failed.
    #[error("password hashing failed: {0}")]
    Hash(#[source] bcrypt::BcryptError),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(err),
        }
    }
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors from registering or logging in.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Registration with an email that is already taken.
    #[error("user already exists")]
    UserExists,

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration without an email or password.
    #[error("email and password are required")]
    MissingCredentials,

    /// The user store failed.
    #[error(transparent)]
    Store(#[from] UserStoreError),

    /// Hashing or token signing failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl AccountError {
    /// Whether the failure is the caller's fault rather than the server's.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UserExists | Self::InvalidCredentials | Self::MissingCredentials
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
