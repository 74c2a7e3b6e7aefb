//! # scoreline-auth
//!
//! Accounts and session tokens for the scoreline HTTP surface.
//!
//! - [`Accounts`]: registration and login over an injected [`UserStore`]
//! - [`hash_password`] / [`verify_password`]: bcrypt at a configurable cost
//! - [`TokenIssuer`]: HS256 JWTs carrying the `userId` claim
//! - [`bearer_token`]: extracts the token from an `Authorization` header value
//!
//! Tokens are signed with the configured secret and expire after the configured
//! lifetime (24 hours by default).

#![deny(unsafe_code)]

pub mod accounts;
pub mod bearer;
pub mod errors;
pub mod password;
pub mod token;
pub mod users;

pub use accounts::{Accounts, AuthResponse, LoginRequest, RegisterRequest};
pub use bearer::bearer_token;
pub use errors::{AccountError, AuthError, Result};
pub use password::{DEFAULT_PASSWORD_COST, hash_password, verify_password};
pub use token::{Claims, TokenIssuer};
pub use users::{InMemoryUserStore, NewUser, PublicUser, User, UserStore, UserStoreError};
