//! Registration and login.
//!
//! Both calls hash or check a bcrypt password and are CPU-bound; run them on
//! a blocking thread from async code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AccountError;
use crate::password::{hash_password, verify_password};
use crate::token::TokenIssuer;
use crate::users::{NewUser, PublicUser, UserStore, UserStoreError};

/// Body of a registration request.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password; hashed before it is stored.
    pub password: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Organization, if any.
    #[serde(default)]
    pub organization_id: Option<String>,
}

/// Body of a login request.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// A session token plus the account it was issued for.
#[derive(Clone, Debug, Serialize)]
pub struct AuthResponse {
    /// Signed session token.
    pub token: String,
    /// The account.
    pub user: PublicUser,
}

/// Account operations over a [`UserStore`].
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn UserStore>,
    issuer: Arc<TokenIssuer>,
    password_cost: u32,
}

impl fmt::Debug for Accounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accounts")
            .field("password_cost", &self.password_cost)
            .finish_non_exhaustive()
    }
}

impl Accounts {
    /// Create account operations hashing passwords at `password_cost`.
    pub fn new(store: Arc<dyn UserStore>, issuer: Arc<TokenIssuer>, password_cost: u32) -> Self {
        Self {
            store,
            issuer,
            password_cost,
        }
    }

    /// The issuer that signs session tokens.
    pub fn issuer(&self) -> &Arc<TokenIssuer> {
        &self.issuer
    }

    /// Create an account and sign a token for it.
    pub fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AccountError> {
        if req.email.is_empty() || req.password.is_empty() {
            return Err(AccountError::MissingCredentials);
        }
        if self.store.find_by_email(&req.email)?.is_some() {
            debug!(email = %req.email, "registration for existing email");
            return Err(AccountError::UserExists);
        }

        let password_hash = hash_password(&req.password, self.password_cost)?;
        let user = self
            .store
            .create(NewUser {
                email: req.email,
                name: req.name,
                organization_id: req.organization_id,
                password_hash,
            })
            .map_err(|e| match e {
                UserStoreError::Duplicate(_) => AccountError::UserExists,
                other => AccountError::Store(other),
            })?;

        let token = self.issuer.issue(&user.id)?;
        info!(user_id = %user.id, "registered user");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }

    /// Check credentials and sign a token.
    ///
    /// An unknown email and a wrong password are indistinguishable to the caller.
    pub fn login(&self, req: LoginRequest) -> Result<AuthResponse, AccountError> {
        let Some(user) = self.store.find_by_email(&req.email)? else {
            debug!(email = %req.email, "login for unknown email");
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(&req.password, &user.password_hash)? {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.issuer.issue(&user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        })
    }
}
