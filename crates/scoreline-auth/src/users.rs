//! User accounts and the store that persists them.
//!
//! Storage is a collaborator: the server is handed an `Arc<dyn UserStore>`.
//! [`InMemoryUserStore`] keeps accounts for the life of the process.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

/// A stored account.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    /// Stable account ID.
    pub id: String,
    /// Login email; unique across the store.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Organization the account belongs to, if any.
    pub organization_id: Option<String>,
    /// bcrypt hash of the password.
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("organization_id", &self.organization_id)
            .finish_non_exhaustive()
    }
}

/// Fields for a new account; the store assigns the ID.
#[derive(Clone, Debug)]
pub struct NewUser {
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Organization, if any.
    pub organization_id: Option<String>,
    /// bcrypt hash of the password.
    pub password_hash: String,
}

/// The part of a [`User`] returned to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    /// Account ID.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Errors raised by a [`UserStore`].
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    /// An account with this email already exists.
    #[error("user already exists: {0}")]
    Duplicate(String),

    /// The backing store failed.
    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Account persistence.
pub trait UserStore: Send + Sync {
    /// Look up an account by exact email.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    /// Create an account. Fails with [`UserStoreError::Duplicate`] if the
    /// email is taken.
    fn create(&self, user: NewUser) -> Result<User, UserStoreError>;
}

/// Process-local [`UserStore`], keyed by email.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether the store holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        Ok(self.users.read().get(email).cloned())
    }

    fn create(&self, user: NewUser) -> Result<User, UserStoreError> {
        let mut users = self.users.write();
        if users.contains_key(&user.email) {
            return Err(UserStoreError::Duplicate(user.email));
        }
        let stored = User {
            id: Uuid::now_v7().to_string(),
            email: user.email,
            name: user.name,
            organization_id: user.organization_id,
            password_hash: user.password_hash,
        };
        let _ = users.insert(stored.email.clone(), stored.clone());
        Ok(stored)
    }
}
