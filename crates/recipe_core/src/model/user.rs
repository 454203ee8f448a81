//! User account record.
//!
//! # Invariants
//! - `username` is unique across accounts (case-sensitive exact match).
//! - `password_hash` is a one-way digest; the clear-text password is never stored.

use crate::model::validation::{require_field, ValidationError};
use uuid::Uuid;

/// Registered account able to own recipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub password_hash: String,
}

impl UserAccount {
    /// Creates an account with a generated stable ID.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Checks required fields before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("user_account", "id", &self.id)?;
        require_field("user_account", "username", &self.username)?;
        require_field("user_account", "password_hash", &self.password_hash)
    }
}
