//! Account registration and session handling.
//!
//! # Responsibility
//! - Register accounts with hashed credentials.
//! - Verify credentials and persist the active session id.
//!
//! # Invariants
//! - Usernames are unique (case-sensitive exact match).
//! - Only `login`/`logout` mutate the session; reads hit persisted settings
//!   every time.
//! - Registration never changes the session state.

mod password;

pub use password::{hash_password, verify_password};

use crate::error::ErrorKind;
use crate::model::user::UserAccount;
use crate::model::validation::ValidationError;
use crate::settings::{KeyValueStore, SettingsError};
use crate::store::{ObjectStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Settings key holding the logged-in account id.
pub const SESSION_KEY: &str = "currentUserID";

/// Errors from authentication use-cases.
#[derive(Debug)]
pub enum AuthError {
    UserNotFound(String),
    BadCredentials,
    NoActiveSession,
    /// The session user does not own the record being modified.
    NotOwner { record_id: String },
    Validation(ValidationError),
    Store(StoreError),
    Settings(SettingsError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_)
            | Self::BadCredentials
            | Self::NoActiveSession
            | Self::NotOwner { .. } => ErrorKind::Authentication,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Store(err) => err.kind(),
            Self::Settings(err) => err.kind(),
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(username) => write!(f, "user not found: {username}"),
            Self::BadCredentials => write!(f, "bad credentials"),
            Self::NoActiveSession => write!(f, "no active session"),
            Self::NotOwner { record_id } => {
                write!(f, "current user does not own record {record_id}")
            }
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Settings(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

impl From<SettingsError> for AuthError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

/// Observable authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn(String),
}

/// Source of the active owner identity.
pub trait SessionProvider {
    /// Returns the logged-in account id, if any.
    fn current_user_id(&self) -> Result<Option<String>, AuthError>;

    /// Returns the logged-in account id or `NoActiveSession`.
    fn require_user_id(&self) -> Result<String, AuthError> {
        self.current_user_id()?.ok_or(AuthError::NoActiveSession)
    }
}

/// Authentication service over the object store and session settings.
pub struct AuthService<'s, K: KeyValueStore> {
    store: &'s ObjectStore,
    settings: K,
}

impl<'s, K: KeyValueStore> AuthService<'s, K> {
    pub fn new(store: &'s ObjectStore, settings: K) -> Self {
        Self { store, settings }
    }

    /// Creates an account. Does not log the new account in.
    ///
    /// # Errors
    /// - `Validation(DuplicateUsername)` when `username` is taken.
    /// - `Validation(MissingField)` for an empty username or password.
    pub fn register(&self, username: &str, password: &str) -> Result<UserAccount, AuthError> {
        if password.is_empty() {
            return Err(AuthError::Validation(ValidationError::MissingField {
                record: "user_account",
                field: "password",
            }));
        }
        let account = UserAccount::new(username, hash_password(password));

        let result = self.store.write(|txn| {
            if txn.find_user_by_username(username)?.is_some() {
                return Err(StoreError::Validation(ValidationError::DuplicateUsername(
                    username.to_string(),
                )));
            }
            txn.upsert(&account)
        });
        if let Err(err) = result {
            warn!(
                "event=auth_register module=auth status=error error_kind={}",
                err.kind()
            );
            return Err(err.into());
        }

        info!(
            "event=auth_register module=auth status=ok user_id={}",
            account.id
        );
        Ok(account)
    }

    /// Verifies credentials and persists the session on success.
    pub fn login(&self, username: &str, password: &str) -> Result<UserAccount, AuthError> {
        let Some(account) = self.store.find_user_by_username(username)? else {
            warn!("event=auth_login module=auth status=error error_code=user_not_found");
            return Err(AuthError::UserNotFound(username.to_string()));
        };
        if !verify_password(password, &account.password_hash) {
            warn!(
                "event=auth_login module=auth status=error error_code=bad_credentials user_id={}",
                account.id
            );
            return Err(AuthError::BadCredentials);
        }

        self.settings.set(SESSION_KEY, &account.id)?;
        info!(
            "event=auth_login module=auth status=ok user_id={}",
            account.id
        );
        Ok(account)
    }

    /// Clears the persisted session.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.settings.remove(SESSION_KEY)?;
        info!("event=auth_logout module=auth status=ok");
        Ok(())
    }

    /// Returns the logged-in account, or `None` when logged out or when the
    /// persisted id no longer matches an account.
    pub fn current_user(&self) -> Result<Option<UserAccount>, AuthError> {
        let Some(user_id) = self.settings.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match self.store.get::<UserAccount>(&user_id) {
            Ok(account) => Ok(Some(account)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn is_logged_in(&self) -> Result<bool, AuthError> {
        Ok(self.current_user()?.is_some())
    }

    pub fn state(&self) -> Result<SessionState, AuthError> {
        Ok(match self.current_user()? {
            Some(account) => SessionState::LoggedIn(account.id),
            None => SessionState::LoggedOut,
        })
    }
}

impl<K: KeyValueStore> SessionProvider for AuthService<'_, K> {
    fn current_user_id(&self) -> Result<Option<String>, AuthError> {
        Ok(self.current_user()?.map(|account| account.id))
    }
}
