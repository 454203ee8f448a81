//! Explicitly constructed core context.
//!
//! # Responsibility
//! - Own the object store and the session settings for one application.
//! - Hand out borrowing services instead of process-wide singletons.

use crate::auth::{AuthError, AuthService, SessionProvider};
use crate::config::{ConfigError, CoreConfig};
use crate::import::SeedImporter;
use crate::query::QueryEngine;
use crate::service::recipe_service::RecipeService;
use crate::settings::{JsonFileStore, KeyValueStore};
use crate::store::{ObjectStore, StoreError};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum OpenError {
    Config(ConfigError),
    Store(StoreError),
}

impl Display for OpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ConfigError> for OpenError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<StoreError> for OpenError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Store plus session settings, passed to consumers explicitly.
pub struct RecipeCore<K: KeyValueStore = JsonFileStore> {
    store: ObjectStore,
    settings: K,
}

impl RecipeCore<JsonFileStore> {
    /// Opens the on-disk store and session file described by `config`.
    pub fn open(config: &CoreConfig) -> Result<Self, OpenError> {
        config.prepare_data_dir()?;
        let store = ObjectStore::open(config.db_path())?;
        Ok(Self::from_parts(
            store,
            JsonFileStore::new(config.settings_path()),
        ))
    }
}

impl<K: KeyValueStore> RecipeCore<K> {
    pub fn from_parts(store: ObjectStore, settings: K) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn auth(&self) -> AuthService<'_, &K> {
        AuthService::new(&self.store, &self.settings)
    }

    pub fn importer(&self) -> SeedImporter<'_> {
        SeedImporter::new(&self.store)
    }

    pub fn queries(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.store)
    }

    pub fn recipes(&self) -> RecipeService<'_, Self> {
        RecipeService::new(&self.store, self)
    }
}

impl<K: KeyValueStore> SessionProvider for RecipeCore<K> {
    fn current_user_id(&self) -> Result<Option<String>, AuthError> {
        self.auth().current_user_id()
    }
}
