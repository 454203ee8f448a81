//! Persistence and access-control core for a personal recipe catalog.
//!
//! Typed records live in a transactional SQLite-backed object store that
//! publishes every committed change to subscribers. Seed data is imported
//! idempotently, and recipe reads are scoped to the logged-in account.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod import;
pub mod logging;
pub mod model;
pub mod notify;
pub mod query;
pub mod service;
pub mod settings;
pub mod store;

pub use auth::{AuthError, AuthService, SessionProvider, SessionState};
pub use config::{ConfigError, CoreConfig};
pub use context::{OpenError, RecipeCore};
pub use error::ErrorKind;
pub use import::{ImportError, SeedImporter, SeedReport, SeedSource};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::RecipeCategory;
pub use model::recipe::{Recipe, RecipeDraft};
pub use model::user::UserAccount;
pub use model::validation::ValidationError;
pub use model::SHARED_OWNER_ID;
pub use notify::{CollectionEvent, CollectionSnapshot, Subscription};
pub use query::{QueryEngine, RecipeQuery};
pub use service::recipe_service::{RecipeService, RecipeServiceError};
pub use settings::{JsonFileStore, KeyValueStore, MemoryStore, SettingsError};
pub use store::{CollectionDiff, ObjectStore, Record, RecordKind, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
