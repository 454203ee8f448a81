//! Recipe use-case service.
//!
//! # Responsibility
//! - Fetch recipes for the logged-in user.
//! - Create, update and delete user-authored recipes.
//!
//! # Invariants
//! - Every operation requires an active session.
//! - Writes are limited to recipes owned by the session user; shared samples
//!   are read-only.

use crate::auth::{AuthError, SessionProvider};
use crate::error::ErrorKind;
use crate::model::recipe::{Recipe, RecipeDraft};
use crate::notify::Subscription;
use crate::query::{QueryEngine, RecipeQuery};
use crate::store::{ObjectStore, RecordKind, StoreError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for recipe use-cases.
#[derive(Debug)]
pub enum RecipeServiceError {
    Auth(AuthError),
    Store(StoreError),
}

impl RecipeServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(err) => err.kind(),
            Self::Store(err) => err.kind(),
        }
    }
}

impl Display for RecipeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecipeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Auth(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<AuthError> for RecipeServiceError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<StoreError> for RecipeServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

pub type RecipeServiceResult<T> = Result<T, RecipeServiceError>;

/// Recipe service facade over the store and the active session.
pub struct RecipeService<'s, P: SessionProvider> {
    store: &'s ObjectStore,
    session: &'s P,
}

impl<'s, P: SessionProvider> RecipeService<'s, P> {
    pub fn new(store: &'s ObjectStore, session: &'s P) -> Self {
        Self { store, session }
    }

    /// Lists recipes for the session user, newest first.
    ///
    /// With `category_id`, shared samples in that category are included.
    pub fn fetch_recipes(&self, category_id: Option<&str>) -> RecipeServiceResult<Vec<Recipe>> {
        let owner_id = self.session.require_user_id()?;
        Ok(QueryEngine::new(self.store).find_recipes(&owner_id, category_id)?)
    }

    /// Loads one recipe visible to the session user.
    pub fn get_recipe(&self, recipe_id: &str) -> RecipeServiceResult<Recipe> {
        let owner_id = self.session.require_user_id()?;
        let recipe = self.store.get::<Recipe>(recipe_id)?;
        if !recipe.is_visible_to(&owner_id) {
            // Hidden recipes are indistinguishable from absent ones.
            return Err(StoreError::NotFound {
                kind: RecordKind::Recipe,
                id: recipe_id.to_string(),
            }
            .into());
        }
        Ok(recipe)
    }

    /// Creates a recipe owned by the session user.
    pub fn create_recipe(&self, draft: RecipeDraft) -> RecipeServiceResult<Recipe> {
        let owner_id = self.session.require_user_id()?;
        let recipe = Recipe::from_draft(draft, owner_id);
        self.store.upsert(&recipe)?;
        info!(
            "event=recipe_create module=service status=ok recipe_id={}",
            recipe.id
        );
        Ok(recipe)
    }

    /// Replaces a recipe owned by the session user.
    ///
    /// Fails with `NotOwner` when either the submitted or the stored owner is
    /// somebody else, so ownership cannot be transferred or hijacked.
    pub fn save_recipe(&self, recipe: &Recipe) -> RecipeServiceResult<()> {
        let owner_id = self.session.require_user_id()?;
        if recipe.owner_user_id != owner_id {
            return Err(not_owner(&recipe.id));
        }
        let owned = self.store.write(|txn| {
            match txn.get::<Recipe>(&recipe.id) {
                Ok(existing) if existing.owner_user_id != owner_id => return Ok(false),
                Ok(_) | Err(StoreError::NotFound { .. }) => {}
                Err(err) => return Err(err),
            }
            txn.upsert(recipe)?;
            Ok(true)
        })?;
        if !owned {
            return Err(not_owner(&recipe.id));
        }
        info!(
            "event=recipe_save module=service status=ok recipe_id={}",
            recipe.id
        );
        Ok(())
    }

    /// Deletes a recipe owned by the session user.
    pub fn delete_recipe(&self, recipe_id: &str) -> RecipeServiceResult<()> {
        let owner_id = self.session.require_user_id()?;
        let owned = self.store.write(|txn| {
            let existing = txn.get::<Recipe>(recipe_id)?;
            if existing.owner_user_id != owner_id {
                return Ok(false);
            }
            txn.delete(&existing)?;
            Ok(true)
        })?;
        if !owned {
            return Err(not_owner(recipe_id));
        }
        info!("event=recipe_delete module=service status=ok recipe_id={recipe_id}");
        Ok(())
    }

    /// Subscribes to the recipes visible to the session user.
    ///
    /// The stream is scoped the same way as [`Self::fetch_recipes`]: own
    /// recipes, plus shared samples when `category_id` is given. The owner is
    /// fixed at subscription time.
    pub fn observe_recipes(
        &self,
        category_id: Option<&str>,
    ) -> RecipeServiceResult<Subscription<Recipe>> {
        let owner_id = self.session.require_user_id()?;
        let mut query = RecipeQuery::for_owner(owner_id);
        if let Some(category_id) = category_id {
            query = query.in_category(category_id);
        }
        Ok(self
            .store
            .subscribe_where(move |recipe: &Recipe| query.matches(recipe))?)
    }
}

fn not_owner(record_id: &str) -> RecipeServiceError {
    RecipeServiceError::Auth(AuthError::NotOwner {
        record_id: record_id.to_string(),
    })
}
