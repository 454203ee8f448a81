//! Recipe domain model.
//!
//! # Responsibility
//! - Define the recipe record and the draft used by authoring flows.
//!
//! # Invariants
//! - `id` is stable and never reused for another recipe.
//! - `category_id` must reference an existing category when persisted.
//! - `created_at` carries millisecond precision, matching storage.

use crate::model::validation::{require_field, ValidationError};
use crate::model::SHARED_OWNER_ID;
use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

/// Stored recipe authored by a user or imported as a shared sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: String,
    pub category_id: String,
    pub title: String,
    /// Raw image payload; image processing happens outside the core.
    pub image_data: Option<Vec<u8>>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub owner_user_id: String,
}

/// User input for a new recipe. Identity, owner and timestamp are assigned
/// by the recipe service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDraft {
    pub category_id: String,
    pub title: String,
    pub image_data: Option<Vec<u8>>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

impl Recipe {
    /// Creates a recipe with a generated ID and the current time.
    pub fn new(
        category_id: impl Into<String>,
        title: impl Into<String>,
        owner_user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category_id: category_id.into(),
            title: title.into(),
            image_data: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
            created_at: now_millis(),
            owner_user_id: owner_user_id.into(),
        }
    }

    /// Materializes a draft for `owner_user_id`.
    pub fn from_draft(draft: RecipeDraft, owner_user_id: impl Into<String>) -> Self {
        let mut recipe = Self::new(draft.category_id, draft.title, owner_user_id);
        recipe.image_data = draft.image_data;
        recipe.ingredients = draft.ingredients;
        recipe.steps = draft.steps;
        recipe
    }

    /// Returns whether this recipe belongs to the shared sample set.
    pub fn is_shared_sample(&self) -> bool {
        self.owner_user_id == SHARED_OWNER_ID
    }

    /// Returns whether `viewer_id` may see this recipe.
    pub fn is_visible_to(&self, viewer_id: &str) -> bool {
        self.owner_user_id == viewer_id || self.is_shared_sample()
    }

    /// Checks required fields before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("recipe", "id", &self.id)?;
        require_field("recipe", "category_id", &self.category_id)?;
        require_field("recipe", "title", &self.title)?;
        require_field("recipe", "owner_user_id", &self.owner_user_id)
    }
}

/// Current time truncated to the precision kept by storage.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[cfg(test)]
mod tests {
    use super::{Recipe, RecipeDraft};
    use crate::model::SHARED_OWNER_ID;

    #[test]
    fn shared_samples_are_visible_to_everyone() {
        let sample = Recipe::new("breakfast", "Pancakes", SHARED_OWNER_ID);
        assert!(sample.is_visible_to("alice"));

        let private = Recipe::new("breakfast", "Omelette", "alice");
        assert!(private.is_visible_to("alice"));
        assert!(!private.is_visible_to("bob"));
    }

    #[test]
    fn from_draft_assigns_owner_and_keeps_sequences() {
        let draft = RecipeDraft {
            category_id: "dinner".to_string(),
            title: "Soup".to_string(),
            ingredients: vec!["water".to_string(), "salt".to_string()],
            steps: vec!["boil".to_string()],
            ..RecipeDraft::default()
        };
        let recipe = Recipe::from_draft(draft, "bob");
        assert_eq!(recipe.owner_user_id, "bob");
        assert_eq!(recipe.ingredients, vec!["water", "salt"]);
        assert!(!recipe.id.is_empty());
        assert_eq!(recipe.created_at.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn validate_rejects_empty_title() {
        let recipe = Recipe::new("dinner", " ", "bob");
        assert!(recipe.validate().is_err());
    }
}
