//! Recipe category record.

use crate::model::validation::{require_field, ValidationError};

/// Category referenced by recipes. Imported once from seed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeCategory {
    pub id: String,
    pub name: String,
}

impl RecipeCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Checks required fields before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("recipe_category", "id", &self.id)?;
        require_field("recipe_category", "name", &self.name)
    }
}
