//! Read queries over stored recipes.
//!
//! # Responsibility
//! - Build ownership-scoped recipe queries and execute them against the store.
//!
//! # Invariants
//! - Results are sorted by `created_at DESC`, ties in insertion order.
//! - Without a category filter only the owner's own recipes match; with one,
//!   the owner's and shared-sample recipes in that category match.
//! - No match yields an empty list, never an error.

use crate::model::recipe::Recipe;
use crate::model::SHARED_OWNER_ID;
use crate::store::{ObjectStore, Record, StoreResult};
use rusqlite::types::Value;
use rusqlite::params_from_iter;

/// Ownership-scoped recipe filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub owner_user_id: String,
    pub category_id: Option<String>,
}

impl RecipeQuery {
    pub fn for_owner(owner_user_id: impl Into<String>) -> Self {
        Self {
            owner_user_id: owner_user_id.into(),
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Returns whether `recipe` satisfies this filter.
    pub fn matches(&self, recipe: &Recipe) -> bool {
        match self.category_id.as_deref() {
            Some(category_id) => {
                recipe.category_id == category_id && recipe.is_visible_to(&self.owner_user_id)
            }
            None => recipe.owner_user_id == self.owner_user_id,
        }
    }

    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("{} WHERE 1 = 1", Recipe::select_sql());
        let mut bind_values: Vec<Value> = Vec::new();

        match self.category_id.as_ref() {
            Some(category_id) => {
                sql.push_str(" AND category_id = ? AND (owner_user_id = ? OR owner_user_id = ?)");
                bind_values.push(Value::Text(category_id.clone()));
                bind_values.push(Value::Text(self.owner_user_id.clone()));
                bind_values.push(Value::Text(SHARED_OWNER_ID.to_string()));
            }
            None => {
                sql.push_str(" AND owner_user_id = ?");
                bind_values.push(Value::Text(self.owner_user_id.clone()));
            }
        }

        sql.push_str(" ORDER BY created_at DESC, rowid ASC;");
        (sql, bind_values)
    }
}

/// Executes read queries through the object store.
pub struct QueryEngine<'s> {
    store: &'s ObjectStore,
}

impl<'s> QueryEngine<'s> {
    pub fn new(store: &'s ObjectStore) -> Self {
        Self { store }
    }

    /// Finds recipes visible under `owner_user_id`, optionally in one category.
    pub fn find_recipes(
        &self,
        owner_user_id: &str,
        category_id: Option<&str>,
    ) -> StoreResult<Vec<Recipe>> {
        let mut query = RecipeQuery::for_owner(owner_user_id);
        if let Some(category_id) = category_id {
            query = query.in_category(category_id);
        }
        self.run(&query)
    }

    pub fn run(&self, query: &RecipeQuery) -> StoreResult<Vec<Recipe>> {
        let (sql, bind_values) = query.to_sql();
        self.store.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(bind_values))?;
            let mut recipes = Vec::new();
            while let Some(row) = rows.next()? {
                recipes.push(Recipe::from_row(row)?);
            }
            Ok(recipes)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RecipeQuery;
    use crate::model::recipe::Recipe;
    use crate::model::SHARED_OWNER_ID;

    #[test]
    fn sql_without_category_only_binds_owner() {
        let (sql, binds) = RecipeQuery::for_owner("alice").to_sql();
        assert!(sql.contains("owner_user_id = ?"));
        assert!(!sql.contains("category_id = ?"));
        assert_eq!(binds.len(), 1);
        assert!(sql.ends_with("ORDER BY created_at DESC, rowid ASC;"));
    }

    #[test]
    fn matches_mirrors_visibility_rules() {
        let shared = Recipe::new("lunch", "Salad", SHARED_OWNER_ID);
        let own = Recipe::new("lunch", "Wrap", "alice");

        let all_own = RecipeQuery::for_owner("alice");
        assert!(all_own.matches(&own));
        assert!(!all_own.matches(&shared));

        let lunch = RecipeQuery::for_owner("alice").in_category("lunch");
        assert!(lunch.matches(&own));
        assert!(lunch.matches(&shared));
        assert!(!RecipeQuery::for_owner("alice")
            .in_category("dinner")
            .matches(&shared));
    }
}
