//! Fixed-schema seed documents and their mapping onto records.

use crate::model::category::RecipeCategory;
use crate::model::recipe::Recipe;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, SubsecRound, Utc};
use log::warn;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CategoryEntry {
    pub id: String,
    pub name: String,
}

impl From<CategoryEntry> for RecipeCategory {
    fn from(entry: CategoryEntry) -> Self {
        RecipeCategory::new(entry.id, entry.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SampleRecipeEntry {
    pub id: String,
    #[serde(rename = "typeID")]
    pub type_id: String,
    pub title: String,
    #[serde(default)]
    pub image_data: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "userID")]
    pub user_id: String,
}

impl From<SampleRecipeEntry> for Recipe {
    fn from(entry: SampleRecipeEntry) -> Self {
        let image_data = entry
            .image_data
            .as_deref()
            .and_then(|encoded| decode_image(&entry.id, encoded));
        Recipe {
            id: entry.id,
            category_id: entry.type_id,
            title: entry.title,
            image_data,
            ingredients: entry.ingredients,
            steps: entry.steps,
            created_at: entry.created_at.trunc_subsecs(3),
            owner_user_id: entry.user_id,
        }
    }
}

/// Undecodable payloads are treated as a missing image.
fn decode_image(recipe_id: &str, encoded: &str) -> Option<Vec<u8>> {
    match STANDARD.decode(encoded.trim()) {
        Ok(bytes) if !bytes.is_empty() => Some(bytes),
        Ok(_) => None,
        Err(err) => {
            warn!(
                "event=seed_import module=import status=degraded recipe_id={recipe_id} error_code=image_decode_failed error={err}"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SampleRecipeEntry;
    use crate::model::recipe::Recipe;

    fn entry(image: &str) -> String {
        format!(
            r#"{{
                "id": "r1",
                "typeID": "lunch",
                "title": "Toast",
                "imageData": "{image}",
                "ingredients": ["bread"],
                "steps": ["toast it"],
                "createdAt": "2024-03-01T10:00:00.123456Z",
                "userID": "user-123"
            }}"#
        )
    }

    #[test]
    fn maps_document_names_onto_record_fields() {
        let parsed: SampleRecipeEntry = serde_json::from_str(&entry("AQID")).unwrap();
        let recipe = Recipe::from(parsed);
        assert_eq!(recipe.category_id, "lunch");
        assert_eq!(recipe.owner_user_id, "user-123");
        assert_eq!(recipe.image_data, Some(vec![1, 2, 3]));
        assert_eq!(recipe.created_at.timestamp_subsec_millis(), 123);
        assert_eq!(recipe.created_at.timestamp_subsec_nanos(), 123_000_000);
    }

    #[test]
    fn invalid_base64_becomes_missing_image() {
        let parsed: SampleRecipeEntry = serde_json::from_str(&entry("@@not-base64@@")).unwrap();
        assert_eq!(Recipe::from(parsed).image_data, None);
    }
}
