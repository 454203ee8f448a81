//! Seed import pipeline for bundled reference data.
//!
//! # Responsibility
//! - Parse fixed-schema category and sample-recipe documents.
//! - Merge them into the store idempotently (upsert, never append).
//!
//! # Invariants
//! - A sample batch is checked against the categories present in the same
//!   transaction that writes it; one unknown category rejects the whole batch.
//! - Failed imports leave the store unchanged.
//! - Undecodable image payloads degrade to "no image", never to a failure.

mod document;
mod source;

pub use source::{SeedDocument, SeedSource};

use crate::error::ErrorKind;
use crate::model::category::RecipeCategory;
use crate::model::recipe::Recipe;
use crate::store::{ObjectStore, StoreError};
use document::{CategoryEntry, SampleRecipeEntry};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from seed import.
#[derive(Debug)]
pub enum ImportError {
    /// The source document does not exist.
    SourceMissing(String),
    /// The source exists but could not be read.
    Unreadable {
        source_name: String,
        source: std::io::Error,
    },
    /// The document does not match the fixed schema.
    Malformed(serde_json::Error),
    /// Sample recipes reference categories missing from the store.
    ReferentialIntegrity { record_ids: Vec<String> },
    /// The batch could not be written.
    Store(StoreError),
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceMissing(_) | Self::Unreadable { .. } | Self::Malformed(_) => {
                ErrorKind::Import
            }
            Self::ReferentialIntegrity { .. } => ErrorKind::ReferentialIntegrity,
            Self::Store(err) => err.kind(),
        }
    }
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing(name) => write!(f, "seed source not found: {name}"),
            Self::Unreadable {
                source_name,
                source,
            } => write!(f, "seed source `{source_name}` unreadable: {source}"),
            Self::Malformed(err) => write!(f, "malformed seed document: {err}"),
            Self::ReferentialIntegrity { record_ids } => write!(
                f,
                "sample recipes reference unknown categories: {}",
                record_ids.join(", ")
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            Self::Malformed(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::SourceMissing(_) | Self::ReferentialIntegrity { .. } => None,
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::ReferentialIntegrity { record_ids } => {
                Self::ReferentialIntegrity { record_ids }
            }
            other => Self::Store(other),
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Malformed(value)
    }
}

/// Outcome of a full seed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: Vec<RecipeCategory>,
    pub recipes: Vec<Recipe>,
}

/// Imports seed documents into the object store.
pub struct SeedImporter<'s> {
    store: &'s ObjectStore,
}

impl<'s> SeedImporter<'s> {
    pub fn new(store: &'s ObjectStore) -> Self {
        Self { store }
    }

    /// Parses and upserts every category; returns what was imported.
    pub fn import_categories(
        &self,
        source: &SeedSource,
    ) -> Result<Vec<RecipeCategory>, ImportError> {
        let started_at = Instant::now();
        let result = self.import_categories_inner(source);
        log_outcome("categories", source, started_at, &result);
        result
    }

    /// Parses sample recipes, checks every category reference, then upserts
    /// the whole batch in one transaction.
    ///
    /// # Errors
    /// - `ReferentialIntegrity` lists every offending recipe id; nothing is
    ///   written in that case.
    pub fn import_sample_recipes(&self, source: &SeedSource) -> Result<Vec<Recipe>, ImportError> {
        let started_at = Instant::now();
        let result = self.import_sample_recipes_inner(source);
        log_outcome("sample_recipes", source, started_at, &result);
        result
    }

    /// Imports categories, then sample recipes, from the same kind of source.
    pub fn import_all(
        &self,
        categories: &SeedSource,
        sample_recipes: &SeedSource,
    ) -> Result<SeedReport, ImportError> {
        let categories = self.import_categories(categories)?;
        let recipes = self.import_sample_recipes(sample_recipes)?;
        Ok(SeedReport {
            categories,
            recipes,
        })
    }

    fn import_categories_inner(
        &self,
        source: &SeedSource,
    ) -> Result<Vec<RecipeCategory>, ImportError> {
        let text = source.read(SeedDocument::Categories)?;
        let entries: Vec<CategoryEntry> = serde_json::from_str(&text)?;
        let categories: Vec<RecipeCategory> =
            entries.into_iter().map(RecipeCategory::from).collect();

        self.store.upsert_all(&categories)?;
        Ok(categories)
    }

    fn import_sample_recipes_inner(&self, source: &SeedSource) -> Result<Vec<Recipe>, ImportError> {
        let text = source.read(SeedDocument::SampleRecipes)?;
        let entries: Vec<SampleRecipeEntry> = serde_json::from_str(&text)?;
        let recipes: Vec<Recipe> = entries.into_iter().map(Recipe::from).collect();

        self.store.write(|txn| {
            let known_categories = txn.ids::<RecipeCategory>()?;
            let offending: Vec<String> = recipes
                .iter()
                .filter(|recipe| !known_categories.contains(&recipe.category_id))
                .map(|recipe| recipe.id.clone())
                .collect();
            if !offending.is_empty() {
                return Err(StoreError::ReferentialIntegrity {
                    record_ids: offending,
                });
            }
            txn.upsert_all(&recipes)
        })?;
        Ok(recipes)
    }
}

fn log_outcome<T>(
    document: &str,
    source: &SeedSource,
    started_at: Instant,
    result: &Result<Vec<T>, ImportError>,
) {
    match result {
        Ok(records) => info!(
            "event=seed_import module=import status=ok document={document} source={} records={} duration_ms={}",
            source.label(),
            records.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=seed_import module=import status=error document={document} source={} error_kind={} duration_ms={} error={}",
            source.label(),
            err.kind(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
}
