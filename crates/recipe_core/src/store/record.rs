//! Typed record mapping between domain models and SQLite rows.
//!
//! # Responsibility
//! - Describe how each record kind is keyed, validated, written and read.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Writes are whole-record replacements keyed by `id` (`ON CONFLICT DO UPDATE`),
//!   which keeps the original rowid and therefore the insertion position.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::category::RecipeCategory;
use crate::model::recipe::Recipe;
use crate::model::user::UserAccount;
use crate::model::validation::ValidationError;
use crate::store::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Record collections known by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    RecipeCategory,
    Recipe,
    UserAccount,
}

impl RecordKind {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::RecipeCategory => "recipe_categories",
            Self::Recipe => "recipes",
            Self::UserAccount => "user_accounts",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecipeCategory => "recipe_category",
            Self::Recipe => "recipe",
            Self::UserAccount => "user_account",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value the object store can persist under a string primary key.
pub trait Record: Clone + Send + 'static {
    const KIND: RecordKind;

    /// Primary key. Immutable after creation.
    fn id(&self) -> &str;

    /// Field-level checks applied before every write.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Foreign-key checks applied before every write.
    fn check_references(&self, _conn: &Connection) -> StoreResult<()> {
        Ok(())
    }

    /// `SELECT <columns> FROM <table>` without filters or ordering.
    fn select_sql() -> &'static str;

    /// Inserts or fully replaces the row keyed by `id()`.
    fn upsert_row(&self, conn: &Connection) -> StoreResult<()>;

    fn from_row(row: &Row<'_>) -> StoreResult<Self>;
}

impl Record for RecipeCategory {
    const KIND: RecordKind = RecordKind::RecipeCategory;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        RecipeCategory::validate(self)
    }

    fn select_sql() -> &'static str {
        "SELECT id, name FROM recipe_categories"
    }

    fn upsert_row(&self, conn: &Connection) -> StoreResult<()> {
        conn.execute(
            "INSERT INTO recipe_categories (id, name) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name;",
            params![self.id, self.name],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

impl Record for Recipe {
    const KIND: RecordKind = RecordKind::Recipe;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Recipe::validate(self)
    }

    fn check_references(&self, conn: &Connection) -> StoreResult<()> {
        if !exists::<RecipeCategory>(conn, &self.category_id)? {
            return Err(StoreError::ReferentialIntegrity {
                record_ids: vec![self.id.clone()],
            });
        }
        Ok(())
    }

    fn select_sql() -> &'static str {
        "SELECT
            id,
            category_id,
            title,
            image_data,
            ingredients,
            steps,
            created_at,
            owner_user_id
        FROM recipes"
    }

    fn upsert_row(&self, conn: &Connection) -> StoreResult<()> {
        let ingredients = encode_list(&self.ingredients)?;
        let steps = encode_list(&self.steps)?;
        conn.execute(
            "INSERT INTO recipes (
                id,
                category_id,
                title,
                image_data,
                ingredients,
                steps,
                created_at,
                owner_user_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                category_id = excluded.category_id,
                title = excluded.title,
                image_data = excluded.image_data,
                ingredients = excluded.ingredients,
                steps = excluded.steps,
                created_at = excluded.created_at,
                owner_user_id = excluded.owner_user_id;",
            params![
                self.id,
                self.category_id,
                self.title,
                self.image_data.as_deref(),
                ingredients,
                steps,
                self.created_at.timestamp_millis(),
                self.owner_user_id,
            ],
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> StoreResult<Self> {
        let id: String = row.get("id")?;
        let created_at_ms: i64 = row.get("created_at")?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(created_at_ms).ok_or_else(|| {
            StoreError::InvalidData(format!(
                "invalid created_at `{created_at_ms}` in recipes.created_at for `{id}`"
            ))
        })?;
        let ingredients = decode_list(&row.get::<_, String>("ingredients")?, "ingredients")?;
        let steps = decode_list(&row.get::<_, String>("steps")?, "steps")?;

        Ok(Self {
            id,
            category_id: row.get("category_id")?,
            title: row.get("title")?,
            image_data: row.get("image_data")?,
            ingredients,
            steps,
            created_at,
            owner_user_id: row.get("owner_user_id")?,
        })
    }
}

impl Record for UserAccount {
    const KIND: RecordKind = RecordKind::UserAccount;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        UserAccount::validate(self)
    }

    fn select_sql() -> &'static str {
        "SELECT id, username, password_hash FROM user_accounts"
    }

    fn upsert_row(&self, conn: &Connection) -> StoreResult<()> {
        let result = conn.execute(
            "INSERT INTO user_accounts (id, username, password_hash) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                password_hash = excluded.password_hash;",
            params![self.id, self.username, self.password_hash],
        );
        match result {
            Ok(_) => Ok(()),
            // The primary key conflict is absorbed by the upsert; what remains
            // is the unique username constraint.
            Err(rusqlite::Error::SqliteFailure(code, _))
                if code.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Validation(ValidationError::DuplicateUsername(
                    self.username.clone(),
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn from_row(row: &Row<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
        })
    }
}

pub(crate) fn load_all<R: Record>(conn: &Connection) -> StoreResult<Vec<R>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY rowid ASC;", R::select_sql()))?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(R::from_row(row)?);
    }
    Ok(records)
}

pub(crate) fn load_one<R: Record>(conn: &Connection, id: &str) -> StoreResult<Option<R>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1;", R::select_sql()))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(R::from_row(row)?));
    }
    Ok(None)
}

pub(crate) fn load_ids<R: Record>(conn: &Connection) -> StoreResult<BTreeSet<String>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {};", R::KIND.table()))?;
    let mut rows = stmt.query([])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        ids.insert(row.get::<_, String>(0)?);
    }
    Ok(ids)
}

pub(crate) fn exists<R: Record>(conn: &Connection, id: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
            R::KIND.table()
        ),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn delete_row<R: Record>(conn: &Connection, id: &str) -> StoreResult<bool> {
    let changed = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1;", R::KIND.table()),
        [id],
    )?;
    Ok(changed > 0)
}

pub(crate) fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> StoreResult<Option<UserAccount>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE username = ?1;",
        UserAccount::select_sql()
    ))?;
    let mut rows = stmt.query([username])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(UserAccount::from_row(row)?));
    }
    Ok(None)
}

fn encode_list(values: &[String]) -> StoreResult<String> {
    serde_json::to_string(values)
        .map_err(|err| StoreError::InvalidData(format!("failed to encode list: {err}")))
}

fn decode_list(value: &str, column: &str) -> StoreResult<Vec<String>> {
    serde_json::from_str(value).map_err(|err| {
        StoreError::InvalidData(format!("invalid json array in recipes.{column}: {err}"))
    })
}
