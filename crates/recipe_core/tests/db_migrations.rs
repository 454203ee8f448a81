use recipe_core::db::migrations::{apply_migrations_up_to, latest_version};
use recipe_core::db::{open_db, open_db_in_memory, DbError};
use recipe_core::{ObjectStore, Recipe, SHARED_OWNER_ID};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(latest_version(), 3);
    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "recipe_categories");
    assert_table_exists(&conn, "recipes");
    assert_table_exists(&conn, "user_accounts");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recipes.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "recipes");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn upgrading_from_v1_keeps_recipes_as_shared_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite3");

    let mut conn = Connection::open(&path).unwrap();
    apply_migrations_up_to(&mut conn, 1).unwrap();
    assert_eq!(schema_version(&conn), 1);
    conn.execute_batch(
        "INSERT INTO recipe_categories (id, name) VALUES ('dinner', 'Dinner');
         INSERT INTO recipes (id, category_id, title, ingredients, steps, created_at)
         VALUES ('legacy-1', 'dinner', 'Old Stew', '[\"beef\"]', '[\"simmer\"]', 1700000000000);",
    )
    .unwrap();
    drop(conn);

    let store = ObjectStore::open(&path).unwrap();
    let recipe = store.get::<Recipe>("legacy-1").unwrap();
    assert_eq!(recipe.title, "Old Stew");
    assert_eq!(recipe.owner_user_id, SHARED_OWNER_ID);
    assert_eq!(recipe.ingredients, vec!["beef"]);
    assert_eq!(recipe.created_at.timestamp_millis(), 1_700_000_000_000);
}

#[test]
fn failed_upgrade_names_the_step_and_keeps_previous_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflict.sqlite3");

    let mut conn = Connection::open(&path).unwrap();
    apply_migrations_up_to(&mut conn, 1).unwrap();
    // Column added out of band; the v2 step cannot add it again.
    conn.execute_batch("ALTER TABLE recipes ADD COLUMN owner_user_id TEXT;")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Migration { version, .. } => assert_eq!(*version, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("version 2"));
    assert!(std::error::Error::source(&err).is_some());

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
    let accounts_table: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'user_accounts';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(accounts_table, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
