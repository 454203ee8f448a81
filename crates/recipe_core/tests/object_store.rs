use recipe_core::db::open_db_in_memory;
use recipe_core::{
    ErrorKind, ObjectStore, Recipe, RecipeCategory, RecordKind, StoreError, UserAccount,
    ValidationError,
};

fn store_with_category(id: &str) -> ObjectStore {
    let store = ObjectStore::open_in_memory().unwrap();
    store.upsert(&RecipeCategory::new(id, "Dinner")).unwrap();
    store
}

#[test]
fn upsert_and_get_roundtrip() {
    let store = store_with_category("dinner");
    let mut recipe = Recipe::new("dinner", "Lasagne", "alice");
    recipe.image_data = Some(vec![0xFF, 0xD8, 0x00]);
    recipe.ingredients = vec!["pasta".to_string(), "ragu".to_string()];
    recipe.steps = vec!["layer".to_string(), "bake".to_string()];
    store.upsert(&recipe).unwrap();

    let loaded = store.get::<Recipe>(&recipe.id).unwrap();
    assert_eq!(loaded, recipe);
}

#[test]
fn upsert_twice_is_idempotent() {
    let store = store_with_category("dinner");
    let recipe = Recipe::new("dinner", "Risotto", "alice");

    store.upsert(&recipe).unwrap();
    let once = store.all::<Recipe>().unwrap();
    store.upsert(&recipe).unwrap();
    let twice = store.all::<Recipe>().unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.len(), 1);
}

#[test]
fn upsert_replaces_whole_record_without_merging() {
    let store = store_with_category("dinner");
    let mut recipe = Recipe::new("dinner", "Curry", "alice");
    recipe.image_data = Some(vec![1, 2, 3]);
    recipe.ingredients = vec!["rice".to_string()];
    store.upsert(&recipe).unwrap();

    let mut replacement = recipe.clone();
    replacement.title = "Green Curry".to_string();
    replacement.image_data = None;
    replacement.ingredients = Vec::new();
    store.upsert(&replacement).unwrap();

    let loaded = store.get::<Recipe>(&recipe.id).unwrap();
    assert_eq!(loaded.title, "Green Curry");
    assert_eq!(loaded.image_data, None);
    assert!(loaded.ingredients.is_empty());
}

#[test]
fn replaced_record_keeps_insertion_position() {
    let store = store_with_category("dinner");
    let first = Recipe::new("dinner", "First", "alice");
    let second = Recipe::new("dinner", "Second", "alice");
    store.upsert(&first).unwrap();
    store.upsert(&second).unwrap();

    let mut renamed = first.clone();
    renamed.title = "First (renamed)".to_string();
    store.upsert(&renamed).unwrap();

    let ids: Vec<String> = store
        .all::<Recipe>()
        .unwrap()
        .into_iter()
        .map(|recipe| recipe.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn get_missing_returns_not_found() {
    let store = ObjectStore::open_in_memory().unwrap();
    let err = store.get::<RecipeCategory>("nope").unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound { kind: RecordKind::RecipeCategory, ref id } if id == "nope"
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_removes_record_and_missing_delete_is_not_found() {
    let store = store_with_category("dinner");
    let recipe = Recipe::new("dinner", "Tacos", "alice");
    store.upsert(&recipe).unwrap();

    store.delete(&recipe).unwrap();
    assert!(store.all::<Recipe>().unwrap().is_empty());

    let err = store.delete(&recipe).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[test]
fn recipe_with_unknown_category_is_rejected() {
    let store = store_with_category("dinner");
    let recipe = Recipe::new("brunch", "Eggs Benedict", "alice");

    let err = store.upsert(&recipe).unwrap_err();
    match err {
        StoreError::ReferentialIntegrity { ref record_ids } => {
            assert_eq!(record_ids, &vec![recipe.id.clone()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.all::<Recipe>().unwrap().is_empty());
}

#[test]
fn validation_failure_blocks_write() {
    let store = ObjectStore::open_in_memory().unwrap();
    let err = store.upsert(&RecipeCategory::new("", "Nameless")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::MissingField { field: "id", .. })
    ));
}

#[test]
fn failed_transaction_rolls_back_every_write() {
    let store = store_with_category("dinner");
    let good = Recipe::new("dinner", "Good", "alice");
    let bad = Recipe::new("unknown", "Bad", "alice");

    let err = store
        .write(|txn| {
            txn.upsert(&RecipeCategory::new("dessert", "Dessert"))?;
            txn.upsert(&good)?;
            txn.upsert(&bad)
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferentialIntegrity);

    assert!(store.all::<Recipe>().unwrap().is_empty());
    assert_eq!(store.all::<RecipeCategory>().unwrap().len(), 1);
    assert_eq!(store.commit_seq(), 1);
}

#[test]
fn duplicate_username_violates_unique_constraint() {
    let store = ObjectStore::open_in_memory().unwrap();
    store.upsert(&UserAccount::new("alice", "hash-a")).unwrap();

    let err = store.upsert(&UserAccount::new("alice", "hash-b")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::DuplicateUsername(ref name)) if name == "alice"
    ));
    assert_eq!(store.all::<UserAccount>().unwrap().len(), 1);
}

#[test]
fn records_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recipes.sqlite3");

    let recipe = {
        let store = ObjectStore::open(&path).unwrap();
        store.upsert(&RecipeCategory::new("dinner", "Dinner")).unwrap();
        let recipe = Recipe::new("dinner", "Chili", "alice");
        store.upsert(&recipe).unwrap();
        recipe
    };

    let reopened = ObjectStore::open(&path).unwrap();
    assert_eq!(reopened.get::<Recipe>(&recipe.id).unwrap(), recipe);
    assert_eq!(reopened.ids::<RecipeCategory>().unwrap().len(), 1);
}

#[test]
fn unwritable_medium_fails_with_storage_error_and_publishes_nothing() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA query_only = ON;").unwrap();
    let store = ObjectStore::from_connection(conn);
    let subscription = store.subscribe::<RecipeCategory>().unwrap();
    let _initial = subscription.try_recv();

    let err = store
        .upsert(&RecipeCategory::new("dinner", "Dinner"))
        .unwrap_err();
    assert!(matches!(err, StoreError::Storage(_)), "unexpected error: {err}");
    assert_eq!(err.kind(), ErrorKind::Storage);

    let delete_err = store.delete_by_id::<RecipeCategory>("dinner").unwrap_err();
    assert_eq!(delete_err.kind(), ErrorKind::Storage);

    assert_eq!(store.commit_seq(), 0);
    assert!(subscription.try_recv().is_none());
    assert!(store.all::<RecipeCategory>().unwrap().is_empty());
}
