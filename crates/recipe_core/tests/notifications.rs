use recipe_core::{
    CollectionEvent, ObjectStore, Recipe, RecipeCategory, RecordKind, UserAccount,
};
use std::thread;
use std::time::Duration;

fn store_with_category() -> ObjectStore {
    let store = ObjectStore::open_in_memory().unwrap();
    store.upsert(&RecipeCategory::new("dinner", "Dinner")).unwrap();
    store
}

fn record_ids(event: &CollectionEvent<Recipe>) -> Vec<String> {
    event
        .snapshot()
        .unwrap()
        .records
        .iter()
        .map(|recipe| recipe.id.clone())
        .collect()
}

#[test]
fn subscription_starts_with_current_snapshot() {
    let store = store_with_category();
    let existing = Recipe::new("dinner", "Existing", "alice");
    store.upsert(&existing).unwrap();

    let subscription = store.subscribe::<Recipe>().unwrap();
    let initial = subscription.try_recv().unwrap();
    assert!(matches!(initial, CollectionEvent::Initial(_)));
    assert_eq!(record_ids(&initial), vec![existing.id]);
    assert_eq!(initial.snapshot().unwrap().commit_seq, store.commit_seq());
    assert!(subscription.try_recv().is_none());
}

#[test]
fn events_follow_commit_order() {
    let store = store_with_category();
    let subscription = store.subscribe::<Recipe>().unwrap();

    let r1 = Recipe::new("dinner", "R1", "alice");
    let r2 = Recipe::new("dinner", "R2", "alice");
    store.upsert(&r1).unwrap();
    store.upsert(&r2).unwrap();
    store.delete(&r1).unwrap();

    let events = subscription.drain();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], CollectionEvent::Initial(_)));
    assert!(record_ids(&events[0]).is_empty());

    assert_eq!(events[1].diff().unwrap().added, vec![r1.id.clone()]);
    assert_eq!(record_ids(&events[1]), vec![r1.id.clone()]);

    assert_eq!(events[2].diff().unwrap().added, vec![r2.id.clone()]);
    assert_eq!(record_ids(&events[2]), vec![r1.id.clone(), r2.id.clone()]);

    assert_eq!(events[3].diff().unwrap().removed, vec![r1.id.clone()]);
    assert_eq!(record_ids(&events[3]), vec![r2.id.clone()]);

    let seqs: Vec<u64> = events
        .iter()
        .map(|event| event.snapshot().unwrap().commit_seq)
        .collect();
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn update_of_existing_key_is_reported_as_updated() {
    let store = store_with_category();
    let mut recipe = Recipe::new("dinner", "Draft", "alice");
    store.upsert(&recipe).unwrap();
    let subscription = store.subscribe::<Recipe>().unwrap();
    let _initial = subscription.try_recv();

    recipe.title = "Final".to_string();
    store.upsert(&recipe).unwrap();

    let event = subscription.try_recv().unwrap();
    let diff = event.diff().unwrap();
    assert_eq!(diff.updated, vec![recipe.id.clone()]);
    assert!(diff.added.is_empty());
    assert_eq!(event.snapshot().unwrap().records[0].title, "Final");
}

#[test]
fn unrelated_collections_and_rollbacks_publish_nothing() {
    let store = store_with_category();
    let subscription = store.subscribe::<Recipe>().unwrap();
    let _initial = subscription.try_recv();

    store.upsert(&UserAccount::new("alice", "hash")).unwrap();
    let rejected = store.upsert(&Recipe::new("unknown", "Orphan", "alice"));
    assert!(rejected.is_err());

    assert!(subscription.try_recv().is_none());
}

#[test]
fn unsubscribe_stops_delivery() {
    let store = store_with_category();
    let subscription = store.subscribe::<Recipe>().unwrap();
    assert_eq!(store.subscriber_count(RecordKind::Recipe), 1);

    subscription.unsubscribe();
    assert_eq!(store.subscriber_count(RecordKind::Recipe), 0);

    store.upsert(&Recipe::new("dinner", "After", "alice")).unwrap();
    assert_eq!(store.subscriber_count(RecordKind::Recipe), 0);
}

#[test]
fn events_can_be_consumed_on_another_thread() {
    let store = store_with_category();
    let subscription = store.subscribe::<Recipe>().unwrap();

    let consumer = thread::spawn(move || {
        let mut snapshots = Vec::new();
        while let Some(event) = subscription.recv_timeout(Duration::from_secs(5)) {
            let count = event.snapshot().map_or(0, |snapshot| snapshot.records.len());
            snapshots.push(count);
            if count == 3 {
                break;
            }
        }
        snapshots
    });

    for title in ["one", "two", "three"] {
        store.upsert(&Recipe::new("dinner", title, "alice")).unwrap();
    }

    assert_eq!(consumer.join().unwrap(), vec![0, 1, 2, 3]);
}

#[test]
fn dropping_the_store_closes_open_streams() {
    let store = store_with_category();
    let subscription = store.subscribe::<Recipe>().unwrap();
    drop(store);

    let events = subscription.drain();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], CollectionEvent::Initial(_)));
    assert!(matches!(events[1], CollectionEvent::Closed));
    assert!(events[1].is_terminal());
    assert!(subscription.recv().is_none());
}
