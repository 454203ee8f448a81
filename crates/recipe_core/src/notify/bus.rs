use crate::notify::subscription::Subscription;
use crate::store::changes::ChangeLog;
use crate::store::record::load_all;
use crate::store::{CollectionDiff, Record, RecordKind, StoreError};
use log::{debug, warn};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SubscriptionId = u64;

/// Predicate narrowing a subscription to the records its consumer may see.
pub type RecordFilter<R> = Box<dyn Fn(&R) -> bool + Send>;

/// Full materialized view of one collection after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSnapshot<R> {
    /// Commit sequence this snapshot reflects (`0` before any write).
    pub commit_seq: u64,
    /// Records in insertion order.
    pub records: Vec<R>,
}

/// One notification delivered to a subscriber.
#[derive(Debug)]
pub enum CollectionEvent<R> {
    /// Current state at subscription time.
    Initial(CollectionSnapshot<R>),
    /// State after a committed transaction that touched the collection.
    Changed {
        snapshot: CollectionSnapshot<R>,
        diff: CollectionDiff,
    },
    /// Observation failed; no further events follow.
    Failed(StoreError),
    /// The store was dropped; no further events follow.
    Closed,
}

impl<R> CollectionEvent<R> {
    pub fn snapshot(&self) -> Option<&CollectionSnapshot<R>> {
        match self {
            Self::Initial(snapshot) | Self::Changed { snapshot, .. } => Some(snapshot),
            Self::Failed(_) | Self::Closed => None,
        }
    }

    pub fn diff(&self) -> Option<&CollectionDiff> {
        match self {
            Self::Changed { diff, .. } => Some(diff),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Closed)
    }
}

/// Type-erased delivery endpoint for one subscriber.
trait CollectionSink: Send {
    /// Returns `false` once the sink should be dropped.
    fn deliver(&mut self, conn: &Connection, commit_seq: u64, diff: &CollectionDiff) -> bool;

    fn close(&self);
}

struct ChannelSink<R> {
    sender: Sender<CollectionEvent<R>>,
    filter: Option<RecordFilter<R>>,
    // Ids in the last snapshot this subscriber received; only tracked when filtered.
    visible: BTreeSet<String>,
}

impl<R: Record> ChannelSink<R> {
    fn new(sender: Sender<CollectionEvent<R>>, filter: Option<RecordFilter<R>>) -> Self {
        Self {
            sender,
            filter,
            visible: BTreeSet::new(),
        }
    }

    /// Applies the filter and remembers which ids the subscriber now sees.
    fn scope(&mut self, records: Vec<R>) -> Vec<R> {
        let Some(filter) = self.filter.as_ref() else {
            return records;
        };
        let records: Vec<R> = records.into_iter().filter(|record| filter(record)).collect();
        self.visible = records.iter().map(|record| record.id().to_string()).collect();
        records
    }

    /// Rewrites a store diff relative to what the subscriber could see before
    /// and after the commit.
    fn scope_diff(&self, previous: &BTreeSet<String>, diff: &CollectionDiff) -> CollectionDiff {
        if self.filter.is_none() {
            return diff.clone();
        }
        let mut scoped = CollectionDiff::default();
        let touched = diff.added.iter().chain(&diff.updated).chain(&diff.removed);
        for id in touched {
            match (previous.contains(id), self.visible.contains(id)) {
                (false, true) => scoped.added.push(id.clone()),
                (true, true) => scoped.updated.push(id.clone()),
                (true, false) => scoped.removed.push(id.clone()),
                (false, false) => {}
            }
        }
        scoped
    }
}

impl<R: Record> CollectionSink for ChannelSink<R> {
    fn deliver(&mut self, conn: &Connection, commit_seq: u64, diff: &CollectionDiff) -> bool {
        match load_all::<R>(conn) {
            Ok(records) => {
                let previous = std::mem::take(&mut self.visible);
                let records = self.scope(records);
                let diff = self.scope_diff(&previous, diff);
                if diff.is_empty() {
                    // Nothing this subscriber can see changed.
                    return true;
                }
                self.sender
                    .send(CollectionEvent::Changed {
                        snapshot: CollectionSnapshot {
                            commit_seq,
                            records,
                        },
                        diff,
                    })
                    .is_ok()
            }
            Err(err) => {
                warn!(
                    "event=notify_deliver module=notify status=error kind={} error={}",
                    R::KIND,
                    err
                );
                let _ = self.sender.send(CollectionEvent::Failed(err));
                false
            }
        }
    }

    fn close(&self) {
        let _ = self.sender.send(CollectionEvent::Closed);
    }
}

struct Subscriber {
    id: SubscriptionId,
    sink: Box<dyn CollectionSink>,
}

/// Routes committed changes to per-collection subscribers.
#[derive(Default)]
pub struct NotificationBus {
    next_id: AtomicU64,
    topics: Mutex<BTreeMap<RecordKind, Vec<Subscriber>>>,
}

impl NotificationBus {
    /// Registers a subscriber and queues its initial snapshot.
    ///
    /// Callers hold the store writer lock so no commit can slip between the
    /// snapshot read and registration. With a `filter`, snapshots only carry
    /// matching records and commits touching none of them are not delivered.
    pub(crate) fn register<R: Record>(
        self: &Arc<Self>,
        commit_seq: u64,
        records: Vec<R>,
        filter: Option<RecordFilter<R>>,
    ) -> Subscription<R> {
        let (sender, receiver) = mpsc::channel();
        let mut sink = ChannelSink::new(sender, filter);
        let records = sink.scope(records);
        let _ = sink.sender.send(CollectionEvent::Initial(CollectionSnapshot {
            commit_seq,
            records,
        }));

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock()
            .entry(R::KIND)
            .or_default()
            .push(Subscriber {
                id,
                sink: Box::new(sink),
            });
        debug!(
            "event=notify_subscribe module=notify status=ok kind={} subscription_id={id}",
            R::KIND
        );

        Subscription::new(id, R::KIND, receiver, Arc::downgrade(self))
    }

    /// Delivers one committed transaction to every affected collection.
    pub(crate) fn publish(&self, conn: &Connection, commit_seq: u64, changes: &ChangeLog) {
        let mut topics = self.lock();
        for kind in changes.kinds() {
            let Some(subscribers) = topics.get_mut(&kind) else {
                continue;
            };
            let diff = changes.diff(kind);
            subscribers.retain_mut(|subscriber| subscriber.sink.deliver(conn, commit_seq, &diff));
        }
    }

    /// Removes one subscriber. Returns whether it was still registered.
    pub(crate) fn unsubscribe(&self, kind: RecordKind, id: SubscriptionId) -> bool {
        let mut topics = self.lock();
        let Some(subscribers) = topics.get_mut(&kind) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|subscriber| subscriber.id != id);
        let removed = subscribers.len() != before;
        if removed {
            debug!(
                "event=notify_unsubscribe module=notify status=ok kind={kind} subscription_id={id}"
            );
        }
        removed
    }

    pub fn subscriber_count(&self, kind: RecordKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<RecordKind, Vec<Subscriber>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for NotificationBus {
    fn drop(&mut self) {
        let topics = self.topics.get_mut().unwrap_or_else(PoisonError::into_inner);
        for subscriber in topics.values().flatten() {
            subscriber.sink.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionEvent, NotificationBus};
    use crate::model::recipe::Recipe;
    use crate::store::changes::{ChangeLog, ChangeOp};
    use crate::store::RecordKind;
    use rusqlite::Connection;
    use std::sync::Arc;

    #[test]
    fn unreadable_store_delivers_terminal_failure_then_closes() {
        let bus = Arc::new(NotificationBus::default());
        let subscription = bus.register::<Recipe>(0, Vec::new(), None);
        assert!(matches!(
            subscription.try_recv(),
            Some(CollectionEvent::Initial(_))
        ));

        // No migrations applied: the recipes table does not exist.
        let bare = Connection::open_in_memory().unwrap();
        let mut changes = ChangeLog::default();
        changes.record(RecordKind::Recipe, "r1", ChangeOp::Added);
        bus.publish(&bare, 1, &changes);

        let event = subscription.try_recv().unwrap();
        assert!(event.is_terminal());
        assert_eq!(bus.subscriber_count(RecordKind::Recipe), 0);
        assert!(subscription.recv().is_none());
    }

    #[test]
    fn publish_skips_collections_without_changes() {
        let bus = Arc::new(NotificationBus::default());
        let subscription = bus.register::<Recipe>(0, Vec::new(), None);
        let _ = subscription.try_recv();

        let bare = Connection::open_in_memory().unwrap();
        let mut changes = ChangeLog::default();
        changes.record(RecordKind::UserAccount, "u1", ChangeOp::Added);
        bus.publish(&bare, 1, &changes);

        assert!(subscription.try_recv().is_none());
        assert_eq!(bus.subscriber_count(RecordKind::Recipe), 1);
    }

    #[test]
    fn dropping_subscription_unregisters_sink() {
        let bus = Arc::new(NotificationBus::default());
        let first = bus.register::<Recipe>(0, Vec::new(), None);
        let second = bus.register::<Recipe>(0, Vec::new(), None);
        assert_eq!(bus.subscriber_count(RecordKind::Recipe), 2);
        assert_ne!(first.id(), second.id());

        drop(first);
        assert_eq!(bus.subscriber_count(RecordKind::Recipe), 1);
        second.unsubscribe();
        assert_eq!(bus.subscriber_count(RecordKind::Recipe), 0);
    }
}
