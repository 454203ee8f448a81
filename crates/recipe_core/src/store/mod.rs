//! Transactional object store over typed records.
//!
//! # Responsibility
//! - Provide upsert/delete/get/all over records keyed by string primary key.
//! - Wrap every mutation in one SQLite transaction that fully applies or
//!   fully rolls back.
//! - Publish committed changes to the notification bus in commit order.
//!
//! # Invariants
//! - Only one write transaction runs at a time (`Mutex` around the connection).
//! - Upsert replaces the whole record; there is no field-level merge.
//! - Failed transactions publish nothing.

pub(crate) mod changes;
pub(crate) mod record;

pub use changes::CollectionDiff;
pub use record::{Record, RecordKind};

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::error::ErrorKind;
use crate::model::user::UserAccount;
use crate::model::validation::ValidationError;
use crate::notify::{NotificationBus, RecordFilter, Subscription};
use changes::{ChangeLog, ChangeOp};
use log::{debug, warn};
use record::{delete_row, exists, find_user_by_username, load_all, load_ids, load_one};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from object store operations.
#[derive(Debug)]
pub enum StoreError {
    /// The underlying medium could not open, read or commit.
    Storage(DbError),
    /// Lookup or delete of a key that does not exist.
    NotFound { kind: RecordKind, id: String },
    /// Record content rejected before the write.
    Validation(ValidationError),
    /// Records reference categories that do not exist.
    ReferentialIntegrity { record_ids: Vec<String> },
    /// Persisted data cannot be converted back to a record.
    InvalidData(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(_) | Self::InvalidData(_) => ErrorKind::Storage,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::ReferentialIntegrity { .. } => ErrorKind::ReferentialIntegrity,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::ReferentialIntegrity { record_ids } => write!(
                f,
                "records reference unknown categories: {}",
                record_ids.join(", ")
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::ReferentialIntegrity { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(DbError::Sqlite(value))
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One open write transaction.
///
/// Dropping it without returning `Ok` from the closure passed to
/// [`ObjectStore::write`] rolls every change back.
pub struct WriteTxn<'conn> {
    tx: Transaction<'conn>,
    changes: ChangeLog,
}

impl WriteTxn<'_> {
    /// Inserts the record or replaces the record sharing its primary key.
    pub fn upsert<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        record.validate()?;
        record.check_references(&self.tx)?;
        let existed = exists::<R>(&self.tx, record.id())?;
        record.upsert_row(&self.tx)?;
        let op = if existed {
            ChangeOp::Updated
        } else {
            ChangeOp::Added
        };
        self.changes.record(R::KIND, record.id(), op);
        Ok(())
    }

    pub fn upsert_all<R: Record>(&mut self, records: &[R]) -> StoreResult<()> {
        for record in records {
            self.upsert(record)?;
        }
        Ok(())
    }

    pub fn delete<R: Record>(&mut self, record: &R) -> StoreResult<()> {
        self.delete_by_id::<R>(record.id())
    }

    /// Deletes by key; a missing key is `NotFound`.
    pub fn delete_by_id<R: Record>(&mut self, id: &str) -> StoreResult<()> {
        if !delete_row::<R>(&self.tx, id)? {
            return Err(StoreError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            });
        }
        self.changes.record(R::KIND, id, ChangeOp::Removed);
        Ok(())
    }

    pub fn get<R: Record>(&self, id: &str) -> StoreResult<R> {
        load_one::<R>(&self.tx, id)?.ok_or_else(|| StoreError::NotFound {
            kind: R::KIND,
            id: id.to_string(),
        })
    }

    pub fn all<R: Record>(&self) -> StoreResult<Vec<R>> {
        load_all::<R>(&self.tx)
    }

    pub fn ids<R: Record>(&self) -> StoreResult<BTreeSet<String>> {
        load_ids::<R>(&self.tx)
    }

    pub fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        find_user_by_username(&self.tx, username)
    }
}

struct StoreInner {
    conn: Connection,
    commit_seq: u64,
}

/// SQLite-backed object store with change publication.
pub struct ObjectStore {
    inner: Mutex<StoreInner>,
    bus: Arc<NotificationBus>,
}

impl ObjectStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a fresh migrated in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                conn,
                commit_seq: 0,
            }),
            bus: Arc::new(NotificationBus::default()),
        }
    }

    /// Runs `f` inside one write transaction.
    ///
    /// Commits when `f` returns `Ok`, then publishes the net changes to
    /// subscribers before the writer lock is released. Any error rolls back.
    pub fn write<T>(&self, f: impl FnOnce(&mut WriteTxn<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.lock();
        let StoreInner { conn, commit_seq } = &mut *guard;

        // The transaction borrows `conn` mutably; it must be gone before publish.
        let (value, changes) = {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut txn = WriteTxn {
                tx,
                changes: ChangeLog::default(),
            };
            let value = match f(&mut txn) {
                Ok(value) => value,
                Err(err) => {
                    debug!(
                        "event=store_commit module=store status=rolled_back error_kind={}",
                        err.kind()
                    );
                    return Err(err);
                }
            };

            let WriteTxn { tx, changes } = txn;
            if let Err(err) = tx.commit() {
                warn!("event=store_commit module=store status=error error={err}");
                return Err(err.into());
            }
            (value, changes)
        };

        if !changes.is_empty() {
            *commit_seq += 1;
            debug!(
                "event=store_commit module=store status=ok commit_seq={} kinds={:?}",
                commit_seq,
                changes.kinds().collect::<Vec<_>>()
            );
            self.bus.publish(conn, *commit_seq, &changes);
        }
        Ok(value)
    }

    /// Runs read-only work against the committed state.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.lock();
        f(&guard.conn)
    }

    pub fn upsert<R: Record>(&self, record: &R) -> StoreResult<()> {
        self.write(|txn| txn.upsert(record))
    }

    /// Upserts every record in one transaction.
    pub fn upsert_all<R: Record>(&self, records: &[R]) -> StoreResult<()> {
        self.write(|txn| txn.upsert_all(records))
    }

    pub fn delete<R: Record>(&self, record: &R) -> StoreResult<()> {
        self.write(|txn| txn.delete(record))
    }

    pub fn delete_by_id<R: Record>(&self, id: &str) -> StoreResult<()> {
        self.write(|txn| txn.delete_by_id::<R>(id))
    }

    pub fn get<R: Record>(&self, id: &str) -> StoreResult<R> {
        self.read(|conn| {
            load_one::<R>(conn, id)?.ok_or_else(|| StoreError::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            })
        })
    }

    /// Returns every record of `R` in insertion order.
    pub fn all<R: Record>(&self) -> StoreResult<Vec<R>> {
        self.read(load_all::<R>)
    }

    pub fn ids<R: Record>(&self) -> StoreResult<BTreeSet<String>> {
        self.read(load_ids::<R>)
    }

    pub fn find_user_by_username(&self, username: &str) -> StoreResult<Option<UserAccount>> {
        self.read(|conn| find_user_by_username(conn, username))
    }

    /// Subscribes to the `R` collection.
    ///
    /// The returned subscription yields the current snapshot first, then one
    /// event per committed transaction touching `R`.
    pub fn subscribe<R: Record>(&self) -> StoreResult<Subscription<R>> {
        self.register(None)
    }

    /// Subscribes to the records of `R` accepted by `filter`.
    ///
    /// Snapshots only carry matching records, diffs are relative to what the
    /// subscriber saw before, and commits that change nothing visible are
    /// skipped.
    pub fn subscribe_where<R: Record>(
        &self,
        filter: impl Fn(&R) -> bool + Send + 'static,
    ) -> StoreResult<Subscription<R>> {
        self.register(Some(Box::new(filter)))
    }

    fn register<R: Record>(&self, filter: Option<RecordFilter<R>>) -> StoreResult<Subscription<R>> {
        let guard = self.lock();
        let records = load_all::<R>(&guard.conn)?;
        Ok(self.bus.register::<R>(guard.commit_seq, records, filter))
    }

    /// Number of live subscriptions on one collection.
    pub fn subscriber_count(&self, kind: RecordKind) -> usize {
        self.bus.subscriber_count(kind)
    }

    /// Sequence number of the last committed write transaction.
    pub fn commit_seq(&self) -> u64 {
        self.lock().commit_seq
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A panic mid-transaction drops the `Transaction`, which rolls back.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
