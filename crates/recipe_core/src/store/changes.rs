//! Per-transaction change tracking.
//!
//! # Invariants
//! - Multiple writes to one key inside a transaction coalesce into a single
//!   net change relative to the state before the transaction.
//! - Keys keep the order in which the transaction first touched them.

use crate::store::record::RecordKind;
use std::collections::BTreeMap;

/// Keys affected by one committed transaction within one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDiff {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

impl CollectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeOp {
    Added,
    Updated,
    Removed,
}

#[derive(Debug, Default)]
pub(crate) struct ChangeLog {
    entries: BTreeMap<RecordKind, Vec<(String, ChangeOp)>>,
}

impl ChangeLog {
    pub(crate) fn record(&mut self, kind: RecordKind, id: &str, op: ChangeOp) {
        let entries = self.entries.entry(kind).or_default();
        let Some(position) = entries.iter().position(|(key, _)| key == id) else {
            entries.push((id.to_string(), op));
            return;
        };

        let merged = match (entries[position].1, op) {
            (ChangeOp::Added, ChangeOp::Removed) => None,
            (ChangeOp::Added, _) => Some(ChangeOp::Added),
            (ChangeOp::Removed, ChangeOp::Added | ChangeOp::Updated) => Some(ChangeOp::Updated),
            (_, next) => Some(next),
        };
        match merged {
            Some(op) => entries[position].1 = op,
            None => {
                entries.remove(position);
            }
        }
        if entries.is_empty() {
            self.entries.remove(&kind);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn kinds(&self) -> impl Iterator<Item = RecordKind> + '_ {
        self.entries.keys().copied()
    }

    pub(crate) fn diff(&self, kind: RecordKind) -> CollectionDiff {
        let mut diff = CollectionDiff::default();
        for (id, op) in self.entries.get(&kind).into_iter().flatten() {
            match op {
                ChangeOp::Added => diff.added.push(id.clone()),
                ChangeOp::Updated => diff.updated.push(id.clone()),
                ChangeOp::Removed => diff.removed.push(id.clone()),
            }
        }
        diff
    }
}
