use crate::notify::bus::{CollectionEvent, NotificationBus, SubscriptionId};
use crate::store::RecordKind;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Weak;
use std::time::Duration;

/// Consumer-owned handle on a collection stream.
///
/// Events are queued asynchronously relative to the writes that produce
/// them; consumers receive on whatever thread they choose. Dropping the
/// handle unsubscribes.
pub struct Subscription<R> {
    id: SubscriptionId,
    kind: RecordKind,
    receiver: Receiver<CollectionEvent<R>>,
    bus: Weak<NotificationBus>,
}

impl<R> Subscription<R> {
    pub(crate) fn new(
        id: SubscriptionId,
        kind: RecordKind,
        receiver: Receiver<CollectionEvent<R>>,
        bus: Weak<NotificationBus>,
    ) -> Self {
        Self {
            id,
            kind,
            receiver,
            bus,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Blocks until the next event.
    ///
    /// Dropping the store queues a final `Closed` event; after any terminal
    /// event this returns `None`.
    pub fn recv(&self) -> Option<CollectionEvent<R>> {
        self.receiver.recv().ok()
    }

    /// Returns the next queued event without blocking.
    pub fn try_recv(&self) -> Option<CollectionEvent<R>> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CollectionEvent<R>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains every event queued so far.
    pub fn drain(&self) -> Vec<CollectionEvent<R>> {
        self.receiver.try_iter().collect()
    }

    /// Stops delivery. Queued events are discarded with the handle.
    pub fn unsubscribe(self) {}
}

impl<R> Drop for Subscription<R> {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.kind, self.id);
        }
    }
}
