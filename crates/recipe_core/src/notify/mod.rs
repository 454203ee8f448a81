//! Change notification bus for record collections.
//!
//! # Responsibility
//! - Deliver an initial snapshot to each new subscriber.
//! - Deliver one snapshot plus key-level diff per committed transaction.
//! - Release subscribers deterministically on unsubscribe/drop.
//!
//! # Invariants
//! - Events reach each subscriber in store commit order.
//! - `Failed` and `Closed` are terminal; the channel closes right after them.
//! - The bus never holds a sink for a dropped `Subscription`.

mod bus;
mod subscription;

pub use bus::{CollectionEvent, CollectionSnapshot, NotificationBus, RecordFilter, SubscriptionId};
pub use subscription::Subscription;
