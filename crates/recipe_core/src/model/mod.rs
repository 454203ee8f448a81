//! Domain records persisted by the object store.
//!
//! # Responsibility
//! - Define the canonical record shapes for categories, recipes and accounts.
//! - Provide constructors and field-level validation shared by write paths.
//!
//! # Invariants
//! - Every record is identified by an immutable string primary key.
//! - Records are plain values; persistence lives in `crate::store`.

pub mod category;
pub mod recipe;
pub mod user;
pub mod validation;

/// Reserved owner identifier whose recipes are visible to every user.
///
/// Never reconciled with registered accounts.
pub const SHARED_OWNER_ID: &str = "user-123";
