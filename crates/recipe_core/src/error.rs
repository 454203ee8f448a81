//! Error classification shared by every core layer.
//!
//! Each module owns its own error enum; `ErrorKind` maps them onto the
//! categories consuming layers present to users.

use std::fmt::{Display, Formatter};

/// Coarse category of a core failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lookup miss.
    NotFound,
    /// Missing required field or duplicate username.
    Validation,
    /// Import batch or write references an unknown category.
    ReferentialIntegrity,
    /// Unknown user, bad credentials, no session or not the owner.
    Authentication,
    /// The medium could not open, read or commit.
    Storage,
    /// Seed source missing or unparsable.
    Import,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::ReferentialIntegrity => "referential_integrity",
            Self::Authentication => "authentication",
            Self::Storage => "storage",
            Self::Import => "import",
        };
        f.write_str(label)
    }
}
