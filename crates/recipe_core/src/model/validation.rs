//! Field-level validation errors shared by all records.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Record content rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required string field is empty or whitespace-only.
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    /// Another account already uses this username.
    DuplicateUsername(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { record, field } => {
                write!(f, "{record}.{field} is required")
            }
            Self::DuplicateUsername(username) => {
                write!(f, "username already registered: {username}")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_field(
    record: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { record, field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require_field, ValidationError};

    #[test]
    fn whitespace_only_value_is_missing() {
        let err = require_field("recipe", "title", "  \t").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                record: "recipe",
                field: "title"
            }
        );
        assert_eq!(err.to_string(), "recipe.title is required");
    }
}
