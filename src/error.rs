//! Error taxonomy for clinic store operations.
//!
//! Engine failures are classified by SQLite extended result code. Check
//! constraints are named `<table>_<column>_<category>`, so the category of a
//! rejected check can be read back from the engine message.

use rusqlite::ffi;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Kind of constraint a rejected write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintCategory {
    NotNull,
    Unique,
    Format,
    Enum,
    Range,
    Length,
    ForeignKey,
    Other,
}

impl ConstraintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintCategory::NotNull => "not-null",
            ConstraintCategory::Unique => "unique",
            ConstraintCategory::Format => "format",
            ConstraintCategory::Enum => "enum",
            ConstraintCategory::Range => "range",
            ConstraintCategory::Length => "length",
            ConstraintCategory::ForeignKey => "foreign-key",
            ConstraintCategory::Other => "other",
        }
    }

    /// Suffix used in check constraint names.
    pub fn check_suffix(&self) -> &'static str {
        match self {
            ConstraintCategory::Format => "format",
            ConstraintCategory::Enum => "enum",
            ConstraintCategory::Range => "range",
            ConstraintCategory::Length => "length",
            _ => "check",
        }
    }
}

impl fmt::Display for ConstraintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ClinicError {
    /// The store rejected a table definition, or an existing table does not
    /// match the declared layout.
    #[error("schema error: {reason}")]
    SchemaError { reason: String },

    #[error("{category} constraint violated on {table} ({constraint}): {detail}")]
    ConstraintViolation {
        table: String,
        constraint: String,
        category: ConstraintCategory,
        detail: String,
    },

    #[error("no {table} row with key {key}; nothing changed")]
    NotFoundNoop { table: String, key: String },

    #[error("store unavailable: {reason}")]
    StoreUnavailable {
        reason: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

pub type ClinicResult<T> = Result<T, ClinicError>;

impl ClinicError {
    pub fn violation(
        table: &str,
        constraint: impl Into<String>,
        category: ConstraintCategory,
        detail: impl Into<String>,
    ) -> Self {
        ClinicError::ConstraintViolation {
            table: table.to_string(),
            constraint: constraint.into(),
            category,
            detail: detail.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>, source: rusqlite::Error) -> Self {
        ClinicError::StoreUnavailable {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Errors that end the run instead of being reported per transaction.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ClinicError::SchemaError { .. }
                | ClinicError::StoreUnavailable { .. }
                | ClinicError::Output(_)
        )
    }

    pub fn category(&self) -> Option<ConstraintCategory> {
        match self {
            ClinicError::ConstraintViolation { category, .. } => Some(*category),
            _ => None,
        }
    }

    pub fn constraint(&self) -> Option<&str> {
        match self {
            ClinicError::ConstraintViolation { constraint, .. } => Some(constraint),
            _ => None,
        }
    }

    /// Classify an engine error raised while writing to `table`.
    pub fn from_store(table: &str, err: rusqlite::Error) -> Self {
        let (extended_code, message) = match err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                (e.extended_code, msg.unwrap_or_default())
            }
            other => return ClinicError::unavailable(format!("{} statement failed", table), other),
        };

        // Engine messages look like "UNIQUE constraint failed: Owner.ownerPhone"
        // or "CHECK constraint failed: pet_petName_format".
        let subject = message
            .split_once(": ")
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default();

        let (constraint, category) = match extended_code {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                (format!("{}_foreign_key", table.to_lowercase()), ConstraintCategory::ForeignKey)
            }
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                (subject, ConstraintCategory::Unique)
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL => (subject, ConstraintCategory::NotNull),
            ffi::SQLITE_CONSTRAINT_CHECK => {
                let category = category_of_check(&subject);
                (subject, category)
            }
            _ => (subject, ConstraintCategory::Other),
        };

        ClinicError::ConstraintViolation {
            table: table.to_string(),
            constraint,
            category,
            detail: message,
        }
    }
}

/// Read the category back from a `<table>_<column>_<category>` check name.
fn category_of_check(name: &str) -> ConstraintCategory {
    match name.rsplit('_').next() {
        Some("format") => ConstraintCategory::Format,
        Some("enum") => ConstraintCategory::Enum,
        Some("range") => ConstraintCategory::Range,
        Some("length") => ConstraintCategory::Length,
        _ => ConstraintCategory::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint_failure(extended_code: i32, message: &str) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error::new(extended_code),
            Some(message.to_string()),
        )
    }

    #[test]
    fn classifies_named_check_constraints() {
        let err = ClinicError::from_store(
            "Pet",
            constraint_failure(
                ffi::SQLITE_CONSTRAINT_CHECK,
                "CHECK constraint failed: pet_species_enum",
            ),
        );
        assert_eq!(err.category(), Some(ConstraintCategory::Enum));
        assert_eq!(err.constraint(), Some("pet_species_enum"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn classifies_unique_and_foreign_key() {
        let unique = ClinicError::from_store(
            "Owner",
            constraint_failure(
                ffi::SQLITE_CONSTRAINT_UNIQUE,
                "UNIQUE constraint failed: Owner.ownerPhone",
            ),
        );
        assert_eq!(unique.category(), Some(ConstraintCategory::Unique));
        assert_eq!(unique.constraint(), Some("Owner.ownerPhone"));

        let fk = ClinicError::from_store(
            "Staff",
            constraint_failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, "FOREIGN KEY constraint failed"),
        );
        assert_eq!(fk.category(), Some(ConstraintCategory::ForeignKey));
    }

    #[test]
    fn non_constraint_errors_are_fatal() {
        let err = ClinicError::from_store("Pet", rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_fatal());
        assert_eq!(err.category(), None);
    }
}
