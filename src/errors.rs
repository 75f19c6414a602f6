/*!
 * Error types for the orm-sandbox application.
 *
 * This module contains custom error types for the database layer and the
 * application shell, using the thiserror crate for ergonomic error definitions.
 */

use rusqlite::ffi;
use std::fmt;
use thiserror::Error;

/// Category of an integrity constraint reported by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Primary key collision
    PrimaryKey,
    /// Unique constraint collision
    Unique,
    /// CHECK expression evaluated to false
    Check,
    /// NULL written into a NOT NULL column
    NotNull,
    /// Any other constraint family (foreign key, trigger, ...)
    Other,
}

impl ConstraintKind {
    fn from_extended_code(code: i32) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::PrimaryKey,
            ffi::SQLITE_CONSTRAINT_UNIQUE => Self::Unique,
            ffi::SQLITE_CONSTRAINT_CHECK => Self::Check,
            ffi::SQLITE_CONSTRAINT_NOTNULL => Self::NotNull,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::PrimaryKey => write!(f, "PRIMARY KEY"),
            ConstraintKind::Unique => write!(f, "UNIQUE"),
            ConstraintKind::Check => write!(f, "CHECK"),
            ConstraintKind::NotNull => write!(f, "NOT NULL"),
            ConstraintKind::Other => write!(f, "integrity"),
        }
    }
}

/// Errors raised by the database layer
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// A write was rejected by a declared constraint
    #[error("{kind} constraint failed: {constraint}")]
    ConstraintViolation {
        /// Family of the violated constraint
        kind: ConstraintKind,
        /// Constraint name or offending column as reported by SQLite
        constraint: String,
    },

    /// The object has no identity in the store yet
    #[error("Student is not persistent: {0}")]
    NotPersistent(String),

    /// Increment applied to a column that does not hold integers
    #[error("Cannot increment non-integer column: {0}")]
    InvalidAssignment(String),

    /// A set-based update was issued without any assignment
    #[error("Update requires at least one assignment")]
    EmptyAssignment,

    /// Any other SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl DatabaseError {
    /// Whether this error is a constraint violation of the given kind
    pub fn is_constraint(&self, expected: ConstraintKind) -> bool {
        matches!(self, DatabaseError::ConstraintViolation { kind, .. } if *kind == expected)
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(error: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = error {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                let constraint = message
                    .as_deref()
                    .and_then(|m| m.split_once(": "))
                    .map(|(_, name)| name.trim().to_string())
                    .unwrap_or_default();

                return DatabaseError::ConstraintViolation {
                    kind: ConstraintKind::from_extended_code(failure.extended_code),
                    constraint,
                };
            }
        }

        DatabaseError::Sqlite(error)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the database layer
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<DatabaseError>() {
            Ok(db_error) => Self::Database(db_error),
            Err(other) => Self::Unknown(format!("{:#}", other)),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
