use sea_orm::error::{DbErr, SqlErr};
use serde::Serialize;

use crate::layout::LayoutError;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[serde(skip)] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not null violation: {0}")]
    NotNullViolation(String),

    #[error("Primary key violation: {0}")]
    PrimaryKeyViolation(String),

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Space ({x}, {y}) is outside warehouse {warehouse_id} ({width}x{height})")]
    OutOfBounds {
        warehouse_id: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Layout error: {0}")]
    Layout(
        #[from]
        #[serde(skip)]
        LayoutError,
    ),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        ServiceError::db_error(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

/// Engine messages for NOT NULL failures (SQLite, PostgreSQL).
const NOT_NULL_MARKERS: [&str; 2] = ["NOT NULL constraint failed", "violates not-null constraint"];
const UNIQUE_MARKERS: [&str; 2] = ["UNIQUE constraint failed", "duplicate key value"];
const FOREIGN_KEY_MARKERS: [&str; 2] = ["FOREIGN KEY constraint failed", "violates foreign key constraint"];

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    ///
    /// Constraint failures reported by the engine are lifted into their own
    /// variants so callers can match on them; everything else stays a
    /// `DatabaseError`.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        let err = error.into_db_err();

        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return ServiceError::PrimaryKeyViolation(msg)
            }
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return ServiceError::ForeignKeyViolation(msg)
            }
            _ => {}
        }

        let message = err.to_string();
        if NOT_NULL_MARKERS.iter().any(|m| message.contains(m)) {
            ServiceError::NotNullViolation(message)
        } else if UNIQUE_MARKERS.iter().any(|m| message.contains(m)) {
            ServiceError::PrimaryKeyViolation(message)
        } else if FOREIGN_KEY_MARKERS.iter().any(|m| message.contains(m)) {
            ServiceError::ForeignKeyViolation(message)
        } else {
            ServiceError::DatabaseError(err)
        }
    }

    /// Convenience constructor for wrapping string-based database errors.
    pub fn database_error_message(message: impl Into<String>) -> Self {
        ServiceError::db_error(message.into())
    }

    /// True when the engine rejected a write because of a declared constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::NotNullViolation(_) | Self::PrimaryKeyViolation(_) | Self::ForeignKeyViolation(_)
        )
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 3,
            Self::ValidationError(_) | Self::InvalidInput(_) | Self::Layout(_) => 2,
            Self::NotNullViolation(_)
            | Self::PrimaryKeyViolation(_)
            | Self::ForeignKeyViolation(_)
            | Self::OutOfBounds { .. }
            | Self::Conflict(_) => 4,
            Self::DatabaseError(_) | Self::MigrationError(_) | Self::Other(_) => 1,
        }
    }
}
