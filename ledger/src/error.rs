//! Error handling for the Stockflow ledger engine
//!
//! Services return [`AppError`] through the [`AppResult`] alias. Callers
//! that need a wire-friendly payload convert with [`AppError::detail`];
//! database and internal causes are reported generically there and kept in
//! the logs.

use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Cannot remove {requested} from '{item}': only {available} in stock")]
    InsufficientStock {
        item: String,
        requested: i64,
        available: i64,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    Unexpected(#[from] anyhow::Error),
}

/// Error payload handed to callers (web handlers, import UI)
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Convenience constructor for field-level validation failures.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Structured payload for the caller.
    pub fn detail(&self) -> ErrorDetail {
        match self {
            AppError::Validation { field, message } => ErrorDetail {
                code: "VALIDATION_ERROR".to_string(),
                message: message.clone(),
                field: Some(field.clone()),
            },
            AppError::InsufficientStock { .. } => ErrorDetail {
                code: "INSUFFICIENT_STOCK".to_string(),
                message: self.to_string(),
                field: Some("quantity".to_string()),
            },
            AppError::DuplicateEntry(field) => ErrorDetail {
                code: "DUPLICATE_ENTRY".to_string(),
                message: format!("A record with this {} already exists", field),
                field: Some(field.clone()),
            },
            AppError::NotFound(resource) => ErrorDetail {
                code: "NOT_FOUND".to_string(),
                message: format!("{} not found", resource),
                field: None,
            },
            AppError::Database(_) => ErrorDetail {
                code: "DATABASE_ERROR".to_string(),
                message: "A database error occurred".to_string(),
                field: None,
            },
            AppError::Internal(_) | AppError::Unexpected(_) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: "An internal error occurred".to_string(),
                field: None,
            },
        }
    }
}

/// Map a `validator` failure onto the first offending field.
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        for (field, field_errors) in errors.field_errors() {
            if let Some(error) = field_errors.first() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                return AppError::validation(field, message);
            }
        }
        AppError::validation("input", "Invalid input")
    }
}

/// True when the database rejected a statement on a unique constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// True when the database rejected a statement on a foreign key constraint.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}

/// Result type alias for services
pub type AppResult<T> = Result<T, AppError>;
