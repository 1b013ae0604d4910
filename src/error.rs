//! Error handling module
//!
//! Centralized error type and its classification into the error kinds the
//! surrounding API layer understands. The engine never lets a persistence
//! exception escape raw: everything is funneled through `AppError` and
//! reported via the response envelope.

use serde::Serialize;

use crate::domain::DomainError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or unacceptable request input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Business-rule violation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Operation cancelled before commit; nothing was written
    #[error("Operation cancelled before commit")]
    Cancelled,

    /// Gave up after repeated version conflicts
    #[error("Maximum retries exceeded for atomic operation")]
    MaxRetriesExceeded,

    /// Unexpected persistence failure (rolled back)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row failed to convert back into a domain value
    #[error("Corrupt {entity} record: {detail}")]
    CorruptRecord { entity: &'static str, detail: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Coarse classification of an error, mirroring the HTTP statuses the
/// out-of-scope controller layer maps them to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    UnprocessableEntity,
    Conflict,
    Cancelled,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidRequest(_) => ErrorKind::BadRequest,
            AppError::Cancelled => ErrorKind::Cancelled,
            AppError::MaxRetriesExceeded => ErrorKind::Conflict,
            AppError::Domain(domain) => match domain {
                DomainError::AccountNotFound(_) => ErrorKind::NotFound,
                DomainError::SavingsLockIn => ErrorKind::UnprocessableEntity,
                DomainError::VersionConflict { .. } => ErrorKind::Conflict,
                DomainError::UnknownIban(_) => ErrorKind::UnprocessableEntity,
                _ => ErrorKind::BadRequest,
            },
            AppError::Database(_)
            | AppError::CorruptRecord { .. }
            | AppError::Internal(_)
            | AppError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Cancelled => "operation_cancelled",
            AppError::MaxRetriesExceeded => "max_retries_exceeded",
            AppError::Domain(domain) => match domain {
                DomainError::InsufficientBalance { .. } => "insufficient_balance",
                DomainError::AccountDisabled { .. } => "account_disabled",
                DomainError::AccountNotFound(_) => "account_not_found",
                DomainError::InvalidAccountKind { .. } => "invalid_account_kind",
                DomainError::InvalidAmount(_) => "invalid_amount",
                DomainError::SameAccountTransfer => "same_account_transfer",
                DomainError::RecipientNameMismatch => "recipient_name_mismatch",
                DomainError::SavingsLockIn => "savings_lock_in",
                DomainError::NotSavingsAccount => "not_savings_account",
                DomainError::VersionConflict { .. } => "version_conflict",
                DomainError::UnknownIban(_) => "unknown_iban",
            },
            AppError::Database(_) => "database_error",
            AppError::CorruptRecord { .. } => "corrupt_record",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }

    /// Request field the error refers to, when one applies.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            AppError::Domain(domain) => match domain {
                DomainError::InsufficientBalance { .. } | DomainError::InvalidAmount(_) => {
                    Some("amount")
                }
                DomainError::AccountNotFound(_)
                | DomainError::AccountDisabled { .. }
                | DomainError::UnknownIban(_) => Some("iban"),
                DomainError::RecipientNameMismatch => Some("recipientName"),
                _ => None,
            },
            _ => None,
        }
    }
}
