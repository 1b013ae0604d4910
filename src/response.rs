//! Response envelope
//!
//! The single channel the surrounding API layer hands back to callers.
//! Success is defined as "no errors present": callers inspect the error
//! list, never a null check on the payload.

use serde::Serialize;

use crate::error::{AppError, ErrorKind};

/// One entry in the envelope's error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorItem {
    /// Stable machine-readable code
    pub code: String,
    /// Classification mirrored from `ErrorKind`
    pub kind: ErrorKind,
    /// Request field the error refers to, when one applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl From<&AppError> for ErrorItem {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code().to_string(),
            kind: err.kind(),
            field_name: err.field_name().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Envelope wrapping every engine result handed to the API layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub errors: Vec<ErrorItem>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    pub fn err(error: &AppError) -> Self {
        Self {
            data: None,
            errors: vec![ErrorItem::from(error)],
        }
    }

    /// Success is the absence of errors, nothing else.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<T> From<Result<T, AppError>> for ResponseEnvelope<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::err(&err),
        }
    }
}
