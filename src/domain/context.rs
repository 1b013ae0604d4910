//! Operation Context
//!
//! Carries the acting user and request metadata into every engine call.
//! The acting user is always explicit; the engine never reads it from
//! ambient state. The context also owns the cancellation handle: a
//! cancelled context aborts the operation before commit, leaving no
//! partial writes.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Context for a single engine operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Display name of the user performing the operation; recorded as
    /// `created_by` on every ledger entry.
    pub acting_user: String,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    #[serde(skip)]
    cancelled: Arc<AtomicBool>,
}

impl OperationContext {
    pub fn new(acting_user: impl Into<String>) -> Self {
        Self {
            acting_user: acting_user.into(),
            correlation_id: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Handle the caller keeps to request cancellation.
    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new("system")
    }
}

/// Requests cancellation of the operation holding the matching context.
/// Cancellation observed before commit rolls the whole operation back; a
/// commit already in flight is never interrupted.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
