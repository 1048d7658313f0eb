use thiserror::Error;
use uuid::Uuid;

use crate::domain::{EntityKind, Operation};

/// Failure taxonomy for entity mutations and history reads.
///
/// Every variant aborts before any observable state change; only a fully
/// committed unit of work counts as a successful mutation.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("access denied: principal {actor} may not {operation} {kind}")]
    Denied {
        actor: Uuid,
        operation: Operation,
        kind: EntityKind,
    },

    /// Concurrent-mutation contention that survived the retry budget.
    #[error("concurrent mutation conflict on {kind} {id}")]
    Conflict { kind: EntityKind, id: Uuid },

    #[error("storage failure: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Wrap an opaque storage-layer error.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        CoreError::Storage(err.to_string())
    }
}
