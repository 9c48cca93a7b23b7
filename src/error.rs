//! # Structured Error Handling
//!
//! Central error type for the batch engine plus the closed set of error
//! kinds that skip and retry policies match on.
//!
//! Policies never inspect concrete error types at runtime; every failure
//! carries an [`ErrorKind`] tag and the policies decide on that tag alone.

use serde::{Deserialize, Serialize};

/// Closed classification of batch failures used by skip/retry matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// I/O failure while reading from a source or writing to a sink
    Io,
    /// Malformed or otherwise unprocessable item data
    Data,
    /// Transient failure expected to succeed on a later attempt
    Transient,
    /// Checkpoint store failure
    Repository,
    /// Cooperative cancellation of the run
    Cancelled,
    /// Anything that does not fit the categories above
    Other,
}

/// Errors surfaced by the batch engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchError {
    /// Failure raised by a reader, processor, or writer for one chunk.
    #[error("item error ({kind:?}): {message}")]
    Item {
        kind: ErrorKind,
        message: String,
        detail: Option<String>,
    },

    /// Checkpoint store failure.
    #[error("repository error: {0}")]
    Repository(String),

    /// Invalid engine, step, or policy configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Requested job name has no registered factory.
    #[error("job '{0}' is not registered")]
    UnknownJob(String),

    /// The run was cancelled by its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}

impl BatchError {
    /// Build an item-level error with the given kind and message.
    pub fn item(kind: ErrorKind, message: impl Into<String>) -> Self {
        BatchError::Item {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    /// Build an item-level error carrying extra diagnostic detail.
    pub fn item_with_detail(
        kind: ErrorKind,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        BatchError::Item {
            kind,
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// The classification used by skip and retry policies.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatchError::Item { kind, .. } => *kind,
            BatchError::Repository(_) => ErrorKind::Repository,
            BatchError::Cancelled => ErrorKind::Cancelled,
            BatchError::Configuration(_) | BatchError::UnknownJob(_) => ErrorKind::Other,
        }
    }

    /// True when the error represents cooperative cancellation.
    ///
    /// Cancellation is never retried or skipped; callers check this before
    /// consulting any policy.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, BatchError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_errors_carry_their_kind() {
        let err = BatchError::item(ErrorKind::Transient, "connection reset");
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(!err.is_cancelled());
    }

    #[test]
    fn cancellation_is_its_own_kind() {
        let err = BatchError::Cancelled;
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(err.is_cancelled());
    }

    #[test]
    fn repository_errors_map_to_repository_kind() {
        let err = BatchError::Repository("row not found".to_string());
        assert_eq!(err.kind(), ErrorKind::Repository);
    }
}
