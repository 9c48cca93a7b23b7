//! Transient record carrying step identity, checkpoint offset, and failure
//! details to the skip policy and the checkpoint store.

use serde::{Deserialize, Serialize};

use crate::error::{BatchError, ErrorKind};
use crate::models::StepContext;

/// Snapshot of one failure, created at the point of failure and consumed
/// immediately by the active skip policy. When the failure is skipped the
/// same record is persisted as one exception row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipContext {
    pub job_name: String,
    pub step_name: String,
    pub step_index: i64,
    pub error_kind: ErrorKind,
    pub message: String,
    pub detail: String,
}

impl SkipContext {
    /// Capture the failure of the chunk currently described by `ctx`.
    pub fn from_error(ctx: &StepContext, error: &BatchError) -> Self {
        let detail = match error {
            BatchError::Item {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => format!("{other:?}"),
        };
        Self {
            job_name: ctx.job_name.clone(),
            step_name: ctx.step_name.clone(),
            step_index: ctx.step_index,
            error_kind: error.kind(),
            message: error.to_string(),
            detail,
        }
    }
}
