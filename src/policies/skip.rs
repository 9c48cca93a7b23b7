//! Budgeted skipping of failed chunks.
//!
//! A skip policy tolerates a bounded number of pre-registered failure kinds
//! within one execution. The count lives in the checkpoint store and is
//! scoped to the current run, so a restarted job always starts with a fresh
//! budget even against the same store and job name.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::BatchConfig;
use crate::error::{ErrorKind, Result};
use crate::models::SkipContext;
use crate::repository::StepRepository;

/// Immutable skip decision object.
///
/// The fail-fast default tolerates nothing: any unhandled failure is fatal
/// unless skipping was explicitly configured with both a kind and a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipPolicy {
    skippable: HashSet<ErrorKind>,
    limit: u32,
}

impl SkipPolicy {
    /// Policy that never skips; the engine default.
    pub fn none() -> Self {
        Self {
            skippable: HashSet::new(),
            limit: 0,
        }
    }

    /// Policy tolerating up to `limit` skipped failures per execution.
    pub fn new(limit: u32) -> Self {
        Self {
            skippable: HashSet::new(),
            limit,
        }
    }

    /// Policy derived from engine configuration: malformed data only.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(config.skip_limit).skip_on(ErrorKind::Data)
    }

    /// Mark an error kind as skippable. Cancellation is refused even if
    /// registered here.
    #[must_use]
    pub fn skip_on(mut self, kind: ErrorKind) -> Self {
        self.skippable.insert(kind);
        self
    }

    /// Decide whether the failure described by `skip_context` is absorbed.
    ///
    /// Queries the current execution's exception count for this (job, step)
    /// pair; when the failure kind is skippable and the budget is not
    /// exhausted, persists the exception row and returns `true`. Any `false`
    /// means the caller must treat the failure as fatal.
    pub async fn is_satisfied_by(
        &self,
        repository: &dyn StepRepository,
        skip_context: &SkipContext,
        token: &CancellationToken,
    ) -> Result<bool> {
        if self.limit == 0 || self.skippable.is_empty() {
            return Ok(false);
        }
        if skip_context.error_kind == ErrorKind::Cancelled
            || !self.skippable.contains(&skip_context.error_kind)
        {
            return Ok(false);
        }

        let count = repository.get_exception_count(skip_context, token).await?;
        if count >= self.limit {
            warn!(
                job = %skip_context.job_name,
                step = %skip_context.step_name,
                count,
                limit = self.limit,
                "skip budget exhausted, failure becomes fatal"
            );
            return Ok(false);
        }

        repository
            .save_exception_info(skip_context, count + 1, token)
            .await?;
        debug!(
            job = %skip_context.job_name,
            step = %skip_context.step_name,
            step_index = skip_context.step_index,
            used = count + 1,
            limit = self.limit,
            "chunk failure skipped"
        );
        Ok(true)
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchError;
    use crate::models::StepContext;
    use crate::repository::{InMemoryRepository, JobRepository};

    fn skip_context(kind: ErrorKind) -> SkipContext {
        let ctx = StepContext::new("job", "step");
        SkipContext::from_error(&ctx, &BatchError::item(kind, "boom"))
    }

    async fn fresh_repo() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        let token = CancellationToken::new();
        repo.create_job_record("job", &["step".to_string()], &token)
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn default_policy_fails_fast() {
        let repo = fresh_repo().await;
        let token = CancellationToken::new();
        let satisfied = SkipPolicy::none()
            .is_satisfied_by(&repo, &skip_context(ErrorKind::Data), &token)
            .await
            .unwrap();
        assert!(!satisfied);
    }

    #[tokio::test]
    async fn zero_limit_never_skips_even_with_kinds() {
        let repo = fresh_repo().await;
        let token = CancellationToken::new();
        let policy = SkipPolicy::new(0).skip_on(ErrorKind::Data);
        let satisfied = policy
            .is_satisfied_by(&repo, &skip_context(ErrorKind::Data), &token)
            .await
            .unwrap();
        assert!(!satisfied);
    }

    #[tokio::test]
    async fn unregistered_kind_is_fatal() {
        let repo = fresh_repo().await;
        let token = CancellationToken::new();
        let policy = SkipPolicy::new(3).skip_on(ErrorKind::Data);
        let satisfied = policy
            .is_satisfied_by(&repo, &skip_context(ErrorKind::Io), &token)
            .await
            .unwrap();
        assert!(!satisfied);
    }

    #[tokio::test]
    async fn cancellation_is_never_skipped() {
        let repo = fresh_repo().await;
        let token = CancellationToken::new();
        let policy = SkipPolicy::new(3).skip_on(ErrorKind::Cancelled);
        let satisfied = policy
            .is_satisfied_by(&repo, &skip_context(ErrorKind::Cancelled), &token)
            .await
            .unwrap();
        assert!(!satisfied);
    }

    #[tokio::test]
    async fn budget_is_consumed_then_exhausted() {
        let repo = fresh_repo().await;
        let token = CancellationToken::new();
        let policy = SkipPolicy::new(2).skip_on(ErrorKind::Data);
        let ctx = skip_context(ErrorKind::Data);

        assert!(policy.is_satisfied_by(&repo, &ctx, &token).await.unwrap());
        assert!(policy.is_satisfied_by(&repo, &ctx, &token).await.unwrap());
        assert!(!policy.is_satisfied_by(&repo, &ctx, &token).await.unwrap());
    }

    #[tokio::test]
    async fn budget_resets_on_a_new_execution() {
        let repo = fresh_repo().await;
        let token = CancellationToken::new();
        let policy = SkipPolicy::new(1).skip_on(ErrorKind::Data);
        let ctx = skip_context(ErrorKind::Data);

        assert!(policy.is_satisfied_by(&repo, &ctx, &token).await.unwrap());
        assert!(!policy.is_satisfied_by(&repo, &ctx, &token).await.unwrap());

        // A new run of the same job against the same store starts fresh.
        repo.create_job_record("job", &["step".to_string()], &token)
            .await
            .unwrap();
        assert!(policy.is_satisfied_by(&repo, &ctx, &token).await.unwrap());
    }
}
