//! In-memory checkpoint store.
//!
//! Complete [`JobRepository`] implementation over the logical schema, used
//! for embedded runs and the test suites. State is owned by the instance;
//! there is no process-wide cache, so concurrent tests and concurrent job
//! instances never share hidden state.
//!
//! Operations here are instantaneous, so the cancellation token is not
//! consulted; stores doing real I/O use it to abandon long-running calls.
//! Outcome updates for completed work always land either way, keeping the
//! persisted position aligned with the work actually applied.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{BatchError, Result};
use crate::models::{SkipContext, StepContext};
use crate::repository::{JobRepository, StepRepository};

#[derive(Debug, Clone)]
struct JobRow {
    create_date: DateTime<Utc>,
    last_run: DateTime<Utc>,
    /// Rolls over on every `create_job_record`; exception rows are tagged
    /// with it so skip budgets reset per run.
    execution_id: Uuid,
}

#[derive(Debug, Clone)]
struct StepRow {
    id: i64,
    job_name: String,
    step_name: String,
    step_index: i64,
    items_processed: usize,
    error: bool,
    skipped: bool,
}

impl StepRow {
    /// Pre-registered rows that were never updated with progress, an error,
    /// or a skip are crash/end-of-data markers and do not participate in
    /// restart positioning.
    fn is_checkpoint(&self) -> bool {
        self.items_processed > 0 || self.error || self.skipped
    }
}

#[derive(Debug, Clone)]
struct ExceptionRow {
    execution_id: Uuid,
    job_name: String,
    step_name: String,
    #[allow(dead_code)]
    step_index: i64,
    #[allow(dead_code)]
    message: String,
    #[allow(dead_code)]
    detail: String,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<String, JobRow>,
    steps: Vec<StepRow>,
    exceptions: Vec<ExceptionRow>,
    next_step_id: i64,
}

/// Instance-owned, mutex-guarded store. Rows are small and operations are
/// O(rows), which is ample for embedded and test workloads.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all persisted state. Explicit reset hook for tests that reuse
    /// one instance across scenarios.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
    }

    fn current_execution(&self, job_name: &str) -> Result<Uuid> {
        let inner = self.inner.lock();
        inner
            .jobs
            .get(job_name)
            .map(|row| row.execution_id)
            .ok_or_else(|| BatchError::Repository(format!("job '{job_name}' has no record")))
    }
}

#[async_trait]
impl StepRepository for InMemoryRepository {
    async fn insert_step(
        &self,
        job_name: &str,
        step_name: &str,
        step_index: i64,
        _token: &CancellationToken,
    ) -> Result<i64> {
        let mut inner = self.inner.lock();
        inner.next_step_id += 1;
        let id = inner.next_step_id;
        inner.steps.push(StepRow {
            id,
            job_name: job_name.to_string(),
            step_name: step_name.to_string(),
            step_index,
            items_processed: 0,
            error: false,
            skipped: false,
        });
        Ok(id)
    }

    async fn update_step(
        &self,
        step_id: i64,
        items_processed: usize,
        error: bool,
        skipped: bool,
        _token: &CancellationToken,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let row = inner
            .steps
            .iter_mut()
            .find(|row| row.id == step_id)
            .ok_or_else(|| BatchError::Repository(format!("unknown step row {step_id}")))?;
        row.items_processed = items_processed;
        row.error = error;
        row.skipped = skipped;
        Ok(())
    }

    async fn get_exception_count(
        &self,
        skip_context: &SkipContext,
        _token: &CancellationToken,
    ) -> Result<u32> {
        let execution_id = self.current_execution(&skip_context.job_name)?;
        let inner = self.inner.lock();
        let count = inner
            .exceptions
            .iter()
            .filter(|row| {
                row.execution_id == execution_id
                    && row.job_name == skip_context.job_name
                    && row.step_name == skip_context.step_name
            })
            .count();
        Ok(count as u32)
    }

    async fn save_exception_info(
        &self,
        skip_context: &SkipContext,
        _count: u32,
        _token: &CancellationToken,
    ) -> Result<()> {
        let execution_id = self.current_execution(&skip_context.job_name)?;
        let mut inner = self.inner.lock();
        inner.exceptions.push(ExceptionRow {
            execution_id,
            job_name: skip_context.job_name.clone(),
            step_name: skip_context.step_name.clone(),
            step_index: skip_context.step_index,
            message: skip_context.message.clone(),
            detail: skip_context.detail.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl JobRepository for InMemoryRepository {
    async fn create_job_record(
        &self,
        job_name: &str,
        _step_names: &[String],
        _token: &CancellationToken,
    ) -> Result<()> {
        let now = Utc::now();
        let mut inner = self.inner.lock();
        inner
            .jobs
            .entry(job_name.to_string())
            .and_modify(|row| {
                row.last_run = now;
                row.execution_id = Uuid::new_v4();
            })
            .or_insert_with(|| JobRow {
                create_date: now,
                last_run: now,
                execution_id: Uuid::new_v4(),
            });
        Ok(())
    }

    async fn get_start_index(
        &self,
        job_name: &str,
        step_name: &str,
        _token: &CancellationToken,
    ) -> Result<StepContext> {
        let inner = self.inner.lock();
        let last = inner
            .steps
            .iter()
            .filter(|row| {
                row.job_name == job_name && row.step_name == step_name && row.is_checkpoint()
            })
            .last();

        let mut ctx = StepContext::new(job_name, step_name);
        if let Some(row) = last {
            ctx.step_index = row.step_index;
            ctx.items_processed = row.items_processed;
            ctx.error = row.error;
            ctx.skip = row.skipped;
        }
        Ok(ctx)
    }
}
