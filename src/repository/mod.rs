//! # Checkpoint Store Boundary
//!
//! Async traits over the durable progress store. The engine records every
//! chunk attempt here: a progress row is pre-registered before the chunk
//! runs (so a crash mid-chunk still leaves a trace) and updated with the
//! outcome afterwards, and skipped failures are persisted as exception rows
//! scoped to the current execution.
//!
//! ## Logical schema
//!
//! ```text
//! Jobs(job_name PK, create_date, last_run)
//! Steps(id PK, step_name, job_name, step_index, items_processed, error, skipped)
//! StepExceptions(id PK, step_index, step_name, job_name, message, detail)
//! ```
//!
//! Exception rows carry an execution marker so that each fresh run's skip
//! budget is independent of prior runs; the observable contract is "the skip
//! budget resets on every job run".
//!
//! Concrete relational implementations live outside this crate; the bundled
//! [`InMemoryRepository`] serves embedded use and the test suites.

pub mod memory;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{SkipContext, StepContext};

pub use memory::InMemoryRepository;

/// Step-scoped checkpoint operations.
#[async_trait]
pub trait StepRepository: Send + Sync {
    /// Pre-register a chunk attempt at `step_index` and return its row id.
    ///
    /// Called before the chunk executes so a progress row exists even if the
    /// process crashes mid-chunk.
    async fn insert_step(
        &self,
        job_name: &str,
        step_name: &str,
        step_index: i64,
        token: &CancellationToken,
    ) -> Result<i64>;

    /// Record the outcome of a chunk attempt; always called exactly once per
    /// resolved chunk, whatever the outcome.
    async fn update_step(
        &self,
        step_id: i64,
        items_processed: usize,
        error: bool,
        skipped: bool,
        token: &CancellationToken,
    ) -> Result<()>;

    /// Number of exceptions already absorbed for this (job, step) pair
    /// within the current execution.
    async fn get_exception_count(
        &self,
        skip_context: &SkipContext,
        token: &CancellationToken,
    ) -> Result<u32>;

    /// Persist one skipped failure; `count` is the budget consumption after
    /// this skip.
    async fn save_exception_info(
        &self,
        skip_context: &SkipContext,
        count: u32,
        token: &CancellationToken,
    ) -> Result<()>;
}

/// Job-scoped checkpoint operations, extending the step boundary.
#[async_trait]
pub trait JobRepository: StepRepository {
    /// Upsert the job's top-level record, idempotent by job name.
    ///
    /// Called once at the start of every run; this is also the point where
    /// the execution scope rolls over and skip budgets reset.
    async fn create_job_record(
        &self,
        job_name: &str,
        step_names: &[String],
        token: &CancellationToken,
    ) -> Result<()>;

    /// Last persisted checkpoint context for a step, or a fresh zero context
    /// when the step has never recorded progress.
    async fn get_start_index(
        &self,
        job_name: &str,
        step_name: &str,
        token: &CancellationToken,
    ) -> Result<StepContext>;
}
