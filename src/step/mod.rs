//! # Step Execution
//!
//! The two step flavors and their shared contract: [`Step`] drives the
//! chunked read-process-write loop with checkpointing, retry, and skip
//! handling; [`TaskletStep`] executes one unit of work exactly once. Both
//! are assembled through [`StepBuilder`], whose typestates enforce the
//! reader-then-writer-then-settings construction order at compile time.

pub mod builder;
pub mod chunked;
pub mod tasklet;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{StepContext, StepResult};
use crate::repository::JobRepository;

pub use builder::StepBuilder;
pub use chunked::Step;
pub use tasklet::TaskletStep;

/// Common contract both step flavors implement; a job executes its steps
/// through this trait, strictly in registration order.
#[async_trait]
pub trait JobStep: Send + Sync {
    fn name(&self) -> &str;

    /// Execute the step starting from the persisted context `initial`.
    ///
    /// Returns `Err` only for fatal failures and cancellation; every other
    /// outcome is a `StepResult`.
    async fn process(
        &self,
        initial: StepContext,
        repository: Arc<dyn JobRepository>,
        token: &CancellationToken,
    ) -> Result<StepResult>;
}
