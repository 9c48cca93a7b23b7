//! Single-shot step executing one unit of non-chunked work.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{BatchError, Result};
use crate::item::Tasklet;
use crate::models::{StepContext, StepResult};
use crate::repository::JobRepository;
use crate::step::JobStep;

/// Executes its tasklet exactly once per run. No retry or skip policy
/// applies: a failure records the attempt with `error = true` and surfaces
/// unchanged. The tasklet's resources are released when the owning job
/// graph is dropped at the end of the run.
pub struct TaskletStep {
    name: String,
    tasklet: Arc<dyn Tasklet>,
}

impl TaskletStep {
    pub fn new(name: impl Into<String>, tasklet: Arc<dyn Tasklet>) -> Self {
        Self {
            name: name.into(),
            tasklet,
        }
    }
}

#[async_trait]
impl JobStep for TaskletStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        initial: StepContext,
        repository: Arc<dyn JobRepository>,
        token: &CancellationToken,
    ) -> Result<StepResult> {
        if token.is_cancelled() {
            return Err(BatchError::Cancelled);
        }

        let step_id = repository
            .insert_step(&initial.job_name, &self.name, 0, token)
            .await?;

        match self.tasklet.execute(token).await {
            Ok(()) => {
                repository.update_step(step_id, 1, false, false, token).await?;
                info!(step = %self.name, "✅ tasklet completed");
                Ok(StepResult::completed(&self.name, 0, 1, 0))
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                repository.update_step(step_id, 0, true, false, token).await?;
                Err(err)
            }
        }
    }
}
