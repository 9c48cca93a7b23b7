//! # Job Orchestration
//!
//! A job owns an ordered collection of steps and runs them strictly
//! sequentially against a shared checkpoint store. A fatal step failure
//! halts the job (no later steps run) and the aggregated result reports
//! `success = false`; only cancellation and checkpoint-store failures
//! surface as errors to the caller.

pub mod builder;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{BatchError, Result};
use crate::events::{JobListener, StepListener};
use crate::models::{JobResult, StepResult};
use crate::repository::JobRepository;
use crate::step::JobStep;

pub use builder::JobBuilder;

/// An ordered sequence of steps executed as one unit of batch work.
///
/// A job exclusively owns its steps and repository handle for one run; a
/// fresh job/step graph is built per execution by the registered factory.
pub struct Job {
    name: String,
    steps: Vec<Box<dyn JobStep>>,
    repository: Arc<dyn JobRepository>,
    listeners: Vec<Arc<dyn JobListener>>,
    step_listeners: Vec<Arc<dyn StepListener>>,
}

impl Job {
    pub(crate) fn new(
        name: String,
        steps: Vec<Box<dyn JobStep>>,
        repository: Arc<dyn JobRepository>,
        listeners: Vec<Arc<dyn JobListener>>,
        step_listeners: Vec<Arc<dyn StepListener>>,
    ) -> Self {
        Self {
            name,
            steps,
            repository,
            listeners,
            step_listeners,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute all steps in registration order.
    ///
    /// Cancellation is checked before the run, between steps, and inside
    /// every chunk loop; it always wins over retry and skip handling and is
    /// never swallowed. Creating the job record up front both upserts the
    /// top-level row (idempotent by name) and rolls the execution scope
    /// over, resetting skip budgets.
    pub async fn run(&self, token: &CancellationToken) -> Result<JobResult> {
        if token.is_cancelled() {
            return Err(BatchError::Cancelled);
        }

        let step_names: Vec<String> = self.steps.iter().map(|s| s.name().to_string()).collect();
        self.repository
            .create_job_record(&self.name, &step_names, token)
            .await?;

        for listener in &self.listeners {
            listener.before_job(&self.name).await;
        }
        info!(job = %self.name, steps = self.steps.len(), "🚀 job starting");

        let mut results: Vec<StepResult> = Vec::with_capacity(self.steps.len());
        let mut success = true;

        for step in &self.steps {
            if token.is_cancelled() {
                return Err(BatchError::Cancelled);
            }

            for listener in &self.step_listeners {
                listener.before_step(&self.name, step.name()).await;
            }

            let initial = self
                .repository
                .get_start_index(&self.name, step.name(), token)
                .await?;
            let outcome = step
                .process(initial, Arc::clone(&self.repository), token)
                .await;

            match outcome {
                Ok(result) => {
                    for listener in &self.step_listeners {
                        listener.after_step(&self.name, &result).await;
                    }
                    results.push(result);
                }
                Err(err) if err.is_cancelled() => return Err(err),
                Err(err) => {
                    error!(job = %self.name, step = step.name(), error = %err, "❌ step failed, halting job");
                    let failed = StepResult::failed(step.name());
                    for listener in &self.step_listeners {
                        listener.after_step(&self.name, &failed).await;
                    }
                    results.push(failed);
                    success = false;
                    break;
                }
            }
        }

        let result = JobResult::new(&self.name, success, results);
        for listener in &self.listeners {
            listener.after_job(&result).await;
        }
        info!(
            job = %self.name,
            success = result.success,
            items_processed = result.items_processed(),
            errors_skipped = result.errors_skipped(),
            "job finished"
        );
        Ok(result)
    }
}
