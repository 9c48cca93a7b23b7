//! # Job Registry and Runner
//!
//! Named job factories and on-demand execution. A factory builds a fresh
//! job/step graph for every run, so no mutable state leaks between
//! executions of the same job name.

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{BatchError, Result};
use crate::job::Job;
use crate::models::JobResult;

/// Builds a fresh job graph for one execution.
pub type JobFactory = Arc<dyn Fn() -> Job + Send + Sync>;

/// Concurrent name-to-factory map shared by the runner and the scheduler.
#[derive(Default)]
pub struct JobRegistry {
    factories: DashMap<String, JobFactory>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous registration.
    pub fn register(&self, name: impl Into<String>, factory: JobFactory) {
        let name = name.into();
        info!(job = %name, "job registered");
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Names of all registered jobs, for diagnostics.
    pub fn registered_jobs(&self) -> Vec<String> {
        self.factories.iter().map(|e| e.key().clone()).collect()
    }

    /// Build a fresh job graph for `name`.
    pub fn create(&self, name: &str) -> Result<Job> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| BatchError::UnknownJob(name.to_string()))?;
        Ok(factory())
    }
}

/// Resolves a named job factory and executes the job with a fresh graph.
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<JobRegistry>,
}

impl JobRunner {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Build and run the job registered under `job_name`.
    pub async fn run(&self, job_name: &str, token: &CancellationToken) -> Result<JobResult> {
        let job = self.registry.create(job_name)?;
        job.run(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn running_an_unknown_job_is_an_error() {
        let runner = JobRunner::new(Arc::new(JobRegistry::new()));
        let token = CancellationToken::new();
        let err = runner.run("missing", &token).await.unwrap_err();
        assert!(matches!(err, BatchError::UnknownJob(name) if name == "missing"));
    }

    #[test]
    fn registry_reports_registered_names() {
        let registry = JobRegistry::new();
        assert!(!registry.contains("import"));
        assert!(registry.registered_jobs().is_empty());
    }
}
