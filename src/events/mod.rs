//! # Lifecycle Listener Hooks
//!
//! Optional observers notified around job and step execution. All hooks are
//! no-ops by default; after-hooks fire on success and failure paths alike
//! (a cancelled run aborts without firing further hooks).

use async_trait::async_trait;

use crate::models::{JobResult, StepResult};

/// Observer of job-level lifecycle events.
#[async_trait]
pub trait JobListener: Send + Sync {
    async fn before_job(&self, _job_name: &str) {}

    async fn after_job(&self, _result: &JobResult) {}
}

/// Observer of step-level lifecycle events.
#[async_trait]
pub trait StepListener: Send + Sync {
    async fn before_step(&self, _job_name: &str, _step_name: &str) {}

    async fn after_step(&self, _job_name: &str, _result: &StepResult) {}
}
