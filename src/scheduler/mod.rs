//! # Background Scheduler
//!
//! Runs registered jobs once at startup or repeatedly on a fixed interval,
//! independent of on-demand invocation. Each scheduled job gets its own
//! long-lived tokio worker, so distinct jobs execute concurrently while
//! every individual job run stays strictly sequential inside.
//!
//! ## Interval semantics
//!
//! `run_every` executes immediately, then waits the FULL interval measured
//! from the completion of the previous run before starting the next. A run
//! that overruns its interval therefore never overlaps with the next one.
//!
//! ## Failure semantics
//!
//! A failed scheduled run is logged and swallowed so the host keeps running
//! and the next interval retries; only cancellation propagates out of a
//! worker, which is what makes graceful shutdown possible.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{BatchError, Result};
use crate::registry::JobRunner;

/// How a registered job is driven by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    /// Only invocable on demand.
    None,
    /// Executed exactly once at scheduler startup.
    RunOnce,
    /// Executed immediately, then repeatedly with the given gap between
    /// completions.
    RunEvery(Duration),
}

/// Scheduling declaration for one job name.
///
/// `run_once` and `run_every` are mutually exclusive; whichever is called
/// last wins. Read-only after the scheduler picks it up.
#[derive(Debug, Clone)]
pub struct JobRegistration {
    job_name: String,
    mode: ScheduleMode,
}

impl JobRegistration {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            mode: ScheduleMode::None,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// Schedule one execution at startup.
    pub fn run_once(&mut self) -> &mut Self {
        self.mode = ScheduleMode::RunOnce;
        self
    }

    /// Schedule repeated execution with `interval` between completions.
    /// Rejects a zero interval.
    pub fn run_every(&mut self, interval: Duration) -> Result<&mut Self> {
        if interval.is_zero() {
            return Err(BatchError::Configuration(format!(
                "job '{}': run_every interval must be positive",
                self.job_name
            )));
        }
        self.mode = ScheduleMode::RunEvery(interval);
        Ok(self)
    }
}

/// Owns one worker task per scheduled registration.
pub struct Scheduler {
    runner: Arc<JobRunner>,
    token: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self {
            runner,
            token: CancellationToken::new(),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Token cancelled on shutdown; child tokens flow into every run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn the worker for one registration. A `None` mode spawns nothing;
    /// the job stays invocable on demand either way.
    pub fn schedule(&self, registration: &JobRegistration) {
        let runner = Arc::clone(&self.runner);
        let job_name = registration.job_name().to_string();
        let token = self.token.child_token();

        let handle = match registration.mode() {
            ScheduleMode::None => return,
            ScheduleMode::RunOnce => {
                info!(job = %job_name, "scheduling one startup run");
                tokio::spawn(run_once_worker(runner, job_name, token))
            }
            ScheduleMode::RunEvery(interval) => {
                info!(job = %job_name, interval_ms = interval.as_millis() as u64, "scheduling repeated runs");
                tokio::spawn(run_every_worker(runner, job_name, interval, token))
            }
        };
        self.workers.lock().push(handle);
    }

    /// Cancel all workers and wait for them to exit.
    pub async fn shutdown(&self) {
        self.token.cancel();
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for handle in workers {
            let _ = handle.await;
        }
        info!("scheduler shut down");
    }
}

/// Execute the job exactly once, then exit.
async fn run_once_worker(runner: Arc<JobRunner>, job_name: String, token: CancellationToken) {
    if token.is_cancelled() {
        return;
    }
    log_outcome(&job_name, runner.run(&job_name, &token).await);
}

/// Execute immediately, then loop: wait the full interval from the previous
/// completion, run again. Failures are swallowed; cancellation exits.
async fn run_every_worker(
    runner: Arc<JobRunner>,
    job_name: String,
    interval: Duration,
    token: CancellationToken,
) {
    loop {
        if token.is_cancelled() {
            return;
        }
        match runner.run(&job_name, &token).await {
            Err(err) if err.is_cancelled() => {
                info!(job = %job_name, "scheduled worker cancelled");
                return;
            }
            outcome => log_outcome(&job_name, outcome),
        }

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

fn log_outcome(job_name: &str, outcome: Result<crate::models::JobResult>) {
    match outcome {
        Ok(result) if result.success => {
            info!(
                job = %job_name,
                items_processed = result.items_processed(),
                "scheduled run completed"
            );
        }
        Ok(result) => {
            warn!(
                job = %job_name,
                steps = result.steps.len(),
                "scheduled run finished with a failed step"
            );
        }
        Err(err) => {
            error!(job = %job_name, error = %err, "scheduled run failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registrations_default_to_on_demand_only() {
        let registration = JobRegistration::new("import");
        assert_eq!(registration.mode(), ScheduleMode::None);
    }

    #[test]
    fn run_once_and_run_every_are_mutually_exclusive_last_wins() {
        let mut registration = JobRegistration::new("import");
        registration.run_once();
        assert_eq!(registration.mode(), ScheduleMode::RunOnce);

        registration
            .run_every(Duration::from_secs(30))
            .expect("positive interval");
        assert_eq!(
            registration.mode(),
            ScheduleMode::RunEvery(Duration::from_secs(30))
        );

        registration.run_once();
        assert_eq!(registration.mode(), ScheduleMode::RunOnce);
    }

    #[test]
    fn run_every_rejects_a_zero_interval() {
        let mut registration = JobRegistration::new("import");
        let err = registration.run_every(Duration::ZERO).unwrap_err();
        assert!(matches!(err, BatchError::Configuration(_)));
        assert_eq!(registration.mode(), ScheduleMode::None);
    }
}
