//! Scheduler semantics: run-once, non-overlapping run-every intervals
//! measured from completion, swallowed failures, and graceful shutdown.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use batch_core::{
    BatchError, ErrorKind, InMemoryRepository, JobBuilder, JobFactory, JobRegistration,
    JobRegistry, JobRunner, Result, Scheduler, Tasklet, TaskletStep,
};
use tokio_util::sync::CancellationToken;

/// Tasklet that tracks run count and flags any overlapping execution.
struct TrackingTasklet {
    runs: AtomicU32,
    active: AtomicU32,
    overlapped: AtomicBool,
    hold: Duration,
    fail: bool,
}

impl TrackingTasklet {
    fn new(hold: Duration, fail: bool) -> Self {
        Self {
            runs: AtomicU32::new(0),
            active: AtomicU32::new(0),
            overlapped: AtomicBool::new(false),
            hold,
            fail,
        }
    }

    fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }

    fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tasklet for TrackingTasklet {
    async fn execute(&self, _token: &CancellationToken) -> Result<()> {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(self.hold).await;
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);
        if self.fail {
            return Err(BatchError::item(ErrorKind::Other, "scripted failure"));
        }
        Ok(())
    }
}

fn tasklet_job_factory(
    name: &'static str,
    repository: Arc<InMemoryRepository>,
    tasklet: Arc<TrackingTasklet>,
) -> JobFactory {
    Arc::new(move || {
        JobBuilder::new(name)
            .repository(Arc::clone(&repository) as Arc<dyn batch_core::JobRepository>)
            .start(TaskletStep::new("work", Arc::clone(&tasklet) as Arc<dyn Tasklet>))
            .build()
            .expect("valid job")
    })
}

fn runner_with(name: &'static str, tasklet: Arc<TrackingTasklet>) -> Arc<JobRunner> {
    let repository = Arc::new(InMemoryRepository::new());
    let registry = Arc::new(JobRegistry::new());
    registry.register(name, tasklet_job_factory(name, repository, tasklet));
    Arc::new(JobRunner::new(registry))
}

#[tokio::test]
async fn run_once_executes_once_and_stays_invocable_on_demand() {
    let tasklet = Arc::new(TrackingTasklet::new(Duration::from_millis(1), false));
    let runner = runner_with("startup", Arc::clone(&tasklet));
    let scheduler = Scheduler::new(Arc::clone(&runner));

    let mut registration = JobRegistration::new("startup");
    registration.run_once();
    scheduler.schedule(&registration);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(tasklet.runs(), 1);

    // The worker has exited but the job is still callable on demand.
    let result = runner
        .run("startup", &CancellationToken::new())
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(tasklet.runs(), 2);

    scheduler.shutdown().await;
    assert_eq!(tasklet.runs(), 2);
}

#[tokio::test]
async fn run_every_waits_the_full_interval_from_completion() {
    // Each run holds longer than the interval; intervals measured from
    // completion mean runs can never overlap.
    let tasklet = Arc::new(TrackingTasklet::new(Duration::from_millis(60), false));
    let runner = runner_with("periodic", Arc::clone(&tasklet));
    let scheduler = Scheduler::new(runner);

    let mut registration = JobRegistration::new("periodic");
    registration.run_every(Duration::from_millis(40)).unwrap();
    scheduler.schedule(&registration);

    // Runs complete at roughly t=60, t=160, t=260.
    tokio::time::sleep(Duration::from_millis(300)).await;
    scheduler.shutdown().await;

    let runs = tasklet.runs();
    assert!(!tasklet.overlapped());
    assert!((2..=4).contains(&runs), "expected 2-4 runs, got {runs}");
}

#[tokio::test]
async fn failed_scheduled_runs_are_swallowed_and_retried() {
    let tasklet = Arc::new(TrackingTasklet::new(Duration::from_millis(1), true));
    let runner = runner_with("flaky", Arc::clone(&tasklet));
    let scheduler = Scheduler::new(runner);

    let mut registration = JobRegistration::new("flaky");
    registration.run_every(Duration::from_millis(20)).unwrap();
    scheduler.schedule(&registration);

    tokio::time::sleep(Duration::from_millis(150)).await;
    scheduler.shutdown().await;

    // The worker kept rescheduling despite every run failing.
    assert!(tasklet.runs() >= 2);
}

#[tokio::test]
async fn shutdown_stops_scheduled_workers() {
    let tasklet = Arc::new(TrackingTasklet::new(Duration::from_millis(1), false));
    let runner = runner_with("stoppable", Arc::clone(&tasklet));
    let scheduler = Scheduler::new(runner);

    let mut registration = JobRegistration::new("stoppable");
    registration.run_every(Duration::from_millis(20)).unwrap();
    scheduler.schedule(&registration);

    tokio::time::sleep(Duration::from_millis(70)).await;
    scheduler.shutdown().await;
    let runs_at_shutdown = tasklet.runs();
    assert!(runs_at_shutdown >= 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(tasklet.runs(), runs_at_shutdown);
}

#[tokio::test]
async fn unscheduled_registrations_spawn_no_worker() {
    let tasklet = Arc::new(TrackingTasklet::new(Duration::from_millis(1), false));
    let runner = runner_with("on-demand", Arc::clone(&tasklet));
    let scheduler = Scheduler::new(runner);

    scheduler.schedule(&JobRegistration::new("on-demand"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    scheduler.shutdown().await;
    assert_eq!(tasklet.runs(), 0);
}
