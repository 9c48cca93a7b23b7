#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Batch Core
//!
//! Chunk-oriented batch-processing engine: jobs composed of ordered steps,
//! each step pulling items from a source, transforming them, and writing
//! them to a sink in bounded chunks, while durably recording progress so a
//! crashed or failed job resumes from its last committed chunk instead of
//! reprocessing everything.
//!
//! ## Architecture
//!
//! - **Chunk loop**: every chunk pre-registers a progress row, runs
//!   read-process-write, then records its outcome; chunk N's checkpoint
//!   write happens before chunk N+1's read.
//! - **Restart arithmetic**: [`models::StepContext`] distinguishes a true
//!   failure (roll the checkpoint back one chunk) from an intentional skip
//!   (never roll back).
//! - **Policies**: [`policies::RetryPolicy`] re-runs a failed chunk in
//!   place; [`policies::SkipPolicy`] abandons it against a per-execution
//!   budget held in the checkpoint store.
//! - **Orchestration**: a [`job::Job`] runs steps strictly sequentially;
//!   the [`scheduler::Scheduler`] drives registered jobs once or on a fixed
//!   interval on their own workers.
//!
//! ## Module Organization
//!
//! - [`models`] - Checkpoint context, skip context, and result value types
//! - [`item`] - Reader/processor/writer/tasklet collaborator traits
//! - [`policies`] - Skip and retry decision objects
//! - [`step`] - Chunked and tasklet steps plus the staged step builder
//! - [`job`] - Job orchestration and assembly
//! - [`registry`] - Named job factories and the on-demand runner
//! - [`scheduler`] - Background workers for scheduled jobs
//! - [`repository`] - Checkpoint-store boundary and the in-memory store
//! - [`events`] - Optional job/step lifecycle listeners
//! - [`config`] - Engine configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use batch_core::{InMemoryRepository, JobBuilder, StepBuilder};
//! use batch_core::test_helpers::{CollectingWriter, VecReader};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> batch_core::Result<()> {
//! let repository = Arc::new(InMemoryRepository::new());
//! let step = StepBuilder::new("copy")
//!     .reader(Arc::new(VecReader::new(vec![1, 2, 3])))
//!     .writer(Arc::new(CollectingWriter::new()))
//!     .chunk_size(2)
//!     .build()?;
//! let job = JobBuilder::new("numbers")
//!     .repository(repository)
//!     .start(step)
//!     .build()?;
//!
//! let result = job.run(&CancellationToken::new()).await?;
//! println!("processed {} items", result.items_processed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod item;
pub mod job;
pub mod logging;
pub mod models;
pub mod policies;
pub mod registry;
pub mod repository;
pub mod scheduler;
pub mod step;
pub mod test_helpers;

pub use config::{BatchConfig, DEFAULT_CHUNK_SIZE};
pub use error::{BatchError, ErrorKind, Result};
pub use events::{JobListener, StepListener};
pub use item::{IdentityProcessor, ItemProcessor, ItemReader, ItemWriter, Tasklet};
pub use job::{Job, JobBuilder};
pub use models::{JobResult, SkipContext, StepContext, StepResult};
pub use policies::{RetryPolicy, SkipPolicy};
pub use registry::{JobFactory, JobRegistry, JobRunner};
pub use repository::{InMemoryRepository, JobRepository, StepRepository};
pub use scheduler::{JobRegistration, ScheduleMode, Scheduler};
pub use step::{JobStep, Step, StepBuilder, TaskletStep};
