//! # Item Processing Interfaces
//!
//! The external collaborator boundary of a chunked step: readers pull bounded
//! batches from a source, processors transform items one at a time, writers
//! push a chunk's output to a sink, and tasklets execute a single unit of
//! non-chunked work.
//!
//! Collaborators never catch their own failures; they surface a
//! [`BatchError`](crate::error::BatchError) and the owning step is the sole
//! retry-vs-skip-vs-fatal decision point.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Pulls a bounded batch of items starting at an arbitrary offset.
///
/// Restarts and retries request non-sequential offsets, so implementations
/// must answer for any `start_index`, not only monotonically increasing ones.
/// Fewer than `chunk_size` items may signal end-of-data, but a strictly empty
/// result is the only guaranteed EOF signal.
#[async_trait]
pub trait ItemReader<T>: Send + Sync {
    async fn read(
        &self,
        start_index: i64,
        chunk_size: usize,
        token: &CancellationToken,
    ) -> Result<Vec<T>>;
}

/// Transforms one item; may fail to trigger the owning step's retry/skip
/// handling.
#[async_trait]
pub trait ItemProcessor<I, O>: Send + Sync {
    async fn process(&self, item: I, token: &CancellationToken) -> Result<O>;
}

/// Writes one non-empty chunk of processed items to a sink.
#[async_trait]
pub trait ItemWriter<T>: Send + Sync {
    async fn write(&self, items: Vec<T>, token: &CancellationToken) -> Result<()>;
}

/// A single-invocation unit of step work with no chunking.
#[async_trait]
pub trait Tasklet: Send + Sync {
    async fn execute(&self, token: &CancellationToken) -> Result<()>;
}

/// Pass-through processor used when a step declares no processor of its own.
///
/// Only exists for steps whose input and output item types are the same;
/// steps with distinct types must supply an explicit processor, enforced at
/// construction time by the step builder's typestates.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityProcessor;

#[async_trait]
impl<T: Send + 'static> ItemProcessor<T, T> for IdentityProcessor {
    async fn process(&self, item: T, _token: &CancellationToken) -> Result<T> {
        Ok(item)
    }
}
