//! # Chunked Step
//!
//! The per-step chunk loop: pull a bounded batch from the reader, transform
//! it item by item, write the output, and durably record progress, so that a
//! crashed or failed job resumes from its last committed chunk.
//!
//! ## Loop shape
//!
//! Every iteration pre-registers a progress row at the chunk's target index
//! before touching the reader; a crash mid-chunk therefore always leaves a
//! trace. Failures resolve in strict order: cancellation propagates
//! immediately, then the retry policy may re-run the same chunk in place
//! (the index never advances between attempts), then the skip policy may
//! abandon the chunk, and anything left is fatal, marking the progress row
//! with `error = true` before the error surfaces.
//!
//! Chunks of one step are strictly sequential: chunk N's checkpoint write
//! happens before chunk N+1's read, which is what makes the persisted
//! position trustworthy on restart.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{BatchError, Result};
use crate::item::{ItemProcessor, ItemReader, ItemWriter};
use crate::models::{SkipContext, StepContext, StepResult};
use crate::policies::{RetryPolicy, SkipPolicy};
use crate::repository::JobRepository;
use crate::step::JobStep;

/// Chunk-oriented step over items of type `I` transformed into `O`.
///
/// Collaborators are shared references: they may be reused across retry
/// attempts within one run, while a fresh job/step graph is built per
/// execution by the job factory.
pub struct Step<I, O> {
    name: String,
    reader: Arc<dyn ItemReader<I>>,
    processor: Arc<dyn ItemProcessor<I, O>>,
    writer: Arc<dyn ItemWriter<O>>,
    chunk_size: usize,
    retry_policy: RetryPolicy,
    skip_policy: SkipPolicy,
}

/// Resolution of one chunk after retries and skip handling.
enum ChunkOutcome {
    Completed { read: usize, written: usize },
    Skipped,
}

impl<I, O> Step<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub(crate) fn new(
        name: String,
        reader: Arc<dyn ItemReader<I>>,
        processor: Arc<dyn ItemProcessor<I, O>>,
        writer: Arc<dyn ItemWriter<O>>,
        chunk_size: usize,
        retry_policy: RetryPolicy,
        skip_policy: SkipPolicy,
    ) -> Self {
        Self {
            name,
            reader,
            processor,
            writer,
            chunk_size,
            retry_policy,
            skip_policy,
        }
    }

    /// One read-process-write pass over the chunk at `ctx.step_index`.
    async fn run_chunk(
        &self,
        ctx: &StepContext,
        token: &CancellationToken,
    ) -> Result<(usize, usize)> {
        let items = self.reader.read(ctx.step_index, self.chunk_size, token).await?;
        let read = items.len();

        let mut outputs = Vec::with_capacity(read);
        for item in items {
            if token.is_cancelled() {
                return Err(BatchError::Cancelled);
            }
            outputs.push(self.processor.process(item, token).await?);
        }

        let written = outputs.len();
        if !outputs.is_empty() {
            self.writer.write(outputs, token).await?;
        }
        Ok((read, written))
    }

    /// Run the chunk at `ctx.step_index` to a resolution, retrying in place
    /// and consulting the skip policy as configured. Fatal failures mark the
    /// pre-registered row before surfacing.
    async fn resolve_chunk(
        &self,
        ctx: &StepContext,
        step_id: i64,
        repository: &Arc<dyn JobRepository>,
        token: &CancellationToken,
    ) -> Result<ChunkOutcome> {
        let mut attempt: u32 = 1;
        loop {
            match self.run_chunk(ctx, token).await {
                Ok((read, written)) => {
                    return Ok(ChunkOutcome::Completed { read, written });
                }
                Err(err) if err.is_cancelled() => {
                    // The in-flight row stays unmarked; a restart resumes at
                    // the unadvanced index and re-runs this chunk.
                    return Err(err);
                }
                Err(err) => {
                    let kind = err.kind();
                    if self.retry_policy.should_retry(kind, attempt) {
                        warn!(
                            step = %self.name,
                            step_index = ctx.step_index,
                            attempt,
                            error = %err,
                            "chunk failed, retrying in place"
                        );
                        self.retry_policy.wait(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    let skip_context = SkipContext::from_error(ctx, &err);
                    if self
                        .skip_policy
                        .is_satisfied_by(repository.as_ref(), &skip_context, token)
                        .await?
                    {
                        return Ok(ChunkOutcome::Skipped);
                    }

                    repository
                        .update_step(step_id, 0, true, false, token)
                        .await?;
                    return Err(err);
                }
            }
        }
    }
}

#[async_trait]
impl<I, O> JobStep for Step<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        initial: StepContext,
        repository: Arc<dyn JobRepository>,
        token: &CancellationToken,
    ) -> Result<StepResult> {
        let mut ctx = StepContext::initial_run(initial, self.chunk_size as i64);
        debug!(
            step = %self.name,
            start_index = ctx.step_index,
            chunk_size = self.chunk_size,
            "step starting"
        );

        let mut items_read = 0usize;
        let mut items_processed = 0usize;
        let mut errors_skipped = 0usize;

        while ctx.has_next() {
            if token.is_cancelled() {
                return Err(BatchError::Cancelled);
            }

            let step_id = repository
                .insert_step(&ctx.job_name, &ctx.step_name, ctx.next_step_index(), token)
                .await?;

            match self.resolve_chunk(&ctx, step_id, &repository, token).await? {
                ChunkOutcome::Completed { read, written } => {
                    repository
                        .update_step(step_id, written, false, false, token)
                        .await?;
                    items_read += read;
                    items_processed += written;
                    ctx = StepContext::increment(&ctx, read, written, false);
                }
                ChunkOutcome::Skipped => {
                    repository
                        .update_step(step_id, 0, false, true, token)
                        .await?;
                    errors_skipped += 1;
                    ctx = StepContext::increment(&ctx, 0, 0, true);
                }
            }
        }

        info!(
            step = %self.name,
            items_read,
            items_processed,
            errors_skipped,
            "✅ step completed"
        );
        Ok(StepResult::completed(
            &self.name,
            items_read,
            items_processed,
            errors_skipped,
        ))
    }
}
