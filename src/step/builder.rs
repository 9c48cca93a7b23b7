//! # Staged Step Builder
//!
//! Typestate builder for chunked steps: a reader must be supplied before a
//! writer, and a writer before any optional settings. The stages make the
//! ordering a compile-time guarantee rather than a runtime check.
//!
//! A step whose input and output item types coincide may omit the processor
//! and gets the identity pass-through; distinct types require an explicit
//! processor, which the typestates enforce because the identity path only
//! exists on the reader stage.

use std::sync::Arc;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::{BatchError, Result};
use crate::item::{IdentityProcessor, ItemProcessor, ItemReader, ItemWriter};
use crate::policies::{RetryPolicy, SkipPolicy};
use crate::step::Step;

/// Entry stage: only a name so far.
pub struct StepBuilder {
    name: String,
}

/// A reader is set; next is a processor or (for same-typed steps) a writer.
pub struct ReaderStage<I> {
    name: String,
    reader: Arc<dyn ItemReader<I>>,
}

/// Reader and processor are set; a writer completes the pipeline.
pub struct ProcessorStage<I, O> {
    name: String,
    reader: Arc<dyn ItemReader<I>>,
    processor: Arc<dyn ItemProcessor<I, O>>,
}

/// Full pipeline assembled; optional settings and `build` live here.
pub struct SettingsStage<I, O> {
    name: String,
    reader: Arc<dyn ItemReader<I>>,
    processor: Arc<dyn ItemProcessor<I, O>>,
    writer: Arc<dyn ItemWriter<O>>,
    chunk_size: usize,
    retry_policy: RetryPolicy,
    skip_policy: SkipPolicy,
}

impl StepBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn reader<I>(self, reader: Arc<dyn ItemReader<I>>) -> ReaderStage<I> {
        ReaderStage {
            name: self.name,
            reader,
        }
    }
}

impl<I> ReaderStage<I>
where
    I: Send + 'static,
{
    pub fn processor<O>(self, processor: Arc<dyn ItemProcessor<I, O>>) -> ProcessorStage<I, O> {
        ProcessorStage {
            name: self.name,
            reader: self.reader,
            processor,
        }
    }

    /// Writer over the reader's item type; the processor defaults to the
    /// identity pass-through.
    pub fn writer(self, writer: Arc<dyn ItemWriter<I>>) -> SettingsStage<I, I> {
        SettingsStage {
            name: self.name,
            reader: self.reader,
            processor: Arc::new(IdentityProcessor),
            writer,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry_policy: RetryPolicy::none(),
            skip_policy: SkipPolicy::none(),
        }
    }
}

impl<I, O> ProcessorStage<I, O> {
    pub fn writer(self, writer: Arc<dyn ItemWriter<O>>) -> SettingsStage<I, O> {
        SettingsStage {
            name: self.name,
            reader: self.reader,
            processor: self.processor,
            writer,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry_policy: RetryPolicy::none(),
            skip_policy: SkipPolicy::none(),
        }
    }
}

impl<I, O> SettingsStage<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    #[must_use]
    pub fn skip_policy(mut self, policy: SkipPolicy) -> Self {
        self.skip_policy = policy;
        self
    }

    /// Validate the assembled configuration once and produce the step.
    pub fn build(self) -> Result<Step<I, O>> {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(format!(
                "step '{}': chunk size must be at least 1",
                self.name
            )));
        }
        Ok(Step::new(
            self.name,
            self.reader,
            self.processor,
            self.writer,
            self.chunk_size,
            self.retry_policy,
            self.skip_policy,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{CollectingWriter, VecReader};

    #[test]
    fn zero_chunk_size_is_a_construction_error() {
        let reader = Arc::new(VecReader::new(vec![1, 2, 3]));
        let writer = Arc::new(CollectingWriter::<i32>::new());
        let result = StepBuilder::new("copy")
            .reader(reader)
            .writer(writer)
            .chunk_size(0)
            .build();
        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }

    #[test]
    fn identity_step_builds_with_defaults() {
        let reader = Arc::new(VecReader::new(vec!["a", "b"]));
        let writer = Arc::new(CollectingWriter::<&str>::new());
        let step = StepBuilder::new("copy").reader(reader).writer(writer).build();
        assert!(step.is_ok());
    }
}
