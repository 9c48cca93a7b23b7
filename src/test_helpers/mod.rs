//! # Test Support Collaborators
//!
//! Deterministic in-memory readers, writers, and tasklets used by the test
//! suites and useful for wiring example jobs. None of these touch external
//! resources; failure behavior is scripted per instance so concurrent tests
//! never interfere with each other.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{BatchError, ErrorKind, Result};
use crate::item::{ItemProcessor, ItemReader, ItemWriter, Tasklet};

/// Slice-backed reader answering arbitrary offsets, as restarts require.
pub struct VecReader<T> {
    items: Vec<T>,
}

impl<T: Clone> VecReader<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ItemReader<T> for VecReader<T> {
    async fn read(
        &self,
        start_index: i64,
        chunk_size: usize,
        token: &CancellationToken,
    ) -> Result<Vec<T>> {
        if token.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        let start = usize::try_from(start_index.max(0)).unwrap_or(usize::MAX);
        if start >= self.items.len() {
            return Ok(Vec::new());
        }
        let end = (start + chunk_size).min(self.items.len());
        Ok(self.items[start..end].to_vec())
    }
}

/// Reader that fails exactly once when asked for a configured offset, then
/// serves normally; models the transient failure in restart scenarios.
pub struct FailOnceReader<T> {
    inner: VecReader<T>,
    fail_at_index: i64,
    kind: ErrorKind,
    failed: AtomicBool,
}

impl<T: Clone> FailOnceReader<T> {
    pub fn new(items: Vec<T>, fail_at_index: i64, kind: ErrorKind) -> Self {
        Self {
            inner: VecReader::new(items),
            fail_at_index,
            kind,
            failed: AtomicBool::new(false),
        }
    }

    /// Whether the scripted failure has fired yet.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ItemReader<T> for FailOnceReader<T> {
    async fn read(
        &self,
        start_index: i64,
        chunk_size: usize,
        token: &CancellationToken,
    ) -> Result<Vec<T>> {
        if start_index == self.fail_at_index
            && self
                .failed
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(BatchError::item(
                self.kind,
                format!("scripted failure at index {start_index}"),
            ));
        }
        self.inner.read(start_index, chunk_size, token).await
    }
}

/// Reader that always fails at one offset, whatever the attempt.
pub struct FailAlwaysReader<T> {
    inner: VecReader<T>,
    fail_at_index: i64,
    kind: ErrorKind,
    failures: AtomicU32,
}

impl<T: Clone> FailAlwaysReader<T> {
    pub fn new(items: Vec<T>, fail_at_index: i64, kind: ErrorKind) -> Self {
        Self {
            inner: VecReader::new(items),
            fail_at_index,
            kind,
            failures: AtomicU32::new(0),
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ItemReader<T> for FailAlwaysReader<T> {
    async fn read(
        &self,
        start_index: i64,
        chunk_size: usize,
        token: &CancellationToken,
    ) -> Result<Vec<T>> {
        if start_index == self.fail_at_index {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(BatchError::item(
                self.kind,
                format!("scripted failure at index {start_index}"),
            ));
        }
        self.inner.read(start_index, chunk_size, token).await
    }
}

/// Processor failing for scripted item values.
pub struct FailingProcessor<T> {
    poison: Vec<T>,
    kind: ErrorKind,
}

impl<T: PartialEq> FailingProcessor<T> {
    pub fn new(poison: Vec<T>, kind: ErrorKind) -> Self {
        Self { poison, kind }
    }
}

#[async_trait]
impl<T: Clone + PartialEq + Send + Sync + 'static> ItemProcessor<T, T> for FailingProcessor<T> {
    async fn process(&self, item: T, _token: &CancellationToken) -> Result<T> {
        if self.poison.contains(&item) {
            return Err(BatchError::item(self.kind, "scripted poison item"));
        }
        Ok(item)
    }
}

/// Writer that records every written item and counts write calls.
pub struct CollectingWriter<T> {
    written: Mutex<Vec<T>>,
    write_calls: AtomicUsize,
}

impl<T> CollectingWriter<T> {
    pub fn new() -> Self {
        Self {
            written: Mutex::new(Vec::new()),
            write_calls: AtomicUsize::new(0),
        }
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }
}

impl<T: Clone> CollectingWriter<T> {
    pub fn written(&self) -> Vec<T> {
        self.written.lock().clone()
    }
}

impl<T> Default for CollectingWriter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> ItemWriter<T> for CollectingWriter<T> {
    async fn write(&self, items: Vec<T>, token: &CancellationToken) -> Result<()> {
        if token.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.written.lock().extend(items);
        Ok(())
    }
}

/// Writer failing a scripted number of times before succeeding; retried
/// chunks then land in the inner collector.
pub struct FlakyWriter<T> {
    inner: CollectingWriter<T>,
    failures_remaining: AtomicU32,
    kind: ErrorKind,
}

impl<T> FlakyWriter<T> {
    pub fn new(failures: u32, kind: ErrorKind) -> Self {
        Self {
            inner: CollectingWriter::new(),
            failures_remaining: AtomicU32::new(failures),
            kind,
        }
    }

    pub fn write_calls(&self) -> usize {
        self.inner.write_calls()
    }
}

impl<T: Clone> FlakyWriter<T> {
    pub fn written(&self) -> Vec<T> {
        self.inner.written()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> ItemWriter<T> for FlakyWriter<T> {
    async fn write(&self, items: Vec<T>, token: &CancellationToken) -> Result<()> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(BatchError::item(self.kind, "scripted write failure"));
        }
        self.inner.write(items, token).await
    }
}

/// Tasklet counting its executions, optionally scripted to fail.
pub struct CountingTasklet {
    runs: AtomicU32,
    fail: bool,
}

impl CountingTasklet {
    pub fn succeeding() -> Self {
        Self {
            runs: AtomicU32::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            runs: AtomicU32::new(0),
            fail: true,
        }
    }

    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tasklet for CountingTasklet {
    async fn execute(&self, token: &CancellationToken) -> Result<()> {
        if token.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BatchError::item(ErrorKind::Other, "scripted tasklet failure"));
        }
        Ok(())
    }
}
