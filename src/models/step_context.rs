//! # Step Checkpoint Context
//!
//! Value type encoding a step's checkpoint position and per-attempt flags.
//!
//! ## Overview
//!
//! A `StepContext` is constructed once per attempt via [`StepContext::initial_run`]
//! (which reads the last persisted position and decides whether to roll the
//! checkpoint back one chunk) and re-derived via [`StepContext::increment`]
//! after every executed chunk. It is never mutated in place; every transition
//! produces a new value.
//!
//! ## Checkpoint invariant
//!
//! `step_index` is always >= 0 and means "every item with index below
//! `step_index` is durably committed or intentionally skipped". Progress rows
//! are pre-registered at [`StepContext::next_step_index`], so a row written
//! for a chunk working at position `i` carries index `i + chunk_size`; the
//! rollback rule in `initial_run` subtracts one chunk to recover the working
//! position of a chunk that truly failed.

use serde::{Deserialize, Serialize};

/// Checkpoint position and per-attempt flags for one step execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContext {
    pub step_name: String,
    pub job_name: String,
    /// 0-based offset into the logical item sequence; items below this
    /// index are committed or intentionally skipped.
    pub step_index: i64,
    pub chunk_size: i64,
    pub items_received: usize,
    pub items_processed: usize,
    /// The previous chunk was abandoned by the skip policy.
    pub skip: bool,
    /// The recorded attempt ended in a fatal error.
    pub error: bool,
    /// No chunk has executed yet in this attempt.
    pub is_initial_run: bool,
}

impl StepContext {
    /// Fresh context for a step that has never recorded progress.
    pub fn new(job_name: impl Into<String>, step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            job_name: job_name.into(),
            step_index: 0,
            chunk_size: 0,
            items_received: 0,
            items_processed: 0,
            skip: false,
            error: false,
            is_initial_run: true,
        }
    }

    /// Starting context for a new attempt, derived from the last persisted
    /// context for this step.
    ///
    /// Rollback rule: a previous attempt that failed (`error == true`)
    /// without processing anything replays the chunk that truly failed, so
    /// the index moves back one chunk. A previous attempt with
    /// `error == false` and zero processed items is an intentional skip (or
    /// an end-of-data marker) and must NOT roll back; that distinction is
    /// what keeps restarts from re-applying skipped chunks.
    ///
    /// The resulting index is always clamped at >= 0.
    pub fn initial_run(previous: StepContext, chunk_size: i64) -> Self {
        let mut step_index = previous.step_index;
        if previous.error && previous.items_processed == 0 && step_index >= chunk_size {
            step_index -= chunk_size;
        }
        Self {
            step_name: previous.step_name,
            job_name: previous.job_name,
            step_index: step_index.max(0),
            chunk_size,
            items_received: 0,
            items_processed: 0,
            skip: false,
            error: false,
            is_initial_run: true,
        }
    }

    /// Context for the next chunk after one executed (or skipped) chunk.
    ///
    /// Advances the index by one chunk and records the counters the next
    /// [`StepContext::has_next`] evaluation looks at.
    pub fn increment(previous: &StepContext, items_received: usize, items_processed: usize, skipped: bool) -> Self {
        Self {
            step_name: previous.step_name.clone(),
            job_name: previous.job_name.clone(),
            step_index: previous.step_index + previous.chunk_size,
            chunk_size: previous.chunk_size,
            items_received,
            items_processed,
            skip: skipped,
            error: false,
            is_initial_run: false,
        }
    }

    /// Index persisted when pre-registering the chunk currently in flight.
    pub fn next_step_index(&self) -> i64 {
        self.step_index + self.chunk_size
    }

    /// Whether the chunk loop should run another iteration.
    ///
    /// The initial run and a skipped chunk each force one more iteration even
    /// on an empty read, so a step that was mid-skip or just starting always
    /// attempts at least one real chunk. The `step_index == chunk_size` arm
    /// is a legacy boundary case kept for compatibility; it only fires after
    /// an empty first chunk.
    pub fn has_next(&self) -> bool {
        self.is_initial_run
            || self.skip
            || self.items_received > 0
            || self.step_index == self.chunk_size
    }
}
