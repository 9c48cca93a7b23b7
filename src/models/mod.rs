//! # Engine Value Types
//!
//! Immutable value types that flow through the engine: the per-step
//! checkpoint context, the transient skip context handed to policies, and
//! the step/job result records returned to callers.

pub mod results;
pub mod skip_context;
pub mod step_context;

pub use results::{JobResult, StepResult};
pub use skip_context::SkipContext;
pub use step_context::StepContext;
