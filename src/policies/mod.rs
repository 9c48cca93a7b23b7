//! # Skip and Retry Policies
//!
//! Stateless decision objects consulted by a chunked step when a chunk
//! fails: the retry policy decides whether to re-run the same chunk in
//! place, the skip policy decides whether to abandon the chunk and keep
//! going. Neither holds mutable counters; retry attempts are tracked by the
//! chunk loop and skip counts live in the checkpoint store, scoped to the
//! current execution.
//!
//! Cancellation is never retried or skipped; both policies refuse
//! [`ErrorKind::Cancelled`](crate::error::ErrorKind::Cancelled)
//! unconditionally.

pub mod retry;
pub mod skip;

pub use retry::RetryPolicy;
pub use skip::SkipPolicy;
