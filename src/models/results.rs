//! Immutable step and job outcome records.
//!
//! Created once when a step or job finishes and handed back to the caller;
//! the engine never mutates a result after construction.

use serde::{Deserialize, Serialize};

/// Outcome of one step execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub items_read: usize,
    pub items_processed: usize,
    pub errors_skipped: usize,
}

impl StepResult {
    pub fn completed(
        name: impl Into<String>,
        items_read: usize,
        items_processed: usize,
        errors_skipped: usize,
    ) -> Self {
        Self {
            name: name.into(),
            success: true,
            items_read,
            items_processed,
            errors_skipped,
        }
    }

    /// Result recorded for a step whose failure terminated the job.
    pub fn failed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            items_read: 0,
            items_processed: 0,
            errors_skipped: 0,
        }
    }
}

/// Aggregated outcome of one job run, in step registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub name: String,
    pub success: bool,
    pub steps: Vec<StepResult>,
}

impl JobResult {
    pub fn new(name: impl Into<String>, success: bool, steps: Vec<StepResult>) -> Self {
        Self {
            name: name.into(),
            success,
            steps,
        }
    }

    pub fn items_read(&self) -> usize {
        self.steps.iter().map(|s| s.items_read).sum()
    }

    pub fn items_processed(&self) -> usize {
        self.steps.iter().map(|s| s.items_processed).sum()
    }

    pub fn errors_skipped(&self) -> usize {
        self.steps.iter().map(|s| s.errors_skipped).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_result_aggregates_step_counters() {
        let result = JobResult::new(
            "import",
            true,
            vec![
                StepResult::completed("extract", 100, 98, 1),
                StepResult::completed("load", 98, 98, 0),
            ],
        );
        assert_eq!(result.items_read(), 198);
        assert_eq!(result.items_processed(), 196);
        assert_eq!(result.errors_skipped(), 1);
    }

    #[test]
    fn results_serialize_for_host_consumption() {
        let result = JobResult::new("import", false, vec![StepResult::failed("load")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["steps"][0]["name"], serde_json::json!("load"));
    }
}
