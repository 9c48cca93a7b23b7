//! Staged assembly of a job from its steps and collaborators.

use std::sync::Arc;

use crate::error::{BatchError, Result};
use crate::events::{JobListener, StepListener};
use crate::job::Job;
use crate::repository::JobRepository;
use crate::step::JobStep;

/// Accumulates steps in registration order, then validates once at `build`.
pub struct JobBuilder {
    name: String,
    steps: Vec<Box<dyn JobStep>>,
    repository: Option<Arc<dyn JobRepository>>,
    listeners: Vec<Arc<dyn JobListener>>,
    step_listeners: Vec<Arc<dyn StepListener>>,
}

impl JobBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            repository: None,
            listeners: Vec::new(),
            step_listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn repository(mut self, repository: Arc<dyn JobRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// First step of the job.
    #[must_use]
    pub fn start(mut self, step: impl JobStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// A subsequent step, executed after every step added before it.
    #[must_use]
    pub fn next(mut self, step: impl JobStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    #[must_use]
    pub fn step_listener(mut self, listener: Arc<dyn StepListener>) -> Self {
        self.step_listeners.push(listener);
        self
    }

    pub fn build(self) -> Result<Job> {
        let repository = self.repository.ok_or_else(|| {
            BatchError::Configuration(format!("job '{}': a repository is required", self.name))
        })?;
        if self.steps.is_empty() {
            return Err(BatchError::Configuration(format!(
                "job '{}': at least one step is required",
                self.name
            )));
        }
        Ok(Job::new(
            self.name,
            self.steps,
            repository,
            self.listeners,
            self.step_listeners,
        ))
    }
}
