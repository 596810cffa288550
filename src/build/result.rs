//! Execution result types.
//!
//! Contains types for representing the outcome of task runs and pipeline runs.

use crate::build::descriptor::TaskRef;
use std::path::PathBuf;
use std::time::Duration;

/// Status of a single task run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// The transformation succeeded
    Success,
    /// The transformation reported a failure
    Failure,
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Outcome of running one task target.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Task name
    pub task: String,
    /// Resolved target name
    pub target: String,
    /// Run status
    pub status: ExecutionStatus,
    /// Diagnostics reported by the implementation
    pub diagnostics: Option<String>,
    /// Output paths declared by the descriptor
    pub outputs: Vec<PathBuf>,
    /// Run duration
    pub duration: Duration,
    /// Non-fatal problems noticed while preparing the run
    pub warnings: Vec<String>,
}

impl ExecutionResult {
    /// Create a successful result.
    pub fn success(task: &str, target: &str, outputs: Vec<PathBuf>, duration: Duration) -> Self {
        Self {
            task: task.to_string(),
            target: target.to_string(),
            status: ExecutionStatus::Success,
            diagnostics: None,
            outputs,
            duration,
            warnings: vec![],
        }
    }

    /// Create a failed result.
    pub fn failure(task: &str, target: &str, diagnostics: String, duration: Duration) -> Self {
        Self {
            task: task.to_string(),
            target: target.to_string(),
            status: ExecutionStatus::Failure,
            diagnostics: Some(diagnostics),
            outputs: vec![],
            duration,
            warnings: vec![],
        }
    }

    /// Attach warnings gathered before the run.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Identifier in `task:target` form.
    pub fn id(&self) -> String {
        format!("{}:{}", self.task, self.target)
    }

    /// Check if this result is successful.
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}

/// Final status of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    /// Every step succeeded
    Success,
    /// A step failed and the run stopped there
    Failure {
        /// Reference of the failing step, as declared
        failed_task: TaskRef,
        /// Diagnostics of the failing step
        diagnostics: Option<String>,
    },
}

impl PipelineStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineStatus::Success)
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStatus::Success => write!(f, "success"),
            PipelineStatus::Failure { failed_task, diagnostics: Some(d) } => {
                write!(f, "failed at '{}': {}", failed_task, d)
            }
            PipelineStatus::Failure { failed_task, diagnostics: None } => {
                write!(f, "failed at '{}'", failed_task)
            }
        }
    }
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Pipeline name, or a label for ad-hoc runs
    pub pipeline: String,
    /// Final status
    pub status: PipelineStatus,
    /// Results of the steps that ran, in order
    pub steps: Vec<ExecutionResult>,
    /// Total run duration
    pub total_duration: Duration,
}

impl PipelineResult {
    /// Check if the pipeline succeeded.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Reference of the failing step, if any.
    pub fn failed_task(&self) -> Option<&TaskRef> {
        match &self.status {
            PipelineStatus::Failure { failed_task, .. } => Some(failed_task),
            PipelineStatus::Success => None,
        }
    }

    /// All outputs produced by successful steps.
    pub fn all_outputs(&self) -> Vec<&PathBuf> {
        self.steps.iter().flat_map(|r| r.outputs.iter()).collect()
    }

    /// Format a summary of the run.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        let ran = self.steps.len();

        match &self.status {
            PipelineStatus::Success => lines.push(format!(
                "Pipeline '{}' succeeded: {} task(s) in {:?}",
                self.pipeline, ran, self.total_duration
            )),
            PipelineStatus::Failure { failed_task, diagnostics } => {
                lines.push(format!(
                    "Pipeline '{}' failed at '{}' after {} task(s)",
                    self.pipeline, failed_task, ran
                ));
                if let Some(diagnostics) = diagnostics {
                    for line in diagnostics.lines().take(10) {
                        lines.push(format!("  {}", line));
                    }
                }
            }
        }

        lines.join("\n")
    }
}
