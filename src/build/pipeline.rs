//! Pipelines and the pipeline runner.
//!
//! A pipeline is an ordered list of task references. Pipelines may name
//! other pipelines; those entries are expanded inline when the registry
//! is built, so the runner only ever sees task references.
//!
//! # Example
//!
//! ```ignore
//! use taskline::build::{PipelineRunner, PipelineRegistry, TaskExecutor};
//!
//! let runner = PipelineRunner::new(executor, pipelines);
//! let result = runner.run("build")?;
//! println!("{}", result.summary());
//! ```

use crate::build::descriptor::TaskRef;
use crate::build::error::BuildError;
use crate::build::executor::TaskExecutor;
use crate::build::progress::{NullProgress, ProgressEvent, ProgressReporter, StepStatus};
use crate::build::registry::NotFoundError;
use crate::build::result::{PipelineResult, PipelineStatus};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{error, info};

/// A named, ordered list of task references.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDefinition {
    /// Pipeline name
    pub name: String,
    /// Steps in execution order
    pub steps: Vec<TaskRef>,
}

/// Maps pipeline names to definitions.
#[derive(Debug, Clone, Default)]
pub struct PipelineRegistry {
    pipelines: BTreeMap<String, PipelineDefinition>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace a pipeline.
    pub fn define_pipeline(&mut self, name: impl Into<String>, steps: Vec<TaskRef>) {
        let name = name.into();
        self.pipelines.insert(name.clone(), PipelineDefinition { name, steps });
    }

    /// Look up a pipeline by name.
    pub fn resolve(&self, name: &str) -> Result<&PipelineDefinition, NotFoundError> {
        self.pipelines.get(name).ok_or_else(|| NotFoundError::Pipeline(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    /// Pipeline names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.pipelines.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &PipelineDefinition> {
        self.pipelines.values()
    }

    /// Steps for a command-line entry: a pipeline name or a task reference.
    pub fn steps_for(&self, entry: &str) -> Result<Vec<TaskRef>, BuildError> {
        match self.pipelines.get(entry) {
            Some(definition) => Ok(definition.steps.clone()),
            None => Ok(vec![TaskRef::parse(entry)?]),
        }
    }

    /// Build a registry from raw `[pipelines]` entries.
    ///
    /// An entry without a `:` that names another pipeline is expanded in
    /// place. Everything else must parse as a task reference; whether the
    /// task exists is checked by the caller. All problems are collected.
    pub fn from_entries(raw: &BTreeMap<String, Vec<String>>) -> Result<Self, Vec<String>> {
        let mut expanded: HashMap<String, Vec<TaskRef>> = HashMap::new();
        let mut errors = Vec::new();

        for name in raw.keys() {
            let mut visiting = Vec::new();
            if let Err(e) = expand(name, raw, &mut visiting, &mut expanded) {
                if !errors.contains(&e) {
                    errors.push(e);
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut registry = Self::new();
        for name in raw.keys() {
            if let Some(steps) = expanded.remove(name) {
                registry.define_pipeline(name.clone(), steps);
            }
        }
        Ok(registry)
    }
}

fn expand(
    name: &str,
    raw: &BTreeMap<String, Vec<String>>,
    visiting: &mut Vec<String>,
    expanded: &mut HashMap<String, Vec<TaskRef>>,
) -> Result<Vec<TaskRef>, String> {
    if let Some(steps) = expanded.get(name) {
        return Ok(steps.clone());
    }

    if let Some(start) = visiting.iter().position(|n| n == name) {
        let mut cycle = visiting[start..].to_vec();
        cycle.push(name.to_string());
        return Err(format!("pipeline cycle: {}", cycle.join(" -> ")));
    }

    visiting.push(name.to_string());

    let mut steps = Vec::new();
    for entry in raw.get(name).map(Vec::as_slice).unwrap_or_default() {
        if !entry.contains(':') && raw.contains_key(entry) {
            steps.extend(expand(entry, raw, visiting, expanded)?);
        } else {
            let reference = TaskRef::parse(entry)
                .map_err(|e| format!("pipeline '{}': {}", name, e))?;
            steps.push(reference);
        }
    }

    visiting.pop();
    expanded.insert(name.to_string(), steps.clone());
    Ok(steps)
}

/// Runs pipelines strictly in order, stopping at the first failure.
///
/// Artifacts written by steps before the failure stay on disk.
pub struct PipelineRunner {
    executor: TaskExecutor,
    pipelines: PipelineRegistry,
    progress: Box<dyn ProgressReporter>,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("executor", &self.executor)
            .field("pipelines", &self.pipelines)
            .finish()
    }
}

impl PipelineRunner {
    /// Create a runner that reports no progress.
    pub fn new(executor: TaskExecutor, pipelines: PipelineRegistry) -> Self {
        Self { executor, pipelines, progress: Box::new(NullProgress) }
    }

    /// Set the progress reporter.
    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn executor(&self) -> &TaskExecutor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut TaskExecutor {
        &mut self.executor
    }

    pub fn pipelines(&self) -> &PipelineRegistry {
        &self.pipelines
    }

    /// Run a registered pipeline.
    pub fn run(&self, name: &str) -> Result<PipelineResult, BuildError> {
        let definition = self.pipelines.resolve(name)?;
        self.run_refs(name, &definition.steps)
    }

    /// Run an ad-hoc list of references under `label`.
    pub fn run_refs(&self, label: &str, steps: &[TaskRef]) -> Result<PipelineResult, BuildError> {
        let start = Instant::now();
        info!(pipeline = %label, steps = steps.len(), "pipeline started");
        self.progress.report(ProgressEvent::PipelineStarted {
            pipeline: label.to_string(),
            total_steps: steps.len(),
        });

        let mut results = Vec::with_capacity(steps.len());
        let mut status = PipelineStatus::Success;

        for (index, step) in steps.iter().enumerate() {
            let task_id = format!("{}:{}", step.task, step.target_or_default());
            self.progress.report(ProgressEvent::StepStarted { task_id: task_id.clone(), index: index + 1 });

            let result = match self.executor.execute_ref(step) {
                Ok(result) => result,
                Err(e) => {
                    error!(pipeline = %label, task = %task_id, error = %e, "pipeline aborted");
                    self.finish(label, false, results.len(), start);
                    return Err(e);
                }
            };

            for message in &result.warnings {
                self.progress.report(ProgressEvent::Warning {
                    task_id: Some(task_id.clone()),
                    message: message.clone(),
                });
            }

            let step_status = if result.is_success() {
                StepStatus::Success
            } else {
                StepStatus::Failed(result.diagnostics.clone().unwrap_or_default())
            };
            self.progress.report(ProgressEvent::StepCompleted {
                task_id,
                status: step_status,
                duration_ms: result.duration.as_millis() as u64,
            });

            let failed = !result.is_success();
            let diagnostics = result.diagnostics.clone();
            results.push(result);

            if failed {
                status = PipelineStatus::Failure { failed_task: step.clone(), diagnostics };
                break;
            }
        }

        let success = status.is_success();
        self.finish(label, success, results.len(), start);
        if success {
            info!(pipeline = %label, "pipeline succeeded");
        } else {
            error!(pipeline = %label, "pipeline failed");
        }

        Ok(PipelineResult {
            pipeline: label.to_string(),
            status,
            steps: results,
            total_duration: start.elapsed(),
        })
    }

    fn finish(&self, label: &str, success: bool, completed: usize, start: Instant) {
        self.progress.report(ProgressEvent::PipelineCompleted {
            pipeline: label.to_string(),
            success,
            completed,
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }
}
