//! Task executor.
//!
//! Resolves a task target, expands its inputs against the current state
//! of the artifact store and hands them to the implementation bound to
//! the task. The executor never looks at file contents.

use crate::build::descriptor::{TaskDescriptor, TaskRef};
use crate::build::error::BuildError;
use crate::build::registry::{NotFoundError, TaskRegistry};
use crate::build::result::ExecutionResult;
use crate::build::store::ArtifactStore;
use crate::tasks::{Invocation, ResolvedMapping, TaskImplementation, TaskOutcome};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A resolved target with its inputs expanded, ready to run.
#[derive(Debug, Clone)]
pub struct TaskPlan<'a> {
    /// The resolved descriptor
    pub descriptor: &'a TaskDescriptor,
    /// Expanded sources per mapping, in declared order
    pub mappings: Vec<ResolvedMapping>,
    /// All expanded sources, in declared order
    pub sources: Vec<PathBuf>,
    /// Non-fatal problems found while expanding inputs
    pub warnings: Vec<String>,
}

impl TaskPlan<'_> {
    /// Borrow the plan as an implementation invocation.
    pub fn invocation(&self) -> Invocation<'_> {
        Invocation { descriptor: self.descriptor, sources: &self.sources, mappings: &self.mappings }
    }
}

/// Runs single task targets.
pub struct TaskExecutor {
    registry: TaskRegistry,
    implementations: HashMap<String, Box<dyn TaskImplementation>>,
    store: ArtifactStore,
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut bound: Vec<&String> = self.implementations.keys().collect();
        bound.sort();
        f.debug_struct("TaskExecutor")
            .field("registry", &self.registry)
            .field("implementations", &bound)
            .field("store", &self.store)
            .finish()
    }
}

impl TaskExecutor {
    /// Create an executor with no implementations bound.
    pub fn new(registry: TaskRegistry, store: ArtifactStore) -> Self {
        Self { registry, implementations: HashMap::new(), store }
    }

    /// Bind an implementation to a task name, replacing any earlier one.
    pub fn register_implementation(
        &mut self,
        task: impl Into<String>,
        implementation: impl TaskImplementation + 'static,
    ) {
        self.implementations.insert(task.into(), Box::new(implementation));
    }

    /// Bind an already boxed implementation.
    pub fn register_boxed(&mut self, task: impl Into<String>, implementation: Box<dyn TaskImplementation>) {
        self.implementations.insert(task.into(), implementation);
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Whether an implementation is bound to `task`.
    pub fn has_implementation(&self, task: &str) -> bool {
        self.implementations.contains_key(task)
    }

    /// Resolve and expand a target without running it.
    pub fn plan(&self, task: &str, target: Option<&str>) -> Result<TaskPlan<'_>, BuildError> {
        let descriptor = self.registry.resolve(task, target)?;

        let mut mappings = Vec::with_capacity(descriptor.files.len());
        let mut sources = Vec::new();
        let mut warnings = Vec::new();
        for mapping in &descriptor.files {
            let expanded = self.store.expand(&mapping.src)?;
            if expanded.is_empty() {
                let patterns = mapping.src.join(", ");
                warn!(task = %descriptor.id(), patterns = %patterns, "no input files selected");
                warnings.push(format!("no input files selected by '{}'", patterns));
            }
            sources.extend(expanded.iter().cloned());
            mappings.push(ResolvedMapping { dest: mapping.dest.clone(), sources: expanded });
        }

        Ok(TaskPlan { descriptor, mappings, sources, warnings })
    }

    /// Run one target. `None` runs the `main` target.
    ///
    /// A failure reported by the implementation comes back as a failed
    /// [`ExecutionResult`]; only resolution and I/O problems are errors.
    pub fn execute(&self, task: &str, target: Option<&str>) -> Result<ExecutionResult, BuildError> {
        let start = Instant::now();
        let descriptor = self.registry.resolve(task, target)?;
        let implementation = self
            .implementations
            .get(task)
            .ok_or_else(|| NotFoundError::Implementation(task.to_string()))?;

        let plan = self.plan(task, Some(descriptor.target.as_str()))?;
        debug!(
            task = %descriptor.id(),
            kind = %descriptor.kind,
            sources = plan.sources.len(),
            "running task"
        );

        let outcome = implementation.run(&plan.invocation(), &self.store)?;
        let duration = start.elapsed();

        let result = match outcome {
            TaskOutcome::Success => {
                info!(task = %descriptor.id(), elapsed_ms = duration.as_millis() as u64, "task succeeded");
                let outputs = descriptor.outputs().into_iter().map(PathBuf::from).collect();
                ExecutionResult::success(&descriptor.task, &descriptor.target, outputs, duration)
            }
            TaskOutcome::Failure(diagnostics) => {
                warn!(task = %descriptor.id(), "task failed");
                ExecutionResult::failure(&descriptor.task, &descriptor.target, diagnostics, duration)
            }
        };
        Ok(result.with_warnings(plan.warnings))
    }

    /// Run the target named by a reference.
    pub fn execute_ref(&self, reference: &TaskRef) -> Result<ExecutionResult, BuildError> {
        self.execute(&reference.task, reference.target.as_deref())
    }
}
