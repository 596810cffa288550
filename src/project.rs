//! Project assembly.
//!
//! Turns a parsed `taskline.toml` into the task registry, the pipeline
//! registry and the artifact store, rejecting every bad name or path
//! before anything runs.

use crate::build::{
    pattern_matches, validate_pattern, ArtifactStore, FileMapping, PipelineRegistry,
    PipelineRunner, StoreLayout, TaskDescriptor, TaskExecutor, TaskRegistry,
};
use crate::config::{
    load_config, merge_cli_overrides, project_root, CliOverrides, ConfigError,
    ConfigValidationError, TargetConfig, TasklineConfig,
};
use crate::tasks::{builtin, check_descriptor, Options, BUILTIN_KINDS};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A loaded, validated project.
#[derive(Debug, Clone)]
pub struct Project {
    config: TasklineConfig,
    registry: TaskRegistry,
    pipelines: PipelineRegistry,
    store: ArtifactStore,
}

fn problem(field: impl Into<String>, message: impl Into<String>) -> String {
    ConfigValidationError::new(field, message).to_string()
}

/// Build the file mappings of one target in declared order.
fn file_mappings(target: &TargetConfig) -> Vec<FileMapping> {
    let mut files = Vec::new();
    if !target.src.is_empty() {
        files.push(FileMapping { dest: target.dest.clone(), src: target.src.clone() });
    }
    for (dest, src) in &target.files {
        files.push(FileMapping::to(dest, src.clone()));
    }
    files
}

impl Project {
    /// Find, parse and assemble the project.
    ///
    /// `path` overrides discovery; `overrides` replace the intermediate
    /// and distribution roots.
    pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        let (mut config, config_path) = load_config(path)?;
        merge_cli_overrides(&mut config, overrides);

        let root = match project_root(&config_path) {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        debug!(config = %config_path.display(), root = %root.display(), "loaded configuration");
        Self::from_config(config, root)
    }

    /// Assemble a project rooted at `root`. All problems are reported together.
    pub fn from_config(config: TasklineConfig, root: PathBuf) -> Result<Self, ConfigError> {
        let mut errors: Vec<String> = config.validate().iter().map(|e| e.to_string()).collect();
        let store = ArtifactStore::new(root, StoreLayout::from(&config.project));
        let mut registry = TaskRegistry::new();

        for (task_name, task) in &config.tasks {
            let known_kind = BUILTIN_KINDS.contains(&task.kind.as_str());
            if !known_kind {
                errors.push(problem(
                    format!("tasks.{}.kind", task_name),
                    format!("unknown kind '{}' (expected one of: {})", task.kind, BUILTIN_KINDS.join(", ")),
                ));
            }
            let defaults = Options::new(task.options.clone());

            for (target_name, target) in &task.targets {
                let field = format!("tasks.{}.targets.{}", task_name, target_name);
                let options = Options::new(target.options.clone()).merged_over(&defaults);
                let mut descriptor = TaskDescriptor::new(task_name.as_str(), target_name.as_str(), task.kind.as_str())
                    .with_options(options);
                descriptor.files = file_mappings(target);

                let patterns = descriptor.input_patterns();
                for pattern in &patterns {
                    if let Err(e) = validate_pattern(pattern) {
                        errors.push(problem(&field, e.to_string()));
                    }
                }

                for dest in descriptor.outputs() {
                    if !store.is_writable(dest) {
                        errors.push(problem(
                            &field,
                            format!(
                                "output '{}' must be inside the intermediate or distribution tree",
                                dest.display()
                            ),
                        ));
                    }
                    if let Some(pattern) = patterns.iter().find(|p| pattern_matches(p, dest)) {
                        errors.push(problem(
                            &field,
                            format!("output '{}' matches its own input pattern '{}'", dest.display(), pattern),
                        ));
                    }
                }

                if known_kind {
                    for message in check_descriptor(&descriptor, &store) {
                        errors.push(problem(&field, message));
                    }
                }

                registry.insert(descriptor);
            }
        }

        for name in config.pipelines.keys() {
            if config.tasks.contains_key(name) {
                errors.push(problem(
                    format!("pipelines.{}", name),
                    "is also the name of a task",
                ));
            }
        }

        let pipelines = match PipelineRegistry::from_entries(&config.pipelines) {
            Ok(pipelines) => {
                for definition in pipelines.definitions() {
                    for step in &definition.steps {
                        if let Err(e) = registry.resolve(&step.task, step.target.as_deref()) {
                            errors.push(problem(format!("pipelines.{}", definition.name), e.to_string()));
                        }
                    }
                }
                pipelines
            }
            Err(problems) => {
                errors.extend(problems.into_iter().map(|p| problem("pipelines", p)));
                PipelineRegistry::new()
            }
        };

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }

        Ok(Self { config, registry, pipelines, store })
    }

    pub fn config(&self) -> &TasklineConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.project.name
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn pipelines(&self) -> &PipelineRegistry {
        &self.pipelines
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Pipeline run when no reference is given.
    pub fn default_pipeline(&self) -> Option<&str> {
        self.config.project.default_pipeline.as_deref()
    }

    /// Executor with every task bound to its built-in kind.
    pub fn executor(&self) -> TaskExecutor {
        let mut executor = TaskExecutor::new(self.registry.clone(), self.store.clone());
        for (name, task) in &self.config.tasks {
            if let Some(implementation) = builtin(&task.kind) {
                executor.register_boxed(name.clone(), implementation);
            }
        }
        executor
    }

    /// Runner over this project's pipelines.
    pub fn into_runner(self) -> PipelineRunner {
        let executor = self.executor();
        PipelineRunner::new(executor, self.pipelines)
    }
}
