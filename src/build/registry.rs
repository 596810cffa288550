//! Task descriptor registry.

use crate::build::descriptor::{TaskDescriptor, DEFAULT_TARGET};
use std::collections::BTreeMap;
use thiserror::Error;

/// A name did not resolve to anything registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    /// No task with this name
    #[error("task '{0}' is not defined")]
    Task(String),
    /// The task exists but has no such target
    #[error("task '{task}' has no target '{target}'")]
    Target { task: String, target: String },
    /// No pipeline with this name
    #[error("pipeline '{0}' is not defined")]
    Pipeline(String),
    /// The task has no implementation bound to it
    #[error("no implementation registered for task '{0}'")]
    Implementation(String),
}

/// Maps task names to their targets.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, BTreeMap<String, TaskDescriptor>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a descriptor under (task, target). A later call with the same
    /// key replaces the earlier descriptor.
    pub fn register(&mut self, task: &str, target: &str, descriptor: TaskDescriptor) {
        self.tasks.entry(task.to_string()).or_default().insert(target.to_string(), descriptor);
    }

    /// Register a descriptor under its own task and target names.
    pub fn insert(&mut self, descriptor: TaskDescriptor) {
        let (task, target) = (descriptor.task.clone(), descriptor.target.clone());
        self.register(&task, &target, descriptor);
    }

    /// Resolve a target; `None` means the `main` target.
    pub fn resolve(&self, task: &str, target: Option<&str>) -> Result<&TaskDescriptor, NotFoundError> {
        let targets = self.tasks.get(task).ok_or_else(|| NotFoundError::Task(task.to_string()))?;
        let target = target.unwrap_or(DEFAULT_TARGET);
        targets.get(target).ok_or_else(|| NotFoundError::Target {
            task: task.to_string(),
            target: target.to_string(),
        })
    }

    /// Whether a task with this name is registered.
    pub fn contains_task(&self, task: &str) -> bool {
        self.tasks.contains_key(task)
    }

    /// Task names, sorted.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.keys().map(String::as_str).collect()
    }

    /// Target names of a task, sorted.
    pub fn targets(&self, task: &str) -> Vec<&str> {
        self.tasks
            .get(task)
            .map(|targets| targets.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every descriptor, sorted by task then target.
    pub fn descriptors(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.tasks.values().flat_map(|targets| targets.values())
    }

    pub fn len(&self) -> usize {
        self.tasks.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TaskRegistry {
        let mut registry = TaskRegistry::new();
        registry.insert(TaskDescriptor::new("karma", "main", "browser-test"));
        registry.insert(TaskDescriptor::new("karma", "ci", "browser-test"));
        registry.insert(TaskDescriptor::new("jshint", "main", "exec"));
        registry
    }

    #[test]
    fn test_resolve_default_is_main() {
        let registry = registry();
        assert_eq!(
            registry.resolve("karma", None).unwrap(),
            registry.resolve("karma", Some("main")).unwrap()
        );
    }

    #[test]
    fn test_resolve_explicit_target() {
        let registry = registry();
        assert_eq!(registry.resolve("karma", Some("ci")).unwrap().target, "ci");
    }

    #[test]
    fn test_explicit_missing_target_does_not_fall_back() {
        let registry = registry();
        assert_eq!(
            registry.resolve("jshint", Some("strict")),
            Err(NotFoundError::Target { task: "jshint".to_string(), target: "strict".to_string() })
        );
    }

    #[test]
    fn test_missing_main_target() {
        let mut registry = TaskRegistry::new();
        registry.insert(TaskDescriptor::new("less", "dev", "exec"));
        assert!(matches!(registry.resolve("less", None), Err(NotFoundError::Target { .. })));
    }

    #[test]
    fn test_unknown_task() {
        assert_eq!(
            registry().resolve("grunt", None),
            Err(NotFoundError::Task("grunt".to_string()))
        );
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut registry = registry();
        registry.register("jshint", "main", TaskDescriptor::new("jshint", "main", "copy"));
        assert_eq!(registry.resolve("jshint", None).unwrap().kind, "copy");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_listing_is_sorted() {
        let registry = registry();
        assert_eq!(registry.task_names(), vec!["jshint", "karma"]);
        assert_eq!(registry.targets("karma"), vec!["ci", "main"]);
        assert!(registry.targets("nope").is_empty());
        assert_eq!(registry.descriptors().count(), 3);
    }
}
