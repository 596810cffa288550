//! Task descriptors and task references.
//!
//! A descriptor is one configured target of a task: its input patterns,
//! output mappings and resolved options. A reference names a descriptor
//! from inside a pipeline as `task` or `task:target`.

use crate::tasks::Options;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Target used when a reference does not name one.
pub const DEFAULT_TARGET: &str = "main";

/// Malformed `task[:target]` reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid task reference '{0}': expected 'task' or 'task:target'")]
pub struct RefParseError(pub String);

/// Reference to a task target from a pipeline or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskRef {
    /// Task name
    pub task: String,
    /// Explicit target, if any
    pub target: Option<String>,
}

impl TaskRef {
    /// Reference a task's default target.
    pub fn new(task: impl Into<String>) -> Self {
        Self { task: task.into(), target: None }
    }

    /// Reference an explicit target.
    pub fn with_target(task: impl Into<String>, target: impl Into<String>) -> Self {
        Self { task: task.into(), target: Some(target.into()) }
    }

    /// Parse `task` or `task:target`.
    pub fn parse(text: &str) -> Result<Self, RefParseError> {
        let invalid = || RefParseError(text.to_string());
        match text.split_once(':') {
            None if !text.is_empty() => Ok(Self::new(text)),
            None => Err(invalid()),
            Some((task, target)) => {
                if task.is_empty() || target.is_empty() || target.contains(':') {
                    Err(invalid())
                } else {
                    Ok(Self::with_target(task, target))
                }
            }
        }
    }

    /// The target this reference resolves to.
    pub fn target_or_default(&self) -> &str {
        self.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}:{}", self.task, target),
            None => write!(f, "{}", self.task),
        }
    }
}

impl std::str::FromStr for TaskRef {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One destination and the patterns selecting its sources.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMapping {
    /// Output path, relative to the project root; `None` for check-only inputs
    pub dest: Option<PathBuf>,
    /// Source patterns in declared order
    pub src: Vec<String>,
}

impl FileMapping {
    /// Mapping with sources and no destination.
    pub fn inputs(src: Vec<String>) -> Self {
        Self { dest: None, src }
    }

    /// Mapping with a destination.
    pub fn to(dest: impl Into<PathBuf>, src: Vec<String>) -> Self {
        Self { dest: Some(dest.into()), src }
    }
}

/// A configured task target. Immutable once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    /// Task name
    pub task: String,
    /// Target name
    pub target: String,
    /// Implementation kind the task is bound to
    pub kind: String,
    /// File mappings in declared order
    pub files: Vec<FileMapping>,
    /// Options with task-level defaults already merged in
    pub options: Options,
}

impl TaskDescriptor {
    /// Create a descriptor with no files or options.
    pub fn new(task: impl Into<String>, target: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            target: target.into(),
            kind: kind.into(),
            files: Vec::new(),
            options: Options::default(),
        }
    }

    /// Add a file mapping.
    pub fn with_files(mut self, mapping: FileMapping) -> Self {
        self.files.push(mapping);
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Identifier in `task:target` form.
    pub fn id(&self) -> String {
        format!("{}:{}", self.task, self.target)
    }

    /// All input patterns across mappings, in declared order.
    pub fn input_patterns(&self) -> Vec<String> {
        self.files.iter().flat_map(|m| m.src.iter().cloned()).collect()
    }

    /// All declared destinations, in declared order.
    pub fn outputs(&self) -> Vec<&Path> {
        self.files.iter().filter_map(|m| m.dest.as_deref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_ref_parse_plain() {
        let r = TaskRef::parse("jshint").unwrap();
        assert_eq!(r, TaskRef::new("jshint"));
        assert_eq!(r.target_or_default(), "main");
        assert_eq!(r.to_string(), "jshint");
    }

    #[test]
    fn test_task_ref_parse_with_target() {
        let r: TaskRef = "karma:unit".parse().unwrap();
        assert_eq!(r.task, "karma");
        assert_eq!(r.target.as_deref(), Some("unit"));
        assert_eq!(r.target_or_default(), "unit");
        assert_eq!(r.to_string(), "karma:unit");
    }

    #[test]
    fn test_task_ref_parse_invalid() {
        for bad in ["", ":main", "less:", "a:b:c"] {
            assert!(TaskRef::parse(bad).is_err(), "'{}' should be rejected", bad);
        }
    }

    #[test]
    fn test_descriptor_id_and_patterns() {
        let descriptor = TaskDescriptor::new("ngAnnotate", "main", "concat").with_files(
            FileMapping::to(
                "temp/app.js",
                vec!["lib/angular.js".to_string(), "src/**/*.js".to_string()],
            ),
        );

        assert_eq!(descriptor.id(), "ngAnnotate:main");
        assert_eq!(descriptor.input_patterns(), vec!["lib/angular.js", "src/**/*.js"]);
        assert_eq!(descriptor.outputs(), vec![Path::new("temp/app.js")]);
    }

    #[test]
    fn test_descriptor_without_outputs() {
        let descriptor = TaskDescriptor::new("jshint", "main", "exec")
            .with_files(FileMapping::inputs(vec!["src/**/*.js".to_string()]));

        assert!(descriptor.outputs().is_empty());
        assert_eq!(descriptor.input_patterns().len(), 1);
    }
}
