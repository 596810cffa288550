//! Configuration schema types for `taskline.toml`
//!
//! Defines the structure and the structural validation rules for a
//! taskline project. Cross-references between tasks and pipelines are
//! checked when the project is assembled (see [`crate::project`]).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "taskline.toml";

/// Project metadata and artifact layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required)
    pub name: String,
    /// Hand-authored source tree, never written by the pipeline
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Intermediate tree, overwritten freely between runs
    #[serde(default = "default_temp")]
    pub temp: PathBuf,
    /// Distribution tree holding the final deliverables
    #[serde(default = "default_dist")]
    pub dist: PathBuf,
    /// Pipeline run by `taskline run` when no reference is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_pipeline: Option<String>,
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_temp() -> PathBuf {
    PathBuf::from("temp")
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

/// One task: the implementation kind, shared options and its targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Implementation kind (e.g. "exec", "concat", "css-minify")
    pub kind: String,
    /// Options shared by every target; target options take precedence
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub options: toml::Table,
    /// Named targets; `main` is the default
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
}

/// One target of a task.
///
/// Inputs are given either as `src` (optionally with a single `dest`) or
/// as a `files` table mapping each destination to its source patterns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Input patterns, in declared order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub src: Vec<String>,
    /// Destination for `src`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<PathBuf>,
    /// Destination to source-pattern mapping
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub files: IndexMap<String, Vec<String>>,
    /// Target-specific options
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub options: toml::Table,
}

/// Root configuration structure for `taskline.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasklineConfig {
    /// Project metadata (required)
    pub project: ProjectConfig,
    /// Task definitions keyed by task name
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskConfig>,
    /// Pipelines keyed by name, each an ordered list of references
    #[serde(default)]
    pub pipelines: BTreeMap<String, Vec<String>>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "tasks.less.targets.main.files")
    pub field: String,
    /// Error message
    pub message: String,
}

impl ConfigValidationError {
    /// Create a validation error for a field.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: '{}' {}", CONFIG_FILE_NAME, self.field, self.message)
    }
}

/// Normalized form of a root directory.
///
/// `None` unless the path is relative, has no `..` segments and names a
/// directory below the project root rather than the root itself.
fn contained_root(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!normalized.as_os_str().is_empty()).then_some(normalized)
}

fn overlaps(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

impl TasklineConfig {
    /// Validate the structure of the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.trim().is_empty() {
            errors.push(ConfigValidationError::new("project.name", "must be a non-empty string"));
        }

        let mut roots = Vec::new();
        for (field, root) in [
            ("project.src", &self.project.src),
            ("project.temp", &self.project.temp),
            ("project.dist", &self.project.dist),
        ] {
            match contained_root(root) {
                Some(normalized) => roots.push(normalized),
                None => errors.push(ConfigValidationError::new(
                    field,
                    format!("must name a directory inside the project, got '{}'", root.display()),
                )),
            }
        }

        // Writable trees must not contain or sit inside each other or the sources.
        if let [src, temp, dist] = roots.as_slice() {
            for (field, root, other, other_field) in [
                ("project.dist", dist, temp, "project.temp"),
                ("project.temp", temp, src, "project.src"),
                ("project.dist", dist, src, "project.src"),
            ] {
                if overlaps(root, other) {
                    errors.push(ConfigValidationError::new(
                        field,
                        format!("must not overlap {} ('{}')", other_field, other.display()),
                    ));
                }
            }
        }

        for (name, task) in &self.tasks {
            if name.is_empty() || name.contains(':') {
                errors.push(ConfigValidationError::new(
                    format!("tasks.{}", name),
                    "task names must be non-empty and must not contain ':'",
                ));
            }

            if task.targets.is_empty() {
                errors.push(ConfigValidationError::new(
                    format!("tasks.{}.targets", name),
                    "must define at least one target",
                ));
            }

            for (target_name, target) in &task.targets {
                let field = format!("tasks.{}.targets.{}", name, target_name);

                if target_name.is_empty() || target_name.contains(':') {
                    errors.push(ConfigValidationError::new(
                        &field,
                        "target names must be non-empty and must not contain ':'",
                    ));
                }

                let has_src = !target.src.is_empty();
                let has_files = !target.files.is_empty();
                match (has_src, has_files) {
                    (false, false) => errors.push(ConfigValidationError::new(
                        &field,
                        "must declare inputs with either 'src' or 'files'",
                    )),
                    (true, true) => errors.push(ConfigValidationError::new(
                        &field,
                        "must not declare both 'src' and 'files'",
                    )),
                    _ => {}
                }

                if target.dest.is_some() && !has_src {
                    errors.push(ConfigValidationError::new(
                        format!("{}.dest", field),
                        "requires 'src'",
                    ));
                }

                for (dest, patterns) in &target.files {
                    if patterns.is_empty() {
                        errors.push(ConfigValidationError::new(
                            format!("{}.files.{}", field, dest),
                            "must list at least one source pattern",
                        ));
                    }
                }
            }
        }

        if let Some(default) = &self.project.default_pipeline {
            if !self.pipelines.contains_key(default) {
                errors.push(ConfigValidationError::new(
                    "project.default_pipeline",
                    format!("names unknown pipeline '{}'", default),
                ));
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
