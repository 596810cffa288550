//! Task implementations.
//!
//! The orchestration core never knows what a task does. Every descriptor
//! is bound to a *kind*, and every kind implements [`TaskImplementation`].
//! Built-in kinds cover the front-end build: running external tools,
//! concatenating scripts, minifying CSS and precompiling HTML templates.

pub mod concat;
pub mod copy;
pub mod css;
pub mod exec;
pub mod html;
pub mod options;
pub mod templates;

pub use options::*;

use crate::build::{ArtifactStore, StoreError, TaskDescriptor};
use std::path::{Path, PathBuf};

/// Sources selected for one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMapping {
    /// Output path, relative to the project root
    pub dest: Option<PathBuf>,
    /// Expanded sources in declared order
    pub sources: Vec<PathBuf>,
}

/// Everything an implementation receives for one run.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// The descriptor being executed
    pub descriptor: &'a TaskDescriptor,
    /// All expanded sources across mappings, in order
    pub sources: &'a [PathBuf],
    /// Expanded sources per destination
    pub mappings: &'a [ResolvedMapping],
}

impl Invocation<'_> {
    /// Merged options of the target.
    pub fn options(&self) -> &Options {
        &self.descriptor.options
    }

    /// `task:target` identifier.
    pub fn id(&self) -> String {
        self.descriptor.id()
    }

    /// Mappings that declare a destination.
    pub fn outputs(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.mappings
            .iter()
            .filter_map(|m| m.dest.as_deref().map(|dest| (dest, m.sources.as_slice())))
    }
}

/// Outcome reported by an implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The transformation succeeded
    Success,
    /// The tool reported a quality or correctness problem
    Failure(String),
}

impl TaskOutcome {
    /// Build a failure outcome.
    pub fn failure(diagnostics: impl Into<String>) -> Self {
        TaskOutcome::Failure(diagnostics.into())
    }

    /// Check if the outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Capability interface every task kind implements.
///
/// Returning `Err` means the artifact store failed and the run must stop.
/// Tool-level problems are reported as [`TaskOutcome::Failure`].
pub trait TaskImplementation {
    /// Run the transformation.
    fn run(&self, invocation: &Invocation<'_>, store: &ArtifactStore)
        -> Result<TaskOutcome, StoreError>;
}

impl<F> TaskImplementation for F
where
    F: Fn(&Invocation<'_>, &ArtifactStore) -> Result<TaskOutcome, StoreError>,
{
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        self(invocation, store)
    }
}

/// Kinds available in `taskline.toml`.
pub const BUILTIN_KINDS: &[&str] =
    &["exec", "browser-test", "script-minify", "concat", "css-minify", "html-templates", "copy"];

/// Instantiate the implementation of a built-in kind.
pub fn builtin(kind: &str) -> Option<Box<dyn TaskImplementation>> {
    let implementation: Box<dyn TaskImplementation> = match kind {
        "exec" => Box::new(exec::Exec),
        "browser-test" => Box::new(exec::BrowserTest),
        "script-minify" => Box::new(exec::ScriptMinify),
        "concat" => Box::new(concat::Concat),
        "css-minify" => Box::new(css::CssMinify),
        "html-templates" => Box::new(templates::HtmlTemplates),
        "copy" => Box::new(copy::Copy),
        _ => return None,
    };
    Some(implementation)
}

/// Check a descriptor against its kind's expectations at load time.
///
/// Returns human-readable problems; an empty list means the descriptor
/// can run.
pub fn check_descriptor(descriptor: &TaskDescriptor, store: &ArtifactStore) -> Vec<String> {
    let mut problems = Vec::new();
    let options = &descriptor.options;
    let needs_dest = |problems: &mut Vec<String>| {
        if descriptor.files.iter().any(|m| m.dest.is_none()) {
            problems.push(format!("kind '{}' needs a destination for every input", descriptor.kind));
        }
    };

    match descriptor.kind.as_str() {
        "exec" => {
            if options.get_str("program").is_none() {
                problems.push("kind 'exec' requires a 'program' option".to_string());
            }
            if let Err(e) = options.get_str_list("args") {
                problems.push(e.0);
            }
        }
        "browser-test" => {
            if let Err(e) = options.parse::<TestRunnerOptions>() {
                problems.push(e.to_string());
            }
        }
        "script-minify" => {
            needs_dest(&mut problems);
            match options.parse::<MinifyOptions>() {
                Ok(minify) => {
                    for dest in descriptor.outputs() {
                        if let Some(map) = minify.source_map_for(dest) {
                            if !store.is_writable(&map) {
                                problems.push(format!(
                                    "source map '{}' must be inside the intermediate or distribution tree",
                                    map.display()
                                ));
                            }
                        }
                    }
                }
                Err(e) => problems.push(e.to_string()),
            }
        }
        "html-templates" => {
            needs_dest(&mut problems);
            if let Err(e) = options.parse::<TemplateOptions>() {
                problems.push(e.to_string());
            }
        }
        "concat" | "css-minify" | "copy" => needs_dest(&mut problems),
        other => problems.push(format!(
            "unknown kind '{}' (expected one of: {})",
            other,
            BUILTIN_KINDS.join(", ")
        )),
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{FileMapping, StoreLayout};

    fn store() -> ArtifactStore {
        ArtifactStore::new(PathBuf::from("/project"), StoreLayout::default())
    }

    fn options(text: &str) -> Options {
        Options::new(toml::from_str(text).unwrap())
    }

    #[test]
    fn test_every_builtin_kind_instantiates() {
        for kind in BUILTIN_KINDS {
            assert!(builtin(kind).is_some(), "kind '{}' has no implementation", kind);
        }
        assert!(builtin("grunt-contrib-unknown").is_none());
    }

    #[test]
    fn test_closure_implementation() {
        let descriptor = TaskDescriptor::new("noop", "main", "exec");
        let invocation = Invocation { descriptor: &descriptor, sources: &[], mappings: &[] };
        let implementation = |_: &Invocation<'_>, _: &ArtifactStore| {
            Ok::<_, StoreError>(TaskOutcome::failure("nope"))
        };

        let outcome = implementation.run(&invocation, &store()).unwrap();
        assert_eq!(outcome, TaskOutcome::Failure("nope".to_string()));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_check_exec_requires_program() {
        let descriptor = TaskDescriptor::new("jshint", "main", "exec")
            .with_files(FileMapping::inputs(vec!["src/**/*.js".to_string()]));
        let problems = check_descriptor(&descriptor, &store());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("program"));

        let ok = descriptor.with_options(options("program = \"jshint\""));
        assert!(check_descriptor(&ok, &store()).is_empty());
    }

    #[test]
    fn test_check_concat_needs_destination() {
        let descriptor = TaskDescriptor::new("concat", "main", "concat")
            .with_files(FileMapping::inputs(vec!["src/*.js".to_string()]));
        assert!(!check_descriptor(&descriptor, &store()).is_empty());
    }

    #[test]
    fn test_check_templates_requires_module() {
        let descriptor = TaskDescriptor::new("ngtemplates", "main", "html-templates")
            .with_files(FileMapping::to("temp/templates.js", vec!["src/*.html".to_string()]));
        assert!(!check_descriptor(&descriptor, &store()).is_empty());

        let ok = descriptor.with_options(options("module = \"app\""));
        assert!(check_descriptor(&ok, &store()).is_empty());
    }

    #[test]
    fn test_check_script_minify_source_map_location() {
        let descriptor = TaskDescriptor::new("uglify", "main", "script-minify")
            .with_files(FileMapping::to("dist/app.min.js", vec!["temp/app.js".to_string()]))
            .with_options(options("sourceMap = true\nsourceMapName = \"src/app.map\""));
        let problems = check_descriptor(&descriptor, &store());
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("source map"));
    }

    #[test]
    fn test_check_unknown_kind() {
        let descriptor = TaskDescriptor::new("sass", "main", "sass");
        let problems = check_descriptor(&descriptor, &store());
        assert!(problems[0].contains("unknown kind 'sass'"));
    }
}
