//! Kinds backed by external programs.
//!
//! Lint, style preprocessing, browser tests and script minification are
//! delegated to the project's own tools. Each run is one blocking process
//! call in the project root; exit status 0 is success, anything else is
//! a failure carrying the tail of the tool's output.

use super::{Invocation, MinifyOptions, Options, TaskImplementation, TaskOutcome, TestRunnerOptions};
use crate::build::{ArtifactStore, StoreError};
use serde_json::json;
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Lines of tool output kept as diagnostics.
const DIAGNOSTIC_LINES: usize = 20;

/// Placeholder replaced by every source path, one argument each.
const SOURCES_PLACEHOLDER: &str = "{sources}";

/// A prepared process invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSpec {
    /// Program to run, looked up on `PATH`
    pub program: String,
    /// Arguments after placeholder expansion
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    /// Create a spec with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), env: Vec::new() }
    }

    /// Run the process in `cwd` and map its exit status to an outcome.
    pub fn run(&self, cwd: &Path) -> TaskOutcome {
        debug!(program = %self.program, args = ?self.args, "spawning");

        let output = match Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(cwd)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                return TaskOutcome::failure(format!("failed to start '{}': {}", self.program, e));
            }
        };

        if output.status.success() {
            return TaskOutcome::Success;
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() { tail(&stdout) } else { tail(&stderr) };

        let status = match output.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "a signal".to_string(),
        };
        if detail.is_empty() {
            TaskOutcome::failure(format!("'{}' failed with {}", self.program, status))
        } else {
            TaskOutcome::failure(format!("'{}' failed with {}:\n{}", self.program, status, detail))
        }
    }
}

/// Keep the last non-empty lines of tool output.
fn tail(text: &str) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_LINES);
    lines[start..].join("\n")
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Expand `{sources}`, `{dest}` and `{root}` in configured arguments.
///
/// When no argument is exactly `{sources}`, the sources are appended.
pub fn expand_args(
    args: &[String],
    sources: &[PathBuf],
    dest: Option<&Path>,
    root: &Path,
) -> Vec<String> {
    let dest = dest.map(path_arg).unwrap_or_default();
    let root = path_arg(root);
    let mut expanded = Vec::with_capacity(args.len() + sources.len());
    let mut spliced = false;

    for arg in args {
        if arg == SOURCES_PLACEHOLDER {
            expanded.extend(sources.iter().map(|s| path_arg(s)));
            spliced = true;
        } else {
            expanded.push(arg.replace("{dest}", &dest).replace("{root}", &root));
        }
    }

    if !spliced {
        expanded.extend(sources.iter().map(|s| path_arg(s)));
    }
    expanded
}

/// Read `options.env` as string pairs.
fn env_pairs(invocation: &Invocation<'_>) -> Vec<(String, String)> {
    invocation
        .options()
        .get("env")
        .and_then(toml::Value::as_table)
        .map(|table| {
            table
                .iter()
                .map(|(k, v)| {
                    let value = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                    (k.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Fail if a declared output is missing after a successful tool run.
fn check_outputs<'a>(
    outputs: impl IntoIterator<Item = &'a Path>,
    store: &ArtifactStore,
) -> TaskOutcome {
    for dest in outputs {
        if !store.exists(dest) {
            return TaskOutcome::failure(format!(
                "declared output '{}' was not produced",
                dest.display()
            ));
        }
    }
    TaskOutcome::Success
}

/// Generic external command (`kind = "exec"`).
///
/// Options: `program` (required), `args`, `env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exec;

impl TaskImplementation for Exec {
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        let options = invocation.options();
        let Some(program) = options.get_str("program") else {
            return Ok(TaskOutcome::failure("missing 'program' option"));
        };
        let args = match options.get_str_list("args") {
            Ok(args) => args,
            Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
        };

        let outputs = invocation.descriptor.outputs();
        for dest in &outputs {
            store.prepare_output(dest)?;
        }

        let spec = ProcessSpec {
            program: program.to_string(),
            args: expand_args(&args, invocation.sources, outputs.first().copied(), store.root()),
            env: env_pairs(invocation),
        };

        match spec.run(store.root()) {
            TaskOutcome::Success => Ok(check_outputs(outputs, store)),
            failure => Ok(failure),
        }
    }
}

/// Browser test runner (`kind = "browser-test"`).
///
/// Writes a runner config module (`module.exports = function (config)`)
/// into the intermediate tree and hands its path to the runner program
/// (default `karma start`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTest;

impl BrowserTest {
    /// Project-relative path of the generated runner config.
    pub fn config_path(invocation: &Invocation<'_>, store: &ArtifactStore) -> PathBuf {
        let descriptor = invocation.descriptor;
        store
            .layout()
            .intermediate
            .join(format!("{}-{}.conf.js", descriptor.task, descriptor.target))
    }

    /// Runner configuration document.
    ///
    /// Runner settings without a typed field (preprocessors, reporter
    /// settings) pass through unchanged. `basePath` is the project root, so
    /// the project-relative `files` resolve wherever the config lives.
    pub fn config_document(
        options: &Options,
        runner: &TestRunnerOptions,
        sources: &[PathBuf],
        root: &Path,
    ) -> serde_json::Value {
        let mut document = match options.to_json() {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        for key in PROCESS_KEYS.iter().chain(RUNNER_ALIASES) {
            document.remove(*key);
        }

        let mut files: Vec<String> = sources.iter().map(|s| path_arg(s)).collect();
        files.extend(runner.files.iter().cloned());

        document.insert("basePath".to_string(), json!(path_arg(root)));
        document.insert("frameworks".to_string(), json!(runner.frameworks));
        document.insert("browsers".to_string(), json!(runner.browsers));
        document.insert("reporters".to_string(), json!(runner.report_formats));
        document.insert("files".to_string(), json!(files));
        document.insert("singleRun".to_string(), json!(runner.single_run));
        serde_json::Value::Object(document)
    }

    /// Render the document as a config module the runner can load.
    pub fn config_module(document: &serde_json::Value) -> String {
        let body = serde_json::to_string_pretty(document).unwrap_or_default();
        format!("module.exports = function (config) {{\n  config.set({});\n}};\n", body.replace('\n', "\n  "))
    }
}

/// Options consumed by the process call rather than the runner.
const PROCESS_KEYS: &[&str] = &["program", "args", "env"];

/// Spellings of typed runner fields that are re-emitted under one name.
const RUNNER_ALIASES: &[&str] = &["report_formats", "reportFormats", "single_run"];

impl TaskImplementation for BrowserTest {
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        let options = invocation.options();
        let runner: TestRunnerOptions = match options.parse() {
            Ok(runner) => runner,
            Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
        };

        let config_path = Self::config_path(invocation, store);
        let document = Self::config_document(options, &runner, invocation.sources, store.root());
        store.write(&config_path, Self::config_module(&document).as_bytes())?;

        let mut args = match options.get("args") {
            Some(_) => match options.get_str_list("args") {
                Ok(args) => args,
                Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
            },
            None => vec!["start".to_string()],
        };
        args.push(path_arg(&config_path));
        if runner.single_run {
            args.push("--single-run".to_string());
        }

        let spec = ProcessSpec {
            program: options.get_str("program").unwrap_or("karma").to_string(),
            args,
            env: env_pairs(invocation),
        };
        Ok(spec.run(store.root()))
    }
}

/// Script minifier (`kind = "script-minify"`), one run per destination.
///
/// Invokes `program` (default `uglifyjs`) as
/// `<sources> <args> --output <dest> [--source-map "filename='<dest name>',url='<map url>'"]`.
/// The tool always writes its map next to the output as `<dest>.map`; a
/// configured map destination is reached by moving that file afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptMinify;

impl TaskImplementation for ScriptMinify {
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        let options = invocation.options();
        let minify: MinifyOptions = match options.parse() {
            Ok(minify) => minify,
            Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
        };
        let extra = match options.get("args") {
            Some(_) => match options.get_str_list("args") {
                Ok(args) => args,
                Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
            },
            None => vec!["--compress".to_string(), "--mangle".to_string()],
        };
        let program = options.get_str("program").unwrap_or("uglifyjs");

        for (dest, sources) in invocation.outputs() {
            store.prepare_output(dest)?;

            let mut args: Vec<String> = sources.iter().map(|s| path_arg(s)).collect();
            args.extend(extra.iter().cloned());
            args.push("--output".to_string());
            args.push(path_arg(dest));

            let map = minify.source_map_for(dest);
            if let Some(map) = &map {
                store.prepare_output(map)?;
                args.push("--source-map".to_string());
                args.push(source_map_arg(dest, map));
            }

            let spec = ProcessSpec { program: program.to_string(), args, env: env_pairs(invocation) };
            if let TaskOutcome::Failure(message) = spec.run(store.root()) {
                return Ok(TaskOutcome::Failure(message));
            }

            let mut produced = vec![dest.to_path_buf()];
            if let Some(map) = map {
                let written = tool_map_path(dest);
                if map != written && store.exists(&written) {
                    store.rename(&written, &map)?;
                }
                produced.push(map);
            }
            if let TaskOutcome::Failure(message) =
                check_outputs(produced.iter().map(PathBuf::as_path), store)
            {
                return Ok(TaskOutcome::Failure(message));
            }
        }

        Ok(TaskOutcome::Success)
    }
}

/// Where the minifier writes the map for `dest`.
fn tool_map_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".map");
    PathBuf::from(name)
}

/// `--source-map` value: the output's file name and the map's URL
/// relative to the output's directory.
fn source_map_arg(dest: &Path, map: &Path) -> String {
    let filename = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let url = relative_url(dest.parent().unwrap_or(Path::new("")), map);
    format!("filename='{}',url='{}'", filename, url)
}

fn relative_url(from_dir: &Path, to: &Path) -> String {
    let from: Vec<_> = from_dir.components().filter(|c| !matches!(c, Component::CurDir)).collect();
    let to_parts: Vec<_> = to.components().filter(|c| !matches!(c, Component::CurDir)).collect();
    let common = from.iter().zip(&to_parts).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(to_parts[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    parts.join("/")
}
