//! Pipeline and init command implementations

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{load_project, report_build_error, ProgressFormat, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::progress::{ConsoleProgress, JsonProgress, NullProgress, ProgressReporter};
use crate::build::{BuildError, TaskRef};
use crate::config::CliOverrides;
use crate::project::Project;

/// Output switches shared by the pipeline commands.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub progress: ProgressFormat,
    pub verbose: bool,
}

fn reporter(options: RunOptions) -> Box<dyn ProgressReporter> {
    match options.progress {
        ProgressFormat::Console => Box::new(
            ConsoleProgress::new()
                .with_colors(std::io::stderr().is_terminal())
                .with_verbose(options.verbose),
        ),
        ProgressFormat::Json => Box::new(JsonProgress::with_output(std::io::stdout())),
        ProgressFormat::None => Box::new(NullProgress::new()),
    }
}

/// Expand command-line entries into one ordered step list.
///
/// Every step is resolved before anything runs, so a typo in the last
/// entry does not leave the first entries' artifacts behind.
fn resolve_steps(project: &Project, entries: &[String]) -> Result<Vec<TaskRef>, BuildError> {
    let mut steps = Vec::new();
    for entry in entries {
        steps.extend(project.pipelines().steps_for(entry)?);
    }
    check_steps(project, steps)
}

/// Steps of a pipeline, with no fallback to a task of the same name.
fn pipeline_steps(project: &Project, name: &str) -> Result<Vec<TaskRef>, BuildError> {
    let steps = project.pipelines().resolve(name)?.steps.clone();
    check_steps(project, steps)
}

fn check_steps(project: &Project, steps: Vec<TaskRef>) -> Result<Vec<TaskRef>, BuildError> {
    for step in &steps {
        project.registry().resolve(&step.task, step.target.as_deref())?;
    }
    Ok(steps)
}

/// Execute the run command.
pub fn run_pipelines(
    config: Option<&Path>,
    overrides: &CliOverrides,
    entries: &[String],
    options: RunOptions,
) -> ExitCode {
    let project = match load_project(config, overrides) {
        Ok(project) => project,
        Err(code) => return code,
    };

    let entries: Vec<String> = if entries.is_empty() {
        match project.default_pipeline() {
            Some(name) => vec![name.to_string()],
            None => {
                eprintln!("Error: no pipeline given and no default_pipeline configured");
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        }
    } else {
        entries.to_vec()
    };

    match resolve_steps(&project, &entries) {
        Ok(steps) => execute(project, &entries.join(" "), &steps, options),
        Err(e) => report_build_error(&e),
    }
}

/// Execute the test/build commands, which always name a pipeline.
pub fn run_named_pipeline(
    config: Option<&Path>,
    overrides: &CliOverrides,
    name: &str,
    options: RunOptions,
) -> ExitCode {
    let project = match load_project(config, overrides) {
        Ok(project) => project,
        Err(code) => return code,
    };

    match pipeline_steps(&project, name) {
        Ok(steps) => execute(project, name, &steps, options),
        Err(e) => report_build_error(&e),
    }
}

fn execute(project: Project, label: &str, steps: &[TaskRef], options: RunOptions) -> ExitCode {
    let runner = project.into_runner().with_progress(reporter(options));
    let result = match runner.run_refs(label, steps) {
        Ok(result) => result,
        Err(e) => return report_build_error(&e),
    };

    if result.is_success() {
        if options.progress != ProgressFormat::Json {
            println!("{}", result.summary());
            if options.verbose {
                for output in result.all_outputs() {
                    println!("  {}", output.display());
                }
            }
        }
        ExitCode::from(EXIT_SUCCESS)
    } else {
        eprintln!("{}", result.summary());
        ExitCode::from(EXIT_ERROR)
    }
}

/// Execute the init command.
pub fn run_init(path: Option<&Path>, name: Option<&str>) -> ExitCode {
    use crate::init::{init_project, InitError, STARTER_FILES};

    let project_path = match path {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let project_name = name
        .map(|n| n.to_string())
        .or_else(|| project_path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "webapp".to_string());

    match init_project(&project_path, &project_name) {
        Ok(()) => {
            println!("Created taskline project '{}' at {}", project_name, project_path.display());
            println!();
            for file in STARTER_FILES {
                println!("  {}", file);
            }
            println!();
            println!("Next steps:");
            println!("  cd {}", project_path.display());
            println!("  taskline list");
            println!("  taskline build");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(InitError::AlreadyInitialized(file)) => {
            eprintln!("Error: {} already exists", file);
            eprintln!("Edit it directly or choose another directory");
            ExitCode::from(EXIT_INVALID_ARGS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
