//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod info;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::build::BuildError;
use crate::config::{CliOverrides, ConfigError};
use crate::project::Project;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Taskline - declarative task pipelines for front-end builds
#[derive(Parser)]
#[command(name = "taskline")]
#[command(about = "Taskline - run declarative lint, test and bundle pipelines")]
#[command(version)]
pub struct Cli {
    /// Path to taskline.toml (default: $TASKLINE_CONFIG, then search upwards)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Verbose output (debug logging and per-step detail)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// How pipeline progress is reported
    #[arg(long, global = true, value_enum, default_value = "console")]
    pub progress: ProgressFormat,

    /// Override the intermediate directory
    #[arg(long, global = true)]
    pub temp: Option<PathBuf>,

    /// Override the distribution directory
    #[arg(long, global = true)]
    pub dist: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Progress output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProgressFormat {
    /// Human-readable lines on stderr
    Console,
    /// One JSON object per event on stdout
    Json,
    /// No progress output
    None,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the `test` pipeline
    Test,

    /// Run the `build` pipeline
    Build,

    /// Run pipelines or task references in order
    Run {
        /// Pipeline names or `task[:target]` references (default: the
        /// project's default pipeline)
        refs: Vec<String>,
    },

    /// Show resolved steps and their expanded inputs without running them
    Plan {
        /// Pipeline name or `task[:target]` reference
        name: String,
    },

    /// List tasks, targets and pipelines
    List,

    /// Load and validate the configuration only
    Check,

    /// Write a starter taskline.toml for a single-page web application
    Init {
        /// Project directory (default: current directory)
        path: Option<PathBuf>,

        /// Project name (default: directory name)
        #[arg(long)]
        name: Option<String>,
    },
}

/// Entry point of the `taskline` binary.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    crate::logging::init(crate::logging::level(&cli.log_level, cli.verbose));

    let overrides = CliOverrides { temp: cli.temp.clone(), dist: cli.dist.clone() };
    let options = build::RunOptions { progress: cli.progress, verbose: cli.verbose };

    match cli.command {
        Commands::Test => build::run_named_pipeline(cli.config.as_deref(), &overrides, "test", options),
        Commands::Build => build::run_named_pipeline(cli.config.as_deref(), &overrides, "build", options),
        Commands::Run { refs } => build::run_pipelines(cli.config.as_deref(), &overrides, &refs, options),
        Commands::Plan { name } => info::run_plan(cli.config.as_deref(), &overrides, &name),
        Commands::List => info::run_list(cli.config.as_deref(), &overrides),
        Commands::Check => info::run_check(cli.config.as_deref(), &overrides),
        Commands::Init { path, name } => build::run_init(path.as_deref(), name.as_deref()),
    }
}

/// Load the project, printing the problem and choosing the exit code on failure.
pub(crate) fn load_project(config: Option<&Path>, overrides: &CliOverrides) -> Result<Project, ExitCode> {
    Project::load(config, overrides).map_err(|e| report_config_error(&e))
}

/// Print a configuration error and return its exit code.
pub(crate) fn report_config_error(error: &ConfigError) -> ExitCode {
    match error {
        ConfigError::Validation(problems) => {
            eprintln!("Error: invalid configuration");
            for problem in problems {
                eprintln!("  {}", problem);
            }
        }
        ConfigError::NotFound(_) => {
            eprintln!("Error: {}", error);
            eprintln!("Run 'taskline init' to create one");
        }
        _ => eprintln!("Error: {}", error),
    }
    ExitCode::from(config_exit_code(error))
}

/// Print a build error and return its exit code.
pub(crate) fn report_build_error(error: &BuildError) -> ExitCode {
    eprintln!("Error: {}", error);
    if error.is_configuration() {
        ExitCode::from(EXIT_INVALID_ARGS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

fn config_exit_code(error: &ConfigError) -> u8 {
    match error {
        ConfigError::Io(_) => EXIT_ERROR,
        _ => EXIT_INVALID_ARGS,
    }
}
