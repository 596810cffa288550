//! Taskline - command-line runner for declarative front-end pipelines

use std::process::ExitCode;

use taskline::cli;

fn main() -> ExitCode {
    cli::run()
}
