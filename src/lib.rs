//! Taskline - declarative task pipelines for front-end builds
//!
//! This library provides functionality to:
//! - Load and validate `taskline.toml` task and pipeline definitions
//! - Expand input globs against a source, intermediate and distribution tree
//! - Run named pipelines in order, stopping at the first failing task
//! - Lint, test, concatenate, minify and precompile templates through
//!   built-in task kinds

pub mod build;
pub mod cli;
pub mod config;
pub mod init;
pub mod logging;
pub mod project;
pub mod tasks;
