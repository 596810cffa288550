//! Configuration loading and discovery for `taskline.toml`
//!
//! Provides functions to find, load, and override configuration.

use super::schema::{ProjectConfig, TasklineConfig, CONFIG_FILE_NAME};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "TASKLINE_CONFIG";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse taskline.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// No configuration file could be found
    #[error("No taskline.toml found in {} or any parent directory", .0.display())]
    NotFound(PathBuf),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override intermediate directory
    pub temp: Option<PathBuf>,
    /// Override distribution directory
    pub dist: Option<PathBuf>,
}

/// Find the config file for the current invocation.
///
/// Search order:
/// 1. `TASKLINE_CONFIG` if set
/// 2. Walk up from the current directory looking for taskline.toml
pub fn find_config() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return Some(path);
        }
    }

    env::current_dir().ok().and_then(find_config_from)
}

/// Find taskline.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a taskline.toml file.
///
/// If a path is provided, loads from that file. Otherwise uses
/// [`find_config`]. Unlike build tools with sensible empty defaults, a
/// project without a config file has no tasks to run, so a missing file
/// is an error.
///
/// Returns the parsed config together with the path it was read from.
pub fn load_config(path: Option<&Path>) -> Result<(TasklineConfig, PathBuf), ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => match find_config() {
            Some(p) => p,
            None => {
                return Err(ConfigError::NotFound(env::current_dir().unwrap_or_default()));
            }
        },
    };

    let config = load_config_file(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<TasklineConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and structurally validate configuration text.
pub fn parse_config(contents: &str) -> Result<TasklineConfig, ConfigError> {
    let config: TasklineConfig = toml::from_str(contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// An empty configuration with the given project name and default roots.
pub fn default_config(name: &str) -> TasklineConfig {
    TasklineConfig {
        project: ProjectConfig {
            name: name.to_string(),
            src: PathBuf::from("src"),
            temp: PathBuf::from("temp"),
            dist: PathBuf::from("dist"),
            default_pipeline: None,
        },
        tasks: BTreeMap::new(),
        pipelines: BTreeMap::new(),
    }
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values. The result is
/// re-validated by the caller when the project is assembled.
pub fn merge_cli_overrides(config: &mut TasklineConfig, overrides: &CliOverrides) {
    if let Some(ref temp) = overrides.temp {
        config.project.temp = temp.clone();
    }

    if let Some(ref dist) = overrides.dist {
        config.project.dist = dist.clone();
    }
}

/// Get the project root directory from a config file path.
///
/// Returns the parent directory of the taskline.toml file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}
