//! Plan, list and check command implementations

use std::path::Path;
use std::process::ExitCode;

use super::{load_project, report_build_error, EXIT_SUCCESS};
use crate::build::{BuildError, TaskPlan};
use crate::config::CliOverrides;
use crate::project::Project;

/// Render the plan of one pipeline or reference.
///
/// Inputs are expanded against the store as it is now, so files an
/// earlier step would produce are only listed once they exist.
pub fn format_plan(project: &Project, entry: &str) -> Result<String, BuildError> {
    let steps = project.pipelines().steps_for(entry)?;
    let executor = project.executor();

    let mut lines = Vec::new();
    if project.pipelines().contains(entry) {
        lines.push(format!("Pipeline '{}' ({} step(s))", entry, steps.len()));
    } else {
        lines.push(format!("Task '{}'", entry));
    }

    for (index, step) in steps.iter().enumerate() {
        let plan = executor.plan(&step.task, step.target.as_deref())?;
        lines.push(format!("  {}. {} [{}]", index + 1, plan.descriptor.id(), plan.descriptor.kind));
        format_mappings(&plan, &mut lines);
    }

    Ok(lines.join("\n"))
}

fn format_mappings(plan: &TaskPlan<'_>, lines: &mut Vec<String>) {
    for (mapping, resolved) in plan.descriptor.files.iter().zip(&plan.mappings) {
        let patterns = mapping.src.join(", ");
        match &resolved.dest {
            Some(dest) => lines.push(format!("       {} -> {}", patterns, dest.display())),
            None => lines.push(format!("       {}", patterns)),
        }
        if resolved.sources.is_empty() {
            lines.push("         (no files yet)".to_string());
        }
        for source in &resolved.sources {
            lines.push(format!("         {}", source.display()));
        }
    }
}

/// Execute the plan command.
pub fn run_plan(config: Option<&Path>, overrides: &CliOverrides, entry: &str) -> ExitCode {
    let project = match load_project(config, overrides) {
        Ok(project) => project,
        Err(code) => return code,
    };

    match format_plan(&project, entry) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => report_build_error(&e),
    }
}

/// Render the task and pipeline listing.
pub fn format_list(project: &Project) -> String {
    let mut lines = vec![format!("Project '{}'", project.name()), String::new(), "Tasks:".to_string()];

    for (name, task) in &project.config().tasks {
        let targets = project.registry().targets(name).join(", ");
        lines.push(format!("  {:<16} {:<16} {}", name, task.kind, targets));
    }

    lines.push(String::new());
    lines.push("Pipelines:".to_string());
    for definition in project.pipelines().definitions() {
        let marker = if project.default_pipeline() == Some(definition.name.as_str()) { "*" } else { " " };
        let steps: Vec<String> = definition.steps.iter().map(|s| s.to_string()).collect();
        lines.push(format!(" {}{:<16} {}", marker, definition.name, steps.join(" -> ")));
    }

    lines.join("\n")
}

/// Execute the list command.
pub fn run_list(config: Option<&Path>, overrides: &CliOverrides) -> ExitCode {
    match load_project(config, overrides) {
        Ok(project) => {
            println!("{}", format_list(&project));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(code) => code,
    }
}

/// Execute the check command.
pub fn run_check(config: Option<&Path>, overrides: &CliOverrides) -> ExitCode {
    match load_project(config, overrides) {
        Ok(project) => {
            println!(
                "Configuration OK: {} task(s), {} pipeline(s)",
                project.registry().task_names().len(),
                project.pipelines().names().len()
            );
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(code) => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[project]
name = "shop"
default_pipeline = "build"

[tasks.bundle]
kind = "concat"
targets.main = { files = { "temp/app.js" = ["src/*.js"] } }
targets.vendor = { files = { "temp/vendor.js" = ["lib/*.js"] } }

[tasks.cssmin]
kind = "css-minify"
targets.main = { files = { "dist/app.min.css" = ["src/*.css"] } }

[pipelines]
build = ["bundle", "cssmin"]
"#;

    fn project(root: PathBuf) -> Project {
        Project::from_config(parse_config(CONFIG).unwrap(), root).unwrap()
    }

    #[test]
    fn test_plan_lists_expanded_inputs() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/b.js"), "b").unwrap();
        fs::write(temp.path().join("src/a.js"), "a").unwrap();

        let text = format_plan(&project(temp.path().to_path_buf()), "build").unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Pipeline 'build' (2 step(s))");
        assert_eq!(lines[1], "  1. bundle:main [concat]");
        assert_eq!(lines[2], "       src/*.js -> temp/app.js");
        assert_eq!(lines[3].trim(), "src/a.js");
        assert_eq!(lines[4].trim(), "src/b.js");
        assert!(text.contains("(no files yet)"));
    }

    #[test]
    fn test_plan_of_task_reference() {
        let temp = TempDir::new().unwrap();
        let text = format_plan(&project(temp.path().to_path_buf()), "bundle:vendor").unwrap();
        assert!(text.starts_with("Task 'bundle:vendor'"));
        assert!(text.contains("bundle:vendor [concat]"));
    }

    #[test]
    fn test_plan_unknown_entry() {
        let temp = TempDir::new().unwrap();
        let err = format_plan(&project(temp.path().to_path_buf()), "deploy").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_list_marks_default_pipeline() {
        let text = format_list(&project(PathBuf::from("/shop")));
        assert!(text.contains("bundle"));
        assert!(text.contains("main, vendor"));
        assert!(text.contains(" *build"));
        assert!(text.contains("bundle -> cssmin"));
    }
}
