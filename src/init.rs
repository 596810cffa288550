//! Project initialization for taskline
//!
//! Writes a starter `taskline.toml` for a single-page web application:
//! lint and browser tests, a stylesheet and script bundle in `dist/`, and
//! compiled HTML templates in between.

use crate::config::CONFIG_FILE_NAME;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error during project initialization
#[derive(Debug, Error)]
pub enum InitError {
    /// A configuration file is already present
    #[error("{0} already exists")]
    AlreadyInitialized(String),
    /// Failed to create directory
    #[error("failed to create directory: {0}")]
    CreateDir(#[source] std::io::Error),
    /// Failed to write file
    #[error("failed to write file: {0}")]
    WriteFile(#[source] std::io::Error),
}

/// Files written by [`init_project`], relative to the project directory.
pub const STARTER_FILES: &[&str] = &[
    CONFIG_FILE_NAME,
    ".gitignore",
    "src/app.js",
    "src/app.less",
    "src/app/templates/dashboard.html",
    "test/app.spec.js",
];

/// Initialize a taskline project in `path`.
///
/// Existing sources are left alone; only a present `taskline.toml` stops
/// the scaffold.
///
/// # Example
/// ```ignore
/// init_project(Path::new("webapp"), "webapp")?;
/// ```
pub fn init_project(path: &Path, name: &str) -> Result<(), InitError> {
    let config_path = path.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        return Err(InitError::AlreadyInitialized(config_path.display().to_string()));
    }

    create_dir(path)?;
    create_dir(&path.join("src/app/templates"))?;
    create_dir(&path.join("test"))?;

    write_file(&config_path, &generate_config(name))?;
    write_new_file(&path.join(".gitignore"), GITIGNORE)?;
    write_new_file(&path.join("src/app.js"), &generate_app_script(name))?;
    write_new_file(&path.join("src/app.less"), APP_STYLES)?;
    write_new_file(&path.join("src/app/templates/dashboard.html"), DASHBOARD_TEMPLATE)?;
    write_new_file(&path.join("test/app.spec.js"), &generate_app_spec(name))?;

    Ok(())
}

/// Create a directory and all parent directories.
fn create_dir(path: &Path) -> Result<(), InitError> {
    fs::create_dir_all(path).map_err(InitError::CreateDir)
}

/// Write content to a file.
fn write_file(path: &Path, content: &str) -> Result<(), InitError> {
    fs::write(path, content).map_err(InitError::WriteFile)
}

/// Write content unless the file already exists.
fn write_new_file(path: &Path, content: &str) -> Result<(), InitError> {
    if path.exists() {
        return Ok(());
    }
    write_file(path, content)
}

/// Quote a string as a TOML string value.
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

/// Generate the starter `taskline.toml`.
fn generate_config(name: &str) -> String {
    let name = toml_string(name);
    format!(
        r#"[project]
name = {name}
default_pipeline = "build"

# Lint every script in the project
[tasks.jshint]
kind = "exec"
options = {{ program = "jshint" }}
targets.main = {{ src = ["*.js", "src/**/*.js", "test/**/*.js"] }}

# Unit tests in a headless browser
[tasks.karma]
kind = "browser-test"

[tasks.karma.targets.main]
src = [
    "bower_components/angular/angular.js",
    "bower_components/angular-route/angular-route.js",
    "bower_components/angular-mocks/angular-mocks.js",
    "src/**/*.js",
    "test/**/*.js",
]

[tasks.karma.targets.main.options]
frameworks = ["jasmine"]
browsers = ["PhantomJS"]
reporters = ["mocha", "junit", "coverage"]
singleRun = true
preprocessors = {{ "src/**/*.js" = ["coverage"] }}
junitReporter = {{ outputFile = "test-results.xml" }}
coverageReporter = {{ reporters = [{{ type = "html" }}, {{ type = "cobertura" }}] }}

[tasks.less]
kind = "exec"
options = {{ program = "lessc", args = ["{{sources}}", "{{dest}}"] }}
targets.main = {{ files = {{ "temp/app.min.css" = ["src/app.less"] }} }}

[tasks.cssmin]
kind = "css-minify"
targets.main = {{ files = {{ "dist/app.min.css" = ["temp/app.min.css"] }} }}

[tasks.ngtemplates]
kind = "html-templates"

[tasks.ngtemplates.targets.main]
src = ["src/app/templates/*.html"]
dest = "temp/templates.js"

[tasks.ngtemplates.targets.main.options]
module = {name}

[tasks.ngtemplates.targets.main.options.htmlmin]
removeComments = true
collapseWhitespace = true
collapseBooleanAttributes = true
removeAttributeQuotes = true
removeRedundantAttributes = true

# Libraries first, then the application, then its templates
[tasks.ngAnnotate]
kind = "concat"

[tasks.ngAnnotate.targets.main.files]
"temp/app.min.js" = [
    "bower_components/angular/angular.js",
    "bower_components/angular-route/angular-route.js",
    "src/**/*.js",
    "temp/templates.js",
]

[tasks.uglify]
kind = "script-minify"
options = {{ sourceMap = true, sourceMapName = "dist/app.min.map" }}
targets.main = {{ files = {{ "dist/app.min.js" = ["temp/app.min.js"] }} }}

[pipelines]
test = ["jshint", "karma"]
build = ["jshint", "less", "cssmin", "ngtemplates", "ngAnnotate", "uglify"]
"#
    )
}

const GITIGNORE: &str = r#"# Taskline build output
temp/
dist/

# Tool output
bower_components/
node_modules/
coverage/
test-results.xml
"#;

fn generate_app_script(name: &str) -> String {
    format!(
        r#"angular.module('{name}', ['ngRoute'])
  .config(function ($routeProvider) {{
    $routeProvider.when('/', {{
      templateUrl: 'src/app/templates/dashboard.html',
      controller: 'DashboardCtrl'
    }});
  }})
  .controller('DashboardCtrl', function ($scope) {{
    $scope.query = '';
  }});
"#
    )
}

fn generate_app_spec(name: &str) -> String {
    format!(
        r#"describe('DashboardCtrl', function () {{
  beforeEach(module('{name}'));

  it('starts with an empty query', inject(function ($controller) {{
    var scope = {{}};
    $controller('DashboardCtrl', {{ $scope: scope }});
    expect(scope.query).toBe('');
  }}));
}});
"#
    )
}

const APP_STYLES: &str = r#"@accent: #b9090b;

body {
  margin: 0;
  font-family: sans-serif;
}

.dashboard h1 {
  color: @accent;
}
"#;

const DASHBOARD_TEMPLATE: &str = r#"<div class="dashboard">
  <!-- search -->
  <h1>Dashboard</h1>
  <input type="text" ng-model="query" required="required">
</div>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliOverrides;
    use crate::project::Project;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_starter_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("webapp");

        init_project(&path, "webapp").unwrap();

        for file in STARTER_FILES {
            assert!(path.join(file).exists(), "{} was not written", file);
        }
        let script = fs::read_to_string(path.join("src/app.js")).unwrap();
        assert!(script.contains("angular.module('webapp'"));
    }

    #[test]
    fn test_starter_config_loads() {
        let temp = TempDir::new().unwrap();
        init_project(temp.path(), "netflix-example").unwrap();

        let project =
            Project::load(Some(&temp.path().join(CONFIG_FILE_NAME)), &CliOverrides::default()).unwrap();
        assert_eq!(project.name(), "netflix-example");
        assert_eq!(project.default_pipeline(), Some("build"));

        let build = project.pipelines().resolve("build").unwrap();
        let steps: Vec<String> = build.steps.iter().map(|s| s.to_string()).collect();
        assert_eq!(steps, vec!["jshint", "less", "cssmin", "ngtemplates", "ngAnnotate", "uglify"]);

        let ngtemplates = project.registry().resolve("ngtemplates", None).unwrap();
        assert_eq!(ngtemplates.options.get_str("module"), Some("netflix-example"));
    }

    #[test]
    fn test_init_refuses_existing_config() {
        let temp = TempDir::new().unwrap();
        init_project(temp.path(), "webapp").unwrap();

        let err = init_project(temp.path(), "webapp").unwrap_err();
        assert!(matches!(err, InitError::AlreadyInitialized(_)));
    }

    #[test]
    fn test_init_keeps_existing_sources() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/app.js"), "// mine").unwrap();

        init_project(temp.path(), "webapp").unwrap();
        assert_eq!(fs::read_to_string(temp.path().join("src/app.js")).unwrap(), "// mine");
    }

    #[test]
    fn test_project_name_is_quoted() {
        let config = crate::config::parse_config(&generate_config("say \"hi\"")).unwrap();
        assert_eq!(config.project.name, "say \"hi\"");
    }
}
