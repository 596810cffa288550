//! Task options and the typed option records understood by built-in kinds.
//!
//! Options arrive as free-form TOML tables. Task-level options are merged
//! under target-level ones when the project is loaded; kinds deserialize
//! the records they care about from the merged table.
//!
//! Record fields accept both `snake_case` and the camelCase spelling used
//! by Grunt-era build files (`sourceMap`, `htmlmin`, `singleRun`, ...).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// An option value had the wrong shape for its kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid options: {0}")]
pub struct OptionsError(pub String);

/// Free-form options record of a task target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(toml::Table);

impl Options {
    /// Wrap a TOML table.
    pub fn new(table: toml::Table) -> Self {
        Self(table)
    }

    /// Borrow the underlying table.
    pub fn table(&self) -> &toml::Table {
        &self.0
    }

    /// Whether no option is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }

    /// Look up a string option.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(toml::Value::as_str)
    }

    /// Look up a boolean option.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(toml::Value::as_bool)
    }

    /// Look up a list of strings. Missing keys yield an empty list.
    pub fn get_str_list(&self, key: &str) -> Result<Vec<String>, OptionsError> {
        match self.0.get(key) {
            None => Ok(Vec::new()),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        OptionsError(format!("'{}' must be a list of strings", key))
                    })
                })
                .collect(),
            Some(_) => Err(OptionsError(format!("'{}' must be a list of strings", key))),
        }
    }

    /// Merge `self` over `defaults`. Keys in `self` win; nested tables merge.
    pub fn merged_over(&self, defaults: &Options) -> Options {
        let mut table = defaults.0.clone();
        merge_tables(&mut table, &self.0);
        Options(table)
    }

    /// Deserialize a typed record from these options.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, OptionsError> {
        toml::Value::Table(self.0.clone()).try_into().map_err(|e: toml::de::Error| {
            OptionsError(e.message().to_string())
        })
    }

    /// Render as JSON for external tools.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.0).unwrap_or(serde_json::Value::Null)
    }
}

impl From<toml::Table> for Options {
    fn from(table: toml::Table) -> Self {
        Self(table)
    }
}

fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

fn default_true() -> bool {
    true
}

/// Options of a browser test runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunnerOptions {
    /// Test framework identifiers (e.g. "jasmine")
    #[serde(default)]
    pub frameworks: Vec<String>,
    /// Browser identifiers (e.g. "PhantomJS")
    #[serde(default)]
    pub browsers: Vec<String>,
    /// Report formats (e.g. "junit", "coverage")
    #[serde(default, alias = "reportFormats", alias = "reporters")]
    pub report_formats: Vec<String>,
    /// Files loaded into the browser, in load order
    #[serde(default)]
    pub files: Vec<String>,
    /// Stop the runner once the suite finishes
    #[serde(default = "default_true", alias = "singleRun")]
    pub single_run: bool,
}

/// Options of a script minifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinifyOptions {
    /// Write a source map next to the minified output
    #[serde(default, alias = "emitSourceMap", alias = "sourceMap")]
    pub emit_source_map: bool,
    /// Where the source map goes; defaults to `<dest>.map`
    #[serde(default, alias = "sourceMapDestination", alias = "sourceMapName")]
    pub source_map_destination: Option<PathBuf>,
}

impl MinifyOptions {
    /// Source map path for a minified output, if maps are enabled.
    pub fn source_map_for(&self, dest: &Path) -> Option<PathBuf> {
        if !self.emit_source_map {
            return None;
        }
        Some(self.source_map_destination.clone().unwrap_or_else(|| {
            let mut name = dest.as_os_str().to_os_string();
            name.push(".map");
            PathBuf::from(name)
        }))
    }
}

/// HTML minification switches applied to templates before compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlMinifyOptions {
    /// Strip `<!-- -->` comments
    #[serde(default, alias = "removeComments")]
    pub remove_comments: bool,
    /// Collapse whitespace runs between and inside tags
    #[serde(default, alias = "collapseWhitespace")]
    pub collapse_whitespace: bool,
    /// `disabled="disabled"` becomes `disabled`
    #[serde(default, alias = "collapseBooleanAttributes")]
    pub collapse_boolean_attributes: bool,
    /// Drop quotes around attribute values that do not need them
    #[serde(default, alias = "removeAttributeQuotes")]
    pub remove_attribute_quotes: bool,
    /// Drop attributes equal to their HTML default
    #[serde(default, alias = "removeRedundantAttributes")]
    pub remove_redundant_attributes: bool,
}

/// Options of the template compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateOptions {
    /// Application module the templates register into
    #[serde(alias = "moduleName", alias = "module")]
    pub module_name: String,
    /// HTML minification applied to each template
    #[serde(default, alias = "htmlMinifyOptions", alias = "htmlmin")]
    pub html_minify: HtmlMinifyOptions,
    /// Directory stripped from template URLs; URLs stay project-relative when unset
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}
