//! Template precompilation (`kind = "html-templates"`).
//!
//! Every HTML source of a mapping is minified and registered into the
//! application module's `$templateCache` from one generated script.

use super::html::HtmlMinifier;
use super::{Invocation, TaskImplementation, TaskOutcome, TemplateOptions};
use crate::build::{ArtifactStore, StoreError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTemplates;

/// Quote `text` as a single-quoted JavaScript string literal.
pub fn js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// URL a template is registered under.
fn template_url(source: &Path, cwd: Option<&Path>) -> String {
    let relative = cwd.and_then(|base| source.strip_prefix(base).ok()).unwrap_or(source);
    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

impl HtmlTemplates {
    /// Generate the registration script for `sources`.
    pub fn compile(
        store: &ArtifactStore,
        sources: &[PathBuf],
        options: &TemplateOptions,
    ) -> Result<String, StoreError> {
        let minifier = HtmlMinifier::new(options.html_minify);
        let mut script = format!(
            "angular.module({}).run(['$templateCache', function($templateCache) {{\n",
            js_string(&options.module_name)
        );

        for source in sources {
            let html = store.read_to_string(source)?;
            let url = template_url(source, options.cwd.as_deref());
            script.push_str(&format!(
                "  $templateCache.put({}, {});\n",
                js_string(&url),
                js_string(&minifier.minify(&html))
            ));
        }

        script.push_str("}]);\n");
        Ok(script)
    }
}

impl TaskImplementation for HtmlTemplates {
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        let options: TemplateOptions = match invocation.options().parse() {
            Ok(options) => options,
            Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
        };

        for (dest, sources) in invocation.outputs() {
            let script = Self::compile(store, sources, &options)?;
            store.write(dest, script.as_bytes())?;
            tracing::debug!(dest = %dest.display(), templates = sources.len(), "compiled templates");
        }
        Ok(TaskOutcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{FileMapping, StoreLayout, TaskDescriptor};
    use crate::tasks::{Options, ResolvedMapping};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_js_string_escaping() {
        assert_eq!(js_string("plain"), "'plain'");
        assert_eq!(js_string("it's"), "'it\\'s'");
        assert_eq!(js_string("a\\b\nc"), "'a\\\\b\\nc'");
    }

    #[test]
    fn test_template_url() {
        assert_eq!(template_url(Path::new("src/views/list.html"), None), "src/views/list.html");
        assert_eq!(
            template_url(Path::new("src/views/list.html"), Some(Path::new("src"))),
            "views/list.html"
        );
        assert_eq!(
            template_url(Path::new("lib/x.html"), Some(Path::new("src"))),
            "lib/x.html"
        );
    }

    #[test]
    fn test_compile_templates_task() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/views")).unwrap();
        fs::write(
            temp.path().join("src/views/detail.html"),
            "<div class=\"detail\">\n  <!-- title -->\n  <h1>{{movie.title}}</h1>\n</div>\n",
        )
        .unwrap();
        fs::write(temp.path().join("src/views/list.html"), "<p>Don't panic</p>").unwrap();
        let store = ArtifactStore::new(temp.path().to_path_buf(), StoreLayout::default());

        let sources = vec![PathBuf::from("src/views/detail.html"), PathBuf::from("src/views/list.html")];
        let options = Options::new(
            toml::from_str(
                "module = \"netflix-example\"\n[htmlmin]\nremoveComments = true\ncollapseWhitespace = true\nremoveAttributeQuotes = true",
            )
            .unwrap(),
        );
        let descriptor = TaskDescriptor::new("ngtemplates", "main", "html-templates")
            .with_files(FileMapping::to("temp/templates.js", vec!["src/**/*.html".to_string()]))
            .with_options(options);
        let mappings =
            vec![ResolvedMapping { dest: Some(PathBuf::from("temp/templates.js")), sources: sources.clone() }];
        let invocation = Invocation { descriptor: &descriptor, sources: &sources, mappings: &mappings };

        assert_eq!(HtmlTemplates.run(&invocation, &store).unwrap(), TaskOutcome::Success);
        let script = fs::read_to_string(temp.path().join("temp/templates.js")).unwrap();
        assert_eq!(
            script,
            "angular.module('netflix-example').run(['$templateCache', function($templateCache) {\n\
             \x20 $templateCache.put('src/views/detail.html', '<div class=detail><h1>{{movie.title}}</h1></div>');\n\
             \x20 $templateCache.put('src/views/list.html', '<p>Don\\'t panic</p>');\n\
             }]);\n"
        );
    }

    #[test]
    fn test_missing_module_is_failure() {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path().to_path_buf(), StoreLayout::default());
        let descriptor = TaskDescriptor::new("ngtemplates", "main", "html-templates");
        let invocation = Invocation { descriptor: &descriptor, sources: &[], mappings: &[] };

        assert!(!HtmlTemplates.run(&invocation, &store).unwrap().is_success());
    }
}
