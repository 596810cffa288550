//! Stylesheet minification (`kind = "css-minify"`).
//!
//! Sources of one destination are joined in declared order, parsed and
//! minified with lightningcss. Parse errors are task failures.

use super::{Invocation, TaskImplementation, TaskOutcome};
use crate::build::{ArtifactStore, StoreError};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use thiserror::Error;

/// Stylesheet could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CssError {
    /// Input was not valid CSS
    #[error("CSS parse error: {0}")]
    Parse(String),
    /// Minification or printing failed
    #[error("CSS minify error: {0}")]
    Minify(String),
}

impl<T: std::fmt::Display> From<lightningcss::error::Error<T>> for CssError {
    fn from(e: lightningcss::error::Error<T>) -> Self {
        CssError::Minify(e.to_string())
    }
}

/// Minify a stylesheet. `filename` is only used in error locations.
pub fn minify_css(source: &str, filename: &str) -> Result<String, CssError> {
    let options = ParserOptions { filename: filename.to_string(), ..ParserOptions::default() };
    let mut sheet =
        StyleSheet::parse(source, options).map_err(|e| CssError::Parse(e.to_string()))?;
    sheet.minify(MinifyOptions::default())?;
    let printed = sheet.to_css(PrinterOptions { minify: true, ..PrinterOptions::default() })?;
    Ok(printed.code)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CssMinify;

impl TaskImplementation for CssMinify {
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        for (dest, sources) in invocation.outputs() {
            let mut combined = String::new();
            for source in sources {
                combined.push_str(&store.read_to_string(source)?);
                combined.push('\n');
            }

            let name = dest.to_string_lossy();
            match minify_css(&combined, &name) {
                Ok(code) => {
                    store.write(dest, code.as_bytes())?;
                }
                Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
            }
        }
        Ok(TaskOutcome::Success)
    }
}
