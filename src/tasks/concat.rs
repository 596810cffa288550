//! Ordered file concatenation (`kind = "concat"`).

use super::{Invocation, TaskImplementation, TaskOutcome};
use crate::build::{ArtifactStore, StoreError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options of the concatenation kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConcatOptions {
    /// Inserted between files
    pub separator: String,
    /// Prepended to the output
    pub banner: String,
}

impl Default for ConcatOptions {
    fn default() -> Self {
        Self { separator: "\n".to_string(), banner: String::new() }
    }
}

/// Joins each destination's sources in declared order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Concat;

impl Concat {
    /// Concatenate `sources` into one text.
    pub fn join(
        store: &ArtifactStore,
        sources: &[PathBuf],
        options: &ConcatOptions,
    ) -> Result<String, StoreError> {
        let mut out = options.banner.clone();
        for (i, source) in sources.iter().enumerate() {
            if i > 0 {
                out.push_str(&options.separator);
            }
            out.push_str(&store.read_to_string(source)?);
        }
        Ok(out)
    }
}

impl TaskImplementation for Concat {
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        let options: ConcatOptions = match invocation.options().parse() {
            Ok(options) => options,
            Err(e) => return Ok(TaskOutcome::failure(e.to_string())),
        };

        for (dest, sources) in invocation.outputs() {
            let joined = Self::join(store, sources, &options)?;
            store.write(dest, joined.as_bytes())?;
            tracing::debug!(dest = %dest.display(), files = sources.len(), "concatenated");
        }
        Ok(TaskOutcome::Success)
    }
}

/// Convenience for callers that only need the default separator.
pub fn concat_files(store: &ArtifactStore, sources: &[PathBuf], dest: &Path) -> Result<(), StoreError> {
    let joined = Concat::join(store, sources, &ConcatOptions::default())?;
    store.write(dest, joined.as_bytes()).map(|_| ())
}
