//! Verbatim copy (`kind = "copy"`).
//!
//! One source is copied to its destination byte for byte; several are
//! written back to back in declared order.

use super::{Invocation, TaskImplementation, TaskOutcome};
use crate::build::{ArtifactStore, StoreError};

#[derive(Debug, Clone, Copy, Default)]
pub struct Copy;

impl TaskImplementation for Copy {
    fn run(
        &self,
        invocation: &Invocation<'_>,
        store: &ArtifactStore,
    ) -> Result<TaskOutcome, StoreError> {
        for (dest, sources) in invocation.outputs() {
            let mut bytes = Vec::new();
            for source in sources {
                bytes.extend(store.read(source)?);
            }
            store.write(dest, &bytes)?;
        }
        Ok(TaskOutcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{StoreLayout, TaskDescriptor};
    use crate::tasks::ResolvedMapping;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_copy_single_and_many() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/img")).unwrap();
        fs::write(temp.path().join("src/index.html"), "<html></html>").unwrap();
        fs::write(temp.path().join("src/img/a.bin"), [1u8, 2, 3]).unwrap();
        fs::write(temp.path().join("src/img/b.bin"), [4u8]).unwrap();
        let store = ArtifactStore::new(temp.path().to_path_buf(), StoreLayout::default());

        let index = vec![PathBuf::from("src/index.html")];
        let blobs = vec![PathBuf::from("src/img/a.bin"), PathBuf::from("src/img/b.bin")];
        let mappings = vec![
            ResolvedMapping { dest: Some(PathBuf::from("dist/index.html")), sources: index.clone() },
            ResolvedMapping { dest: Some(PathBuf::from("dist/img/all.bin")), sources: blobs.clone() },
        ];
        let descriptor = TaskDescriptor::new("copy", "main", "copy");
        let all: Vec<PathBuf> = index.iter().chain(blobs.iter()).cloned().collect();
        let invocation = Invocation { descriptor: &descriptor, sources: &all, mappings: &mappings };

        assert_eq!(Copy.run(&invocation, &store).unwrap(), TaskOutcome::Success);
        assert_eq!(fs::read_to_string(temp.path().join("dist/index.html")).unwrap(), "<html></html>");
        assert_eq!(fs::read(temp.path().join("dist/img/all.bin")).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_copy_into_source_tree_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("temp")).unwrap();
        fs::write(temp.path().join("temp/a.txt"), "a").unwrap();
        let store = ArtifactStore::new(temp.path().to_path_buf(), StoreLayout::default());

        let sources = vec![PathBuf::from("temp/a.txt")];
        let mappings =
            vec![ResolvedMapping { dest: Some(PathBuf::from("src/a.txt")), sources: sources.clone() }];
        let descriptor = TaskDescriptor::new("copy", "main", "copy");
        let invocation = Invocation { descriptor: &descriptor, sources: &sources, mappings: &mappings };

        assert!(matches!(Copy.run(&invocation, &store), Err(StoreError::ReadOnly(_))));
    }
}
