//! Artifact store: the file-system view tasks read from and write to.
//!
//! Every path handed to a task is relative to the project root. The store
//! knows three logical roots: the source tree (read-only to the pipeline),
//! the intermediate tree and the distribution tree. Only the last two are
//! writable through the store.

use crate::build::discovery::{expand_patterns, DiscoveryError};
use crate::config::ProjectConfig;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Artifact store failure. Always fatal to the run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying file-system failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Original error
        #[source]
        source: std::io::Error,
    },
    /// Write attempted outside the intermediate and distribution trees
    #[error("refusing to write {}: only the intermediate and distribution trees are writable", .0.display())]
    ReadOnly(PathBuf),
    /// Path resolves outside the project root
    #[error("{} is outside the project root", .0.display())]
    OutsideRoot(PathBuf),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

/// Relative locations of the three logical roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// Hand-authored sources
    pub source: PathBuf,
    /// Pipeline scratch space
    pub intermediate: PathBuf,
    /// Final deliverables
    pub distribution: PathBuf,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            intermediate: PathBuf::from("temp"),
            distribution: PathBuf::from("dist"),
        }
    }
}

impl From<&ProjectConfig> for StoreLayout {
    fn from(project: &ProjectConfig) -> Self {
        Self {
            source: normalize(&project.src).unwrap_or_else(|| project.src.clone()),
            intermediate: normalize(&project.temp).unwrap_or_else(|| project.temp.clone()),
            distribution: normalize(&project.dist).unwrap_or_else(|| project.dist.clone()),
        }
    }
}

/// Lexically normalize a relative path, dropping `.` segments.
///
/// Returns `None` for absolute paths or paths that climb above their start.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

/// Addressable view over the project tree.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Project root directory (where taskline.toml is located)
    root: PathBuf,
    /// Logical roots relative to `root`
    layout: StoreLayout,
}

impl ArtifactStore {
    /// Create a store rooted at `root`.
    pub fn new(root: PathBuf, layout: StoreLayout) -> Self {
        Self { root, layout }
    }

    /// Get the project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the layout of logical roots.
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Absolute path of the source tree.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.layout.source)
    }

    /// Absolute path of the intermediate tree.
    pub fn intermediate_dir(&self) -> PathBuf {
        self.root.join(&self.layout.intermediate)
    }

    /// Absolute path of the distribution tree.
    pub fn distribution_dir(&self) -> PathBuf {
        self.root.join(&self.layout.distribution)
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Express a path relative to the project root, normalized.
    pub fn relative(&self, path: &Path) -> Result<PathBuf, StoreError> {
        let candidate = if path.is_absolute() {
            path.strip_prefix(&self.root)
                .map_err(|_| StoreError::OutsideRoot(path.to_path_buf()))?
        } else {
            path
        };
        normalize(candidate).ok_or_else(|| StoreError::OutsideRoot(path.to_path_buf()))
    }

    /// Whether the store accepts writes at `path`.
    ///
    /// The source tree always wins, even when a writable tree encloses it.
    pub fn is_writable(&self, path: &Path) -> bool {
        let Ok(rel) = self.relative(path) else {
            return false;
        };
        let inside = |root: &Path| !root.as_os_str().is_empty() && rel.starts_with(root);
        !inside(self.layout.source.as_path())
            && (inside(self.layout.intermediate.as_path()) || inside(self.layout.distribution.as_path()))
    }

    /// Check whether an artifact exists.
    pub fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    /// Read an artifact's bytes.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        let full = self.resolve_path(path);
        fs::read(&full).map_err(|e| StoreError::io(path, e))
    }

    /// Read an artifact as UTF-8 text.
    pub fn read_to_string(&self, path: &Path) -> Result<String, StoreError> {
        let full = self.resolve_path(path);
        fs::read_to_string(&full).map_err(|e| StoreError::io(path, e))
    }

    /// Check that `path` may be written and create its parent directory.
    ///
    /// Used directly by kinds that let an external tool write the file.
    pub fn prepare_output(&self, path: &Path) -> Result<PathBuf, StoreError> {
        if !self.is_writable(path) {
            return Err(StoreError::ReadOnly(path.to_path_buf()));
        }

        let full = self.resolve_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        Ok(full)
    }

    /// Write an artifact, replacing any previous content.
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<PathBuf, StoreError> {
        let full = self.prepare_output(path)?;
        fs::write(&full, contents).map_err(|e| StoreError::io(path, e))?;
        Ok(full)
    }

    /// Move an artifact, replacing anything already at `to`.
    ///
    /// Both ends must lie in the writable trees.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<PathBuf, StoreError> {
        if !self.is_writable(from) {
            return Err(StoreError::ReadOnly(from.to_path_buf()));
        }
        let target = self.prepare_output(to)?;
        fs::rename(self.resolve_path(from), &target).map_err(|e| StoreError::io(from, e))?;
        Ok(target)
    }

    /// Expand input patterns against the current state of the tree.
    ///
    /// See [`expand_patterns`] for the ordering rules.
    pub fn expand(&self, patterns: &[String]) -> Result<Vec<PathBuf>, DiscoveryError> {
        expand_patterns(&self.root, patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (TempDir, ArtifactStore) {
        let temp = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp.path().to_path_buf(), StoreLayout::default());
        (temp, store)
    }

    #[test]
    fn test_store_dirs() {
        let store = ArtifactStore::new(PathBuf::from("/project"), StoreLayout::default());

        assert_eq!(store.source_dir(), PathBuf::from("/project/src"));
        assert_eq!(store.intermediate_dir(), PathBuf::from("/project/temp"));
        assert_eq!(store.distribution_dir(), PathBuf::from("/project/dist"));
    }

    #[test]
    fn test_store_resolve_path() {
        let store = ArtifactStore::new(PathBuf::from("/project"), StoreLayout::default());

        assert_eq!(store.resolve_path(Path::new("/other/path")), PathBuf::from("/other/path"));
        assert_eq!(store.resolve_path(Path::new("src/app.js")), PathBuf::from("/project/src/app.js"));
    }

    #[test]
    fn test_store_relative() {
        let store = ArtifactStore::new(PathBuf::from("/project"), StoreLayout::default());

        assert_eq!(
            store.relative(Path::new("/project/./dist/app.js")).unwrap(),
            PathBuf::from("dist/app.js")
        );
        assert!(matches!(
            store.relative(Path::new("/elsewhere/app.js")),
            Err(StoreError::OutsideRoot(_))
        ));
        assert!(matches!(
            store.relative(Path::new("dist/../../app.js")),
            Err(StoreError::OutsideRoot(_))
        ));
    }

    #[test]
    fn test_store_is_writable() {
        let store = ArtifactStore::new(PathBuf::from("/project"), StoreLayout::default());

        assert!(store.is_writable(Path::new("temp/app.css")));
        assert!(store.is_writable(Path::new("dist/app.min.js")));
        assert!(store.is_writable(Path::new("./dist/nested/app.map")));
        assert!(!store.is_writable(Path::new("src/app.less")));
        assert!(!store.is_writable(Path::new("distribution/app.js")));
        assert!(!store.is_writable(Path::new("temp/../src/app.js")));
    }

    #[test]
    fn test_store_source_stays_read_only_under_any_layout() {
        let root_as_temp = StoreLayout {
            source: PathBuf::from("src"),
            intermediate: PathBuf::new(),
            distribution: PathBuf::from("dist"),
        };
        let store = ArtifactStore::new(PathBuf::from("/project"), root_as_temp);
        assert!(!store.is_writable(Path::new("src/app.js")));
        assert!(!store.is_writable(Path::new("README.md")));
        assert!(store.is_writable(Path::new("dist/app.js")));

        let nested = StoreLayout {
            source: PathBuf::from("app/src"),
            intermediate: PathBuf::from("app"),
            distribution: PathBuf::from("dist"),
        };
        let store = ArtifactStore::new(PathBuf::from("/project"), nested);
        assert!(!store.is_writable(Path::new("app/src/main.js")));
        assert!(store.is_writable(Path::new("app/bundle.js")));
    }

    #[test]
    fn test_store_write_and_read() {
        let (temp, store) = create_store();

        let full = store.write(Path::new("temp/nested/out.txt"), b"hello").unwrap();
        assert_eq!(full, temp.path().join("temp/nested/out.txt"));
        assert!(store.exists(Path::new("temp/nested/out.txt")));
        assert_eq!(store.read(Path::new("temp/nested/out.txt")).unwrap(), b"hello");
        assert_eq!(store.read_to_string(Path::new("temp/nested/out.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_store_write_overwrites() {
        let (_temp, store) = create_store();

        store.write(Path::new("dist/a.txt"), b"first").unwrap();
        store.write(Path::new("dist/a.txt"), b"second").unwrap();
        assert_eq!(store.read(Path::new("dist/a.txt")).unwrap(), b"second");
    }

    #[test]
    fn test_store_rejects_source_writes() {
        let (temp, store) = create_store();

        let result = store.write(Path::new("src/app.js"), b"oops");
        assert!(matches!(result, Err(StoreError::ReadOnly(_))));
        assert!(!temp.path().join("src/app.js").exists());
    }

    #[test]
    fn test_store_rename() {
        let (temp, store) = create_store();

        store.write(Path::new("dist/app.min.js.map"), b"{}").unwrap();
        store.rename(Path::new("dist/app.min.js.map"), Path::new("dist/maps/app.map")).unwrap();
        assert!(!store.exists(Path::new("dist/app.min.js.map")));
        assert_eq!(store.read(Path::new("dist/maps/app.map")).unwrap(), b"{}");

        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/app.js"), "x").unwrap();
        let result = store.rename(Path::new("src/app.js"), Path::new("dist/app.js"));
        assert!(matches!(result, Err(StoreError::ReadOnly(_))));
        assert!(temp.path().join("src/app.js").exists());
    }

    #[test]
    fn test_store_read_missing() {
        let (_temp, store) = create_store();

        let result = store.read(Path::new("src/missing.js"));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_layout_from_project_config() {
        let project = crate::config::default_config("p").project;
        let layout = StoreLayout::from(&project);
        assert_eq!(layout, StoreLayout::default());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("./a/./b")), Some(PathBuf::from("a/b")));
        assert_eq!(normalize(Path::new("a/../b")), None);
        assert_eq!(normalize(Path::new("/abs")), None);
    }
}
