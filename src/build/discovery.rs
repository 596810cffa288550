//! Input discovery for task targets.
//!
//! Expands a target's declared glob patterns into the concrete, ordered
//! list of project-relative paths handed to its implementation.

use glob::{glob_with, MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Error during input discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, #[source] glob::PatternError),
    /// IO error during file enumeration
    #[error("IO error during discovery: {0}")]
    Io(#[from] std::io::Error),
}

/// `*` and `?` never cross a `/`; `**` spans directories.
fn match_options() -> MatchOptions {
    MatchOptions { case_sensitive: true, require_literal_separator: true, require_literal_leading_dot: false }
}

/// Split a declared pattern into (is_exclusion, glob).
fn split_negation(pattern: &str) -> (bool, &str) {
    match pattern.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    }
}

/// Check that a declared pattern compiles.
pub fn validate_pattern(pattern: &str) -> Result<(), DiscoveryError> {
    let (_, glob) = split_negation(pattern);
    Pattern::new(glob).map(|_| ()).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))
}

/// Check whether a project-relative path is selected by a positive pattern.
///
/// Exclusion patterns never select anything.
pub fn pattern_matches(pattern: &str, path: &Path) -> bool {
    let (negated, glob) = split_negation(pattern);
    if negated {
        return false;
    }
    Pattern::new(glob).map(|p| p.matches_path_with(path, match_options())).unwrap_or(false)
}

/// Discover files matching a single glob pattern.
///
/// # Arguments
/// - `base_dir` - Base directory to resolve patterns from
/// - `pattern` - Glob pattern to match
///
/// # Returns
/// Matching regular files, relative to `base_dir`, sorted.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let escaped_base = Pattern::escape(&base_dir.to_string_lossy());
    let full_pattern = format!("{}/{}", escaped_base.trim_end_matches('/'), pattern);

    let paths = glob_with(&full_pattern, match_options())
        .map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| DiscoveryError::Io(e.into_error()))?;
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(base_dir).map(Path::to_path_buf).unwrap_or(path);
        files.push(relative);
    }

    files.sort();
    Ok(files)
}

/// Expand an ordered list of patterns into an ordered list of files.
///
/// - Each pattern's own matches are sorted lexicographically.
/// - Patterns keep their declared order, so libraries listed before
///   module sources stay before them.
/// - A path matched twice keeps its first position.
/// - A pattern starting with `!` removes earlier matches.
/// - A positive pattern matching nothing is logged and skipped.
pub fn expand_patterns(
    base_dir: &Path,
    patterns: &[String],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut result: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for pattern in patterns {
        let (negated, glob) = split_negation(pattern);

        if negated {
            let exclude = Pattern::new(glob)
                .map_err(|e| DiscoveryError::InvalidPattern(pattern.clone(), e))?;
            result.retain(|path| {
                let keep = !exclude.matches_path_with(path, match_options());
                if !keep {
                    seen.remove(path);
                }
                keep
            });
            continue;
        }

        let files = discover_files(base_dir, glob)?;
        if files.is_empty() {
            warn!(pattern = %pattern, "pattern matched no files");
        }

        for file in files {
            if seen.insert(file.clone()) {
                result.push(file);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(b"//").unwrap();
        path
    }

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discover_files_simple() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "app.js");
        create_test_file(temp.path(), "other.txt");

        let files = discover_files(temp.path(), "*.js").unwrap();
        assert_eq!(files, vec![PathBuf::from("app.js")]);
    }

    #[test]
    fn test_discover_files_recursive() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "src/a.js");
        create_test_file(temp.path(), "src/sub/b.js");
        create_test_file(temp.path(), "src/sub/deep/c.js");

        let files = discover_files(temp.path(), "src/**/*.js").unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("src/a.js"),
                PathBuf::from("src/sub/b.js"),
                PathBuf::from("src/sub/deep/c.js"),
            ]
        );
    }

    #[test]
    fn test_single_star_does_not_cross_directories() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "top.js");
        create_test_file(temp.path(), "nested/inner.js");

        let files = discover_files(temp.path(), "*.js").unwrap();
        assert_eq!(files, vec![PathBuf::from("top.js")]);
    }

    #[test]
    fn test_discover_files_skips_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("temp/dir.css")).unwrap();
        create_test_file(temp.path(), "temp/app.css");

        let files = discover_files(temp.path(), "temp/*").unwrap();
        assert_eq!(files, vec![PathBuf::from("temp/app.css")]);
    }

    #[test]
    fn test_discover_files_no_match() {
        let temp = TempDir::new().unwrap();
        let files = discover_files(temp.path(), "*.less").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_expand_keeps_declared_pattern_order() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "lib/zlib.js");
        create_test_file(temp.path(), "src/app.js");
        create_test_file(temp.path(), "temp/templates.js");

        let files = expand_patterns(
            temp.path(),
            &patterns(&["lib/zlib.js", "src/**/*.js", "temp/templates.js"]),
        )
        .unwrap();

        assert_eq!(
            files,
            vec![
                PathBuf::from("lib/zlib.js"),
                PathBuf::from("src/app.js"),
                PathBuf::from("temp/templates.js"),
            ]
        );
    }

    #[test]
    fn test_expand_dedupes_keeping_first_position() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "src/a.js");
        create_test_file(temp.path(), "src/b.js");

        let files =
            expand_patterns(temp.path(), &patterns(&["src/b.js", "src/*.js"])).unwrap();
        assert_eq!(files, vec![PathBuf::from("src/b.js"), PathBuf::from("src/a.js")]);
    }

    #[test]
    fn test_expand_negation() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "src/app.js");
        create_test_file(temp.path(), "src/app.spec.js");

        let files =
            expand_patterns(temp.path(), &patterns(&["src/*.js", "!src/*.spec.js"])).unwrap();
        assert_eq!(files, vec![PathBuf::from("src/app.js")]);
    }

    #[test]
    fn test_expand_negation_then_reinclude() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "src/a.js");

        let files = expand_patterns(temp.path(), &patterns(&["src/a.js", "!src/a.js", "src/a.js"]))
            .unwrap();
        assert_eq!(files, vec![PathBuf::from("src/a.js")]);
    }

    #[test]
    fn test_expand_invalid_pattern() {
        let temp = TempDir::new().unwrap();
        let result = expand_patterns(temp.path(), &patterns(&["src/[.js"]));
        assert!(matches!(result, Err(DiscoveryError::InvalidPattern(_, _))));
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("src/**/*.js").is_ok());
        assert!(validate_pattern("!test/**").is_ok());
        assert!(validate_pattern("src/[").is_err());
    }

    #[test]
    fn test_pattern_matches() {
        assert!(pattern_matches("temp/*", Path::new("temp/app.css")));
        assert!(!pattern_matches("temp/*", Path::new("temp/sub/app.css")));
        assert!(pattern_matches("temp/**/*.css", Path::new("temp/sub/app.css")));
        assert!(!pattern_matches("!temp/*", Path::new("temp/app.css")));
    }
}
