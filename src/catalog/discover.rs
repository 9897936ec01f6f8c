//! Discovery of challenge definition files.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, WorkshopError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Find every file under `root` whose relative path matches `pattern`.
///
/// Hidden directories are not descended into. The result is sorted by path
/// so repeated runs over an unchanged tree produce the same order.
pub fn discover_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Pattern::new(pattern)
        .map_err(|err| WorkshopError::Config(format!("invalid challenge pattern {pattern}: {err}")))?;

    if !root.is_dir() {
        return Err(WorkshopError::Config(format!(
            "challenges directory not found: {}",
            root.display()
        )));
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable path: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if matcher.matches_path_with(relative, MATCH_OPTIONS) {
            debug!("discovered {}", relative.display());
            found.push(entry.path().to_path_buf());
        }
    }

    found.sort();
    Ok(found)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "message: x\ntype: input\n").unwrap();
    }

    #[test]
    fn finds_nested_definitions_in_sorted_order() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "b/q.yaml");
        touch(dir.path(), "a/deep/q.yaml");
        touch(dir.path(), "a/q.yaml");
        touch(dir.path(), "a/notes.yaml");

        let files = discover_files(dir.path(), "**/q.yaml").unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a/deep/q.yaml"),
                PathBuf::from("a/q.yaml"),
                PathBuf::from("b/q.yaml"),
            ]
        );
    }

    #[test]
    fn skips_hidden_directories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".workshop/q.yaml");
        touch(dir.path(), ".git/x/q.yaml");
        touch(dir.path(), "lesson/q.yaml");

        let files = discover_files(dir.path(), "**/q.yaml").unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("lesson/q.yaml"));
    }

    #[test]
    fn repeated_discovery_is_stable() {
        let dir = tempdir().unwrap();
        for name in ["z", "m", "a", "m/n"] {
            touch(dir.path(), &format!("{name}/q.yaml"));
        }
        let first = discover_files(dir.path(), "**/q.yaml").unwrap();
        let second = discover_files(dir.path(), "**/q.yaml").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_root_is_config_error() {
        let dir = tempdir().unwrap();
        let err = discover_files(&dir.path().join("nope"), "**/q.yaml").unwrap_err();
        assert!(matches!(err, WorkshopError::Config(_)));
    }
}
