//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{SetupError, SetupResult};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> SetupResult<()> {
    if !path.is_dir() {
        fs::create_dir_all(path).map_err(|e| SetupError::io(path, e))?;
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> SetupResult<()> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|e| SetupError::io(path, e))?;
    }
    Ok(())
}

/// Names of the immediate child directories of `dir`, sorted.
///
/// Files and symlinks to files are ignored.
pub fn list_subdirectories(dir: &Path) -> SetupResult<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| SetupError::io(dir, e))? {
        let entry = entry.map_err(|e| SetupError::io(dir, e))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    names.sort();
    Ok(names)
}

/// Return `dir/<name>` for the only child directory of `dir`.
///
/// `what` describes the expected directory in the error raised when there
/// are zero or several candidates.
pub fn single_subdirectory(dir: &Path, what: &str) -> SetupResult<PathBuf> {
    let mut names = list_subdirectories(dir)?;
    if names.len() != 1 {
        return Err(SetupError::Structure {
            dir: dir.to_path_buf(),
            expected: format!("exactly one {}", what),
            found: names,
        });
    }

    Ok(dir.join(names.remove(0)))
}

/// Copy a file, creating the destination's parent directory.
pub fn copy_file(src: &Path, dst: &Path) -> SetupResult<u64> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).map_err(|e| SetupError::io(src, e))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> SetupResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| SetupError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_subdirectories_ignores_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("b")).unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        fs::write(tmp.path().join("file.txt"), "x").unwrap();

        assert_eq!(list_subdirectories(tmp.path()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_single_subdirectory() {
        let tmp = TempDir::new().unwrap();

        let err = single_subdirectory(tmp.path(), "platform directory").unwrap_err();
        assert!(matches!(err, SetupError::Structure { ref found, .. } if found.is_empty()));

        fs::create_dir(tmp.path().join("x86_64-pc-linux-gnu")).unwrap();
        fs::write(tmp.path().join("release.tar.gz"), "x").unwrap();
        assert_eq!(
            single_subdirectory(tmp.path(), "platform directory").unwrap(),
            tmp.path().join("x86_64-pc-linux-gnu")
        );

        fs::create_dir(tmp.path().join("aarch64-apple-darwin")).unwrap();
        match single_subdirectory(tmp.path(), "platform directory") {
            Err(SetupError::Structure { found, .. }) => {
                assert_eq!(found, vec!["aarch64-apple-darwin", "x86_64-pc-linux-gnu"]);
            }
            other => panic!("expected Structure error, got {:?}", other),
        }
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_copy_file_creates_parent() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.txt");
        fs::write(&src, "content").unwrap();
        let dst = tmp.path().join("nested/dst.txt");

        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst).unwrap(), "content");
    }
}
