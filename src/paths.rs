//! Path resolution for tool arguments.
//!
//! Relative paths are taken against a base directory and collapsed lexically,
//! so `a/../b` becomes `b` without touching the filesystem.

use path_clean::PathClean;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Cannot create directory '{path}': {source}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No write permission for '{path}'")]
    PermissionDenied { path: PathBuf },
    #[error("'{path}' is not a directory")]
    NotADirectory { path: PathBuf },
}

/// Absolute, lexically normalized form of `raw`, relative paths joined onto `base`
pub fn resolve(base: &Path, raw: impl AsRef<Path>) -> PathBuf {
    let raw = raw.as_ref();
    if raw.is_absolute() {
        raw.clean()
    } else {
        base.join(raw).clean()
    }
}

/// Make sure `dir` exists as a directory we can write into.
///
/// Missing directories are created. Writability is checked by creating and
/// dropping a temporary file inside it.
pub fn ensure_writable_dir(dir: &Path) -> Result<PathBuf, PathError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| PathError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    if !dir.is_dir() {
        return Err(PathError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    tempfile::Builder::new()
        .prefix(".filegen-write-check")
        .tempfile_in(dir)
        .map_err(|_| PathError::PermissionDenied {
            path: dir.to_path_buf(),
        })?;

    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_relative_against_base() {
        let base = Path::new("/work/project");
        assert_eq!(resolve(base, "src/main.rs"), PathBuf::from("/work/project/src/main.rs"));
        assert_eq!(resolve(base, "../other/./x"), PathBuf::from("/work/other/x"));
        assert_eq!(resolve(base, "."), PathBuf::from("/work/project"));
    }

    #[test]
    fn test_resolve_absolute_ignores_base() {
        let base = Path::new("/work/project");
        assert_eq!(resolve(base, "/tmp/a/../b"), PathBuf::from("/tmp/b"));
    }

    #[test]
    fn test_ensure_writable_dir_creates_and_checks() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("fresh/nested");
        let resolved = ensure_writable_dir(&target).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
        // the scratch file does not linger
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_ensure_writable_dir_rejects_files() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            ensure_writable_dir(&file),
            Err(PathError::NotADirectory { .. })
        ));
    }
}
