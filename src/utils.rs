//! Utility functions for the data directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

/// Subdirectory of the data directory holding stored preferences.
const PREFERENCES_DIR: &str = "preferences";

/// Creates the preferences directory under `data_dir` if needed and returns it.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, or if the path exists
/// and is not a directory.
///
/// # Examples
///
/// ```no_run
/// let dir = prepare_preferences_dir(Path::new("./transit-data"))?;
/// assert!(dir.ends_with("preferences"));
/// ```
pub fn prepare_preferences_dir(data_dir: &Path) -> anyhow::Result<PathBuf> {
    let dir: PathBuf = [data_dir, Path::new(PREFERENCES_DIR)].iter().collect();

    fs::create_dir_all(&dir)
        .with_context(|| format!("unable to create data directory {}", dir.display()))?;

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_nested_directory() {
        let root = TempDir::new().unwrap();
        let data_dir = root.path().join("transit-data");

        let dir = prepare_preferences_dir(&data_dir).unwrap();

        assert_eq!(dir, data_dir.join("preferences"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_prepare_existing_directory() {
        let root = TempDir::new().unwrap();
        prepare_preferences_dir(root.path()).unwrap();

        assert!(prepare_preferences_dir(root.path()).is_ok());
    }

    #[test]
    fn test_prepare_fails_on_file() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("preferences"), "not a directory").unwrap();

        assert!(prepare_preferences_dir(root.path()).is_err());
    }
}
