use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(path).map_err(|source| StorageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Path of a per-test artifact such as a failure screenshot.
pub fn artifact_path(reports_dir: &Path, test_name: &str, extension: &str) -> PathBuf {
    let stem: String = test_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    reports_dir.join(format!("{stem}.{extension}"))
}
