//! Output directory setup and atomic report writes.

use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use datasandbox_core::{Error, Result};

use crate::errors::GenerationError;

/// Make sure `path` exists and holds no stale output.
///
/// An existing non-empty directory is removed when `overwrite` is set and
/// rejected otherwise.
pub fn prepare_output_dir(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::Configuration(format!(
                "output path {} is not a directory",
                path.display()
            )));
        }
        let mut entries =
            std::fs::read_dir(path).map_err(|err| Error::io_at("read", path, err))?;
        if entries.next().is_some() {
            if !overwrite {
                return Err(Error::Configuration(format!(
                    "output directory {} is not empty and overwrite is disabled",
                    path.display()
                )));
            }
            info!(path = %path.display(), "removing existing output");
            std::fs::remove_dir_all(path).map_err(|err| Error::io_at("remove", path, err))?;
        }
    }
    create_dir_all(path).map_err(|err| Error::io_at("create", path, err))
}

pub fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
) -> std::result::Result<(), GenerationError> {
    let data = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &data)?;
    Ok(())
}

fn write_bytes_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = non_empty_parent(path) {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = non_empty_parent(path) {
        sync_dir(parent)?;
    }
    Ok(())
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "invalid path for atomic write")
    })?;
    Ok(path.with_file_name(format!("{}.tmp", file_name.to_string_lossy())))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("datasandbox_fs_{label}_{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn creates_missing_directory() {
        let dir = temp_dir("create");
        prepare_output_dir(&dir, false).unwrap();
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn non_empty_directory_requires_overwrite() {
        let dir = temp_dir("overwrite");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.txt"), b"old").unwrap();

        assert!(matches!(
            prepare_output_dir(&dir, false),
            Err(Error::Configuration(_))
        ));
        prepare_output_dir(&dir, true).unwrap();
        assert!(!dir.join("stale.txt").exists());
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn atomic_write_replaces_file() {
        let dir = temp_dir("atomic");
        let path = dir.join("report.json");
        write_json_atomic(&path, &serde_json::json!({"rows": 1})).unwrap();
        write_json_atomic(&path, &serde_json::json!({"rows": 2})).unwrap();
        let content: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(content["rows"], 2);
        assert!(!dir.join("report.json.tmp").exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
