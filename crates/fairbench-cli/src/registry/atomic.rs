use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{RegistryError, RegistryResult};

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    let data = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &data)
}

/// Write to a sibling temp file, sync it, then rename over `path`.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> RegistryResult<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
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
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }

    Ok(())
}

fn temp_path(path: &Path) -> RegistryResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| RegistryError::InvalidPath(path.display().to_string()))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn replaces_existing_file_and_leaves_no_temp() {
        let dir = std::env::temp_dir().join(format!("fairbench-atomic-{}", Uuid::new_v4()));
        let path = dir.join("nested").join("summary.json");

        write_bytes_atomic(&path, b"old").expect("first write");
        write_json_atomic(&path, &serde_json::json!({ "runs": 2 })).expect("second write");

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("json");
        assert_eq!(written["runs"], 2);
        assert!(!path.with_file_name("summary.json.tmp").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(matches!(
            write_bytes_atomic(Path::new("/"), b"x"),
            Err(RegistryError::InvalidPath(_))
        ));
    }
}
