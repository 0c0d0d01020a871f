//! Filesystem helpers for atomic registry and key-file writes.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Write `data` to `path` through a synced temp file and a rename, so readers
/// see either the old contents or the new ones.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid file name"))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
        .as_nanos();
    let temp_path = parent.join(format!(".{}.{}.tmp", file_name, nanos));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)?;
    if let Err(err) = file.write_all(data).and_then(|_| file.sync_all()) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    rename_with_fallback(&temp_path, path)
}

/// Rename `from` onto `to`, retrying after removing `to` on platforms where
/// rename refuses to replace an existing file. The temp file is removed if
/// both attempts fail.
pub fn rename_with_fallback(from: &Path, to: &Path) -> io::Result<()> {
    if let Err(first) = fs::rename(from, to) {
        let _ = fs::remove_file(to);
        fs::rename(from, to).map_err(|second| {
            let _ = fs::remove_file(from);
            io::Error::new(
                second.kind(),
                format!("rename failed (first: {}, retry: {})", first, second),
            )
        })?;
    }
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

/// Remove a directory tree, treating "already gone" as success.
pub fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}
