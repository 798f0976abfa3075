//! Disk I/O helpers: read the document file and replace it atomically.
//!
//! The rename-over approach is atomic on POSIX filesystems. On FAT32 or
//! network shares there are no hard guarantees.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Reads the whole file at `path`. Returns `None` if it does not exist.
pub fn read(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Io(format!("{}: {e}", path.display()))),
    }
}

/// Write `bytes` to a fresh temp file beside `path`, fsync it, then rename it
/// over `path`.
///
/// Every call gets its own uniquely named temp file (`.<name>.XXXXXX.tmp`), so
/// two writers on the same path never share an inode: readers see one complete
/// document or the other, never a mix. On error `path` is left as it was and
/// the temp file is removed.
pub fn replace(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".into());

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::Persistence(format!("{}: {e}", dir.display())))?;
    // on any early return `tmp` is dropped, which deletes the temp file
    write_synced(tmp.as_file_mut(), bytes)
        .map_err(|e| Error::Persistence(format!("{}: {e}", tmp.path().display())))?;
    tmp.persist(path)
        .map_err(|e| Error::Persistence(format!("{}: {}", path.display(), e.error)))?;
    sync_parent(dir);
    Ok(())
}

fn write_synced(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes)?;
    file.sync_all()
}

// Best effort: some filesystems refuse to fsync a directory handle.
#[cfg(unix)]
fn sync_parent(dir: &Path) {
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent(_dir: &Path) {}
