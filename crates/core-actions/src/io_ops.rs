//! File collaborator: the only module that touches the filesystem.
//!
//! Synchronous and byte-oriented. Files are read and written verbatim; line
//! splitting and the trailing-newline bookkeeping happen in the engine's
//! `insert_bulk` / `extract_range`. Failures are logged under the `io` target
//! and surface as `EditError::Io` carrying the path and the OS message.

use core_state::{EditError, EditResult};
use core_text::DirSuffix;
use std::fs;
use std::io::Write;
use std::path::Path;

/// What `e path` found at a path.
#[derive(Debug)]
pub enum Loaded {
    File(Vec<u8>),
    Directory(Vec<(Vec<u8>, Option<DirSuffix>)>),
}

fn io_error(op: &'static str, path: &Path, err: std::io::Error) -> EditError {
    tracing::error!(target: "io", op, path = %path.display(), error = %err, "io_failed");
    EditError::Io(format!("{}: {err}", path.display()))
}

/// Read a file, or list a directory.
pub fn load_path(path: &Path) -> EditResult<Loaded> {
    let meta = fs::metadata(path).map_err(|e| io_error("stat", path, e))?;
    if meta.is_dir() {
        list_directory(path).map(Loaded::Directory)
    } else {
        read_file(path).map(Loaded::File)
    }
}

pub fn read_file(path: &Path) -> EditResult<Vec<u8>> {
    let bytes = fs::read(path).map_err(|e| io_error("read", path, e))?;
    tracing::debug!(target: "io", path = %path.display(), bytes = bytes.len(), "read");
    Ok(bytes)
}

/// Directory entries sorted by name, each with a type suffix: `/` for
/// directories, `@` for symlinks, and on unix `|` for FIFOs and `=` for
/// sockets. `.` and `..` are not listed.
pub fn list_directory(path: &Path) -> EditResult<Vec<(Vec<u8>, Option<DirSuffix>)>> {
    let reader = fs::read_dir(path).map_err(|e| io_error("list", path, e))?;
    let mut entries = Vec::new();
    for entry in reader {
        let entry = entry.map_err(|e| io_error("list", path, e))?;
        let suffix = entry.file_type().ok().and_then(|ft| suffix_for(&ft));
        entries.push((entry.file_name().as_encoded_bytes().to_vec(), suffix));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    tracing::debug!(target: "io", path = %path.display(), entries = entries.len(), "list");
    Ok(entries)
}

fn suffix_for(ft: &fs::FileType) -> Option<DirSuffix> {
    if ft.is_symlink() {
        return DirSuffix::new(b"@");
    }
    if ft.is_dir() {
        return DirSuffix::new(b"/");
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if ft.is_fifo() {
            return DirSuffix::new(b"|");
        }
        if ft.is_socket() {
            return DirSuffix::new(b"=");
        }
    }
    None
}

/// Write (or with `append`, append) `bytes` to `path`. Returns the number of
/// bytes written.
pub fn write_file(path: &Path, bytes: &[u8], append: bool) -> EditResult<usize> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .map_err(|e| io_error("open", path, e))?;
    file.write_all(bytes)
        .map_err(|e| io_error("write", path, e))?;
    tracing::debug!(target: "io", path = %path.display(), bytes = bytes.len(), append, "write");
    Ok(bytes.len())
}
