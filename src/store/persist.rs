//! Atomic write-then-rename persistence.
//!
//! The new contents go to a temporary file in the target's directory, are
//! flushed to disk, and then renamed over the target. A reader (or a crash)
//! sees either the old file or the new one, never a partial write.
//!
//! There is no locking: two processes saving the same file race, and the
//! last rename wins.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

pub(crate) fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = Builder::new()
        .prefix(".iniguard-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    // Keep the mode of the file being replaced.
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
