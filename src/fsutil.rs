use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use crate::error::{ErrorKind, Result};

/// How the destination of [`copy_durable`] is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Create {
    /// Fail with `AlreadyExists` if the destination is there.
    New,
    /// Create or truncate the destination.
    Truncate,
}

/// Fails unless `path` exists and is not a directory.
pub fn require_file(path: &Path) -> Result<()> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ErrorKind::NotFound(path.to_path_buf()).into())
        }
        Err(e) => return Err(e.into()),
    };
    if meta.is_dir() {
        return Err(ErrorKind::IsDirectory(path.to_path_buf()).into());
    }
    Ok(())
}

/// Copies `src` to `dst` and syncs `dst` to disk before returning.
///
/// A failure part way through can leave `dst` incomplete.
pub fn copy_durable(src: &Path, dst: &Path, create: Create) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let mut output = match create {
        Create::New => OpenOptions::new().write(true).create_new(true).open(dst)?,
        Create::Truncate => File::create(dst)?,
    };
    let n = io::copy(&mut input, &mut output)?;
    output.sync_all()?;
    trace!("copied {n} bytes {} -> {}", src.display(), dst.display());
    Ok(n)
}
