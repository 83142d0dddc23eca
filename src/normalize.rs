//! Filename normalization: lowercase, whitespace to `-`, no repeated or
//! dangling hyphens.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::batch;
use crate::error::{Error, ErrorKind, Result};
use crate::fsutil::{self, Create};

/// Base name used when normalization leaves nothing behind.
pub const PLACEHOLDER: &str = "file";

/// What happens to the original file once its normalized copy exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Removal {
    #[default]
    Keep,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The name was already canonical; nothing was touched.
    Unchanged,
    /// A normalized copy was created next to the original.
    Copied,
    /// A normalized copy was created and the original removed.
    Renamed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub original: PathBuf,
    pub new_path: PathBuf,
    pub action: Action,
}

impl Normalized {
    pub fn changed(&self) -> bool {
        self.action != Action::Unchanged
    }
}

impl fmt::Display for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (old, new) = (self.original.display(), self.new_path.display());
        match self.action {
            Action::Unchanged => write!(f, "No change: '{old}'"),
            Action::Copied => write!(f, "Created '{new}' from '{old}'"),
            Action::Renamed => write!(f, "Renamed '{old}' -> '{new}'"),
        }
    }
}

/// Canonical form of a base name (extension already stripped).
///
/// Total and idempotent; never returns an empty string. Whitespace means any
/// Unicode `White_Space` character, so NBSP and U+3000 count too.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        return PLACEHOLDER.to_string();
    }
    trimmed.to_string()
}

/// The path `path` would be normalized to: same directory, canonical base
/// name, lowercased extension.
///
/// The extension starts at the last `.` of the file name, even when that is
/// the first character, so `.Profile` becomes `file.profile`.
pub fn normalized_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let name = match file_name.rsplit_once('.') {
        Some((base, ext)) => format!("{}.{}", normalize_name(base), ext.to_lowercase()),
        None => normalize_name(&file_name),
    };
    match path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Creates a copy of `path` under its normalized name, then removes the
/// original if asked to. An existing file at the new name is never
/// overwritten.
pub fn normalize_file(path: impl AsRef<Path>, removal: Removal) -> Result<Normalized> {
    normalize_file_with(path.as_ref(), removal, |p| fs::remove_file(p))
}

fn normalize_file_with(
    path: &Path,
    removal: Removal,
    remove_original: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<Normalized> {
    fsutil::require_file(path)?;

    let new_path = normalized_path(path);
    let mut result = Normalized {
        original: path.to_path_buf(),
        new_path,
        action: Action::Unchanged,
    };
    if result.new_path == path {
        trace!("{} is already normalized", path.display());
        return Ok(result);
    }
    let new_path = result.new_path.as_path();

    if fs::symlink_metadata(new_path).is_ok() {
        return Err(ErrorKind::Conflict(new_path.to_path_buf()).into());
    }
    if let Err(e) = fsutil::copy_durable(path, new_path, Create::New) {
        if e.kind() == io::ErrorKind::AlreadyExists {
            return Err(ErrorKind::Conflict(new_path.to_path_buf()).into());
        }
        return Err(Error::from(e).context(format!(
            "failed to create normalized file '{}' from '{}'",
            new_path.display(),
            path.display()
        )));
    }

    result.action = Action::Copied;
    if removal == Removal::Delete {
        if let Err(source) = remove_original(path) {
            return Err(ErrorKind::RemoveOriginal {
                created: new_path.to_path_buf(),
                original: path.to_path_buf(),
                source,
            }
            .into());
        }
        result.action = Action::Renamed;
    }
    debug!("{result}");
    Ok(result)
}

/// Normalizes every path in `paths`, reporting each success to `observe`.
/// Failures are collected and returned together at the end.
pub fn normalize_many<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
    removal: Removal,
    observe: impl FnMut(&Normalized),
) -> Result<()> {
    apply("normalize", paths, removal, observe)
}

/// Normalizes every non-directory entry of `dir` (not recursive), in file
/// name order.
pub fn normalize_all(
    dir: impl AsRef<Path>,
    removal: Removal,
    observe: impl FnMut(&Normalized),
) -> Result<()> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::from(e).context(format!("reading {} failed", dir.display())))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }
        // Entries of the current directory are reported by bare name.
        if dir == Path::new(".") {
            paths.push(PathBuf::from(entry.file_name()));
        } else {
            paths.push(entry.path());
        }
    }
    paths.sort();
    apply("normalize-all", paths, removal, observe)
}

fn apply<P: AsRef<Path>>(
    label: &'static str,
    paths: impl IntoIterator<Item = P>,
    removal: Removal,
    mut observe: impl FnMut(&Normalized),
) -> Result<()> {
    batch::run(label, paths, |path| {
        let done = normalize_file(path, removal)?;
        observe(&done);
        Ok(())
    })
}
