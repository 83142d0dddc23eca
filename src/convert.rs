//! Conversion to WebP through `cwebp`.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cancel;
use crate::error::{Error, Result};
use crate::fsutil;
use crate::tool::Tools;

/// Extensions picked up by [`convert_all`], one `fd` pass each.
pub const CONVERT_ALL_EXTENSIONS: [&str; 2] = ["jpg", "png"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl fmt::Display for Converted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully converted '{}' to '{}'",
            self.input.display(),
            self.output.display()
        )
    }
}

/// `photo.jpg` -> `photo.webp`, `photo` -> `photo.webp`.
pub fn webp_path(input: &Path) -> PathBuf {
    input.with_extension("webp")
}

/// Converts each file to WebP next to the original, stopping at the first
/// failure.
pub fn convert<P: AsRef<Path>>(
    tools: &Tools,
    files: impl IntoIterator<Item = P>,
    mut observe: impl FnMut(&Converted),
) -> Result<()> {
    tools.cwebp.require()?;
    for file in files {
        cancel::check()?;
        let input = file.as_ref();
        fsutil::require_file(input)?;
        let output = webp_path(input);

        let args = [input.as_os_str(), OsStr::new("-o"), output.as_os_str()];
        tools
            .cwebp
            .run(args)
            .map_err(|e| e.context("cwebp conversion failed"))?;

        observe(&Converted {
            input: input.to_path_buf(),
            output,
        });
    }
    Ok(())
}

/// Converts every jpg and png file under `dir` using `fd -x`.
pub fn convert_all(tools: &Tools, dir: &Path) -> Result<()> {
    tools.cwebp.require()?;
    tools.fd.require().map_err(|e| e.context("convert-all requires fd"))?;

    for ext in CONVERT_ALL_EXTENSIONS {
        cancel::check()?;
        tools
            .fd
            .run_in(Some(dir), fd_args(tools, ext))
            .map_err(|e: Error| e.context(format!("converting {ext} files failed")))?;
    }
    Ok(())
}

/// Hands `args` to `cwebp` untouched.
pub fn forward<S: AsRef<OsStr>>(tools: &Tools, args: impl IntoIterator<Item = S>) -> Result<()> {
    tools.cwebp.require()?;
    tools.cwebp.run(args)
}

fn fd_args(tools: &Tools, ext: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = [".", "-e", ext, "--no-ignore", "-x"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(tools.cwebp.program().to_os_string());
    args.extend(["{}", "-o", "{.}.webp"].map(OsString::from));
    args
}
