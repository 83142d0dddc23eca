use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fsutil::{self, Create};
use crate::dimensions;
use crate::tool::Tools;

/// A resize job. A width or height of 0 lets `cwebp` keep the aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resize {
    pub file: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Extra arguments appended to the `cwebp` command line.
    pub extra: Vec<OsString>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resized {
    pub input: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully resized '{}' to '{}'",
            self.input.display(),
            self.output.display()
        )
    }
}

/// `<base>-w<width>-h<height>.<ext>`, keeping the input's extension (`webp`
/// when it has none).
pub fn resized_path(input: &Path, width: u32, height: u32) -> PathBuf {
    let ext = input
        .extension()
        .filter(|e| !e.is_empty())
        .unwrap_or(OsStr::new("webp"))
        .to_os_string();
    let mut name = input.with_extension("").into_os_string();
    name.push(format!("-w{width}-h{height}."));
    name.push(ext);
    PathBuf::from(name)
}

/// Resizes through a temporary file, then writes the result under its final
/// name (overwriting any previous output).
pub fn resize(tools: &Tools, job: &Resize) -> Result<Resized> {
    tools.cwebp.require()?;
    fsutil::require_file(&job.file)?;

    let tmp = tempfile::Builder::new()
        .prefix("img_resize_")
        .tempfile()
        .map_err(|e| Error::from(e).context("failed to create temp file"))?
        .into_temp_path();

    let (w, h) = (job.width.to_string(), job.height.to_string());
    let mut args: Vec<&OsStr> = vec![
        OsStr::new("-resize"),
        OsStr::new(&w),
        OsStr::new(&h),
        job.file.as_os_str(),
        OsStr::new("-o"),
        tmp.as_os_str(),
    ];
    args.extend(job.extra.iter().map(OsString::as_os_str));
    tools
        .cwebp
        .run(args)
        .map_err(|e| e.context("cwebp resize failed"))?;

    let (mut width, mut height) = (job.width, job.height);
    if width == 0 || height == 0 {
        match dimensions::detect_dimensions(&tmp) {
            Ok((pw, ph)) => {
                if width == 0 {
                    width = pw;
                }
                if height == 0 {
                    height = ph;
                }
            }
            Err(e) => warn!("failed to determine dimensions: {e}"),
        }
    }

    let output = resized_path(&job.file, width, height);
    fsutil::copy_durable(&tmp, &output, Create::Truncate)
        .map_err(|e| Error::from(e).context("failed to write output file"))?;

    Ok(Resized {
        input: job.file.clone(),
        output,
        width,
        height,
    })
}
