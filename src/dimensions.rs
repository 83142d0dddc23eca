//! Finding the pixel dimensions of an encoded image.
//!
//! WebP headers are read in process; anything else goes through `file`,
//! then ImageMagick's `identify` when it is installed.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use img_parts::riff::RiffContent;
use img_parts::webp::WebP;
use regex::Regex;

use crate::error::{ErrorKind, Result};
use crate::tool::Tool;

const VP8: [u8; 4] = *b"VP8 ";
const VP8L: [u8; 4] = *b"VP8L";
const VP8X: [u8; 4] = *b"VP8X";

const VP8_START_CODE: [u8; 3] = [0x9d, 0x01, 0x2a];
const VP8L_SIGNATURE: u8 = 0x2f;

static DIMENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{1,5})x([0-9]{1,5})").expect("dimension pattern"));

/// Width and height of the image at `path`.
pub fn detect_dimensions(path: impl AsRef<Path>) -> Result<(u32, u32)> {
    let path = path.as_ref();
    match webp_dimensions(path) {
        Ok(Some(dims)) => return Ok(dims),
        Ok(None) => trace!("{} has no readable WebP header", path.display()),
        Err(e) => debug!("reading {} failed: {e}", path.display()),
    }

    let described = Tool::new("file")
        .output([path])
        .map_err(|e| e.context("file command failed"))?;
    if let Some(dims) = parse_dimensions(&described) {
        return Ok(dims);
    }

    let identify = Tool::new("identify");
    if identify.locate().is_some() {
        let args = [OsStr::new("-format"), OsStr::new("%wx%h"), path.as_os_str()];
        match identify.output(args) {
            Ok(out) => {
                if let Some(dims) = parse_dimensions(&out) {
                    return Ok(dims);
                }
            }
            Err(e) => debug!("identify failed: {e}"),
        }
    }

    Err(ErrorKind::Dimensions(format!(
        "failed to parse dimensions from file output: {}",
        described.trim()
    ))
    .into())
}

/// First `WIDTHxHEIGHT` pair in free-form tool output.
pub fn parse_dimensions(text: &str) -> Option<(u32, u32)> {
    let caps = DIMENSIONS.captures(text)?;
    let width = caps[1].parse().ok()?;
    let height = caps[2].parse().ok()?;
    Some((width, height))
}

/// Canvas size from the WebP container at `path`, or `None` if the file is
/// not a WebP image.
pub fn webp_dimensions(path: &Path) -> Result<Option<(u32, u32)>> {
    let bytes = fs::read(path)?;
    let webp = match WebP::from_bytes(bytes.into()) {
        Ok(webp) => webp,
        Err(e) => {
            trace!("not a WebP container: {e}");
            return Ok(None);
        }
    };
    for chunk in webp.chunks() {
        if let RiffContent::Data(data) = chunk.content() {
            if let Some(dims) = frame_dimensions(chunk.id(), data) {
                return Ok(Some(dims));
            }
        }
    }
    Ok(None)
}

/// Decodes the size fields of a `VP8X`, `VP8L` or `VP8 ` chunk payload.
fn frame_dimensions(id: [u8; 4], data: &[u8]) -> Option<(u32, u32)> {
    match id {
        VP8X if data.len() >= 10 => Some((1 + u24_le(&data[4..7]), 1 + u24_le(&data[7..10]))),
        VP8L if data.len() >= 5 && data[0] == VP8L_SIGNATURE => {
            let bits = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
            Some(((bits & 0x3fff) + 1, ((bits >> 14) & 0x3fff) + 1))
        }
        VP8 if data.len() >= 10 && data[3..6] == VP8_START_CODE => {
            let width = u16::from_le_bytes([data[6], data[7]]) & 0x3fff;
            let height = u16::from_le_bytes([data[8], data[9]]) & 0x3fff;
            Some((width.into(), height.into()))
        }
        _ => None,
    }
}

fn u24_le(b: &[u8]) -> u32 {
    u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest WebP container this module accepts: a RIFF header and one
    /// `VP8X` chunk carrying the canvas size.
    pub(crate) fn vp8x_file(width: u32, height: u32) -> Vec<u8> {
        let mut chunk = vec![0u8; 10];
        chunk[4..7].copy_from_slice(&(width - 1).to_le_bytes()[..3]);
        chunk[7..10].copy_from_slice(&(height - 1).to_le_bytes()[..3]);

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(4u32 + 8 + chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WEBP");
        out.extend_from_slice(b"VP8X");
        out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&chunk);
        out
    }

    #[test]
    fn parses_file_style_output() {
        let out = "out.webp: RIFF (little-endian) data, Web/P image, VP8 encoding, 800x600, Scaling: [none]x[none]";
        assert_eq!(parse_dimensions(out), Some((800, 600)));
        assert_eq!(parse_dimensions("1024x768"), Some((1024, 768)));
        assert_eq!(parse_dimensions("no numbers here"), None);
    }

    #[test]
    fn decodes_each_frame_kind() {
        let mut vp8x = [0u8; 10];
        vp8x[4..7].copy_from_slice(&[0x7f, 0x02, 0x00]); // 639
        vp8x[7..10].copy_from_slice(&[0xdf, 0x01, 0x00]); // 479
        assert_eq!(frame_dimensions(VP8X, &vp8x), Some((640, 480)));

        let bits: u32 = (100 - 1) | ((50 - 1) << 14);
        let mut vp8l = vec![VP8L_SIGNATURE];
        vp8l.extend_from_slice(&bits.to_le_bytes());
        assert_eq!(frame_dimensions(VP8L, &vp8l), Some((100, 50)));

        let mut vp8 = vec![0, 0, 0, 0x9d, 0x01, 0x2a];
        vp8.extend_from_slice(&320u16.to_le_bytes());
        vp8.extend_from_slice(&240u16.to_le_bytes());
        assert_eq!(frame_dimensions(VP8, &vp8), Some((320, 240)));

        assert_eq!(frame_dimensions(VP8, &vp8[..8]), None);
        assert_eq!(frame_dimensions(*b"ICCP", &vp8x), None);
    }

    #[test]
    fn reads_webp_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.webp");
        fs::write(&path, vp8x_file(1920, 1080)).unwrap();
        assert_eq!(webp_dimensions(&path).unwrap(), Some((1920, 1080)));
        assert_eq!(detect_dimensions(&path).unwrap(), (1920, 1080));
    }

    #[test]
    fn non_webp_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"plain text").unwrap();
        assert_eq!(webp_dimensions(&path).unwrap(), None);
    }
}
