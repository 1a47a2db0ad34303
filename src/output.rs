//! Output path construction and PNG persistence.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context;
use image::{ImageFormat, RgbaImage};
use regex::Regex;

use crate::error::{QrError, QrResult};

/// Longest stem derived from non-URL text.
const MAX_TEXT_STEM: usize = 64;

/// Where to write the PNG and whether an existing file may be replaced.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub overwrite: bool,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            path: path.into(),
            overwrite,
        }
    }

    /// Fails with [`QrError::FileExists`] if the path is taken and overwriting is off.
    pub fn check_available(&self) -> QrResult<()> {
        if !self.overwrite && self.path.exists() {
            return Err(QrError::FileExists(self.path.clone()));
        }
        Ok(())
    }
}

/// Writes `image` as a PNG to `target` and returns the absolute path written.
///
/// The PNG is encoded into a temporary file next to the target and renamed into place, so
/// the target never holds a partial image. Missing parent directories are created.
///
/// # Errors
///
/// Returns [`QrError::FileExists`] if the target exists and `overwrite` is false; nothing is
/// written in that case.
#[tracing::instrument(level = "debug", skip(image), fields(path = %target.path.display()))]
pub fn write_png(image: &RgbaImage, target: &OutputTarget) -> QrResult<PathBuf> {
    target.check_available()?;

    let dir = match target.path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("create output directory '{}'", dir.display()))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".urlqr-")
        .suffix(".png")
        .tempfile_in(&dir)
        .with_context(|| format!("create temporary file in '{}'", dir.display()))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        image
            .write_to(&mut writer, ImageFormat::Png)
            .context("encode png")?;
        writer.flush().context("flush png")?;
    }

    let persisted = if target.overwrite {
        tmp.persist(&target.path)
    } else {
        tmp.persist_noclobber(&target.path)
    };
    persisted.map_err(|err| {
        if err.error.kind() == std::io::ErrorKind::AlreadyExists {
            QrError::FileExists(target.path.clone())
        } else {
            QrError::Other(
                anyhow::Error::new(err.error)
                    .context(format!("write '{}'", target.path.display())),
            )
        }
    })?;

    let written = fs::canonicalize(&target.path)
        .with_context(|| format!("resolve '{}'", target.path.display()))?;
    tracing::info!(path = %written.display(), "wrote png");
    Ok(written)
}

/// Derives a PNG file name from the encoded text.
///
/// For `scheme://host/.../last` the name is `host_last.png`; query and fragment are ignored.
/// Other text is used directly, truncated to 64 characters. Both are sanitized to
/// `[A-Za-z0-9._-]` and fall back to `qr.png` when nothing is left.
///
/// ```rust
/// use urlqr::output::derive_filename;
///
/// assert_eq!(
///     derive_filename("https://apps.apple.com/us/app/magicshotbox/id6748461314"),
///     "apps.apple.com_id6748461314.png"
/// );
/// ```
pub fn derive_filename(text: &str) -> String {
    let stem = match text.split_once("://") {
        Some((_, rest)) => {
            let rest = rest.split(['?', '#']).next().unwrap_or_default();
            let (authority, path) = match rest.find('/') {
                Some(i) => rest.split_at(i),
                None => (rest, ""),
            };
            let host = sanitize_component(authority);
            let tail = path
                .split('/')
                .filter(|part| !part.is_empty())
                .last()
                .map(sanitize_component)
                .unwrap_or_default();
            match (host.is_empty(), tail.is_empty()) {
                (false, false) => format!("{host}_{tail}"),
                (false, true) => host,
                (true, _) => tail,
            }
        }
        None => {
            let truncated: String = text.chars().take(MAX_TEXT_STEM).collect();
            sanitize_component(&truncated)
        }
    };
    let stem = if stem.is_empty() { "qr".to_string() } else { stem };
    format!("{stem}.png")
}

// Underscores are matched with the disallowed characters so repeated ones collapse too.
static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9.-]+").expect("valid file name pattern"));

/// Replaces runs of characters outside `[A-Za-z0-9._-]` with one `_`, collapses repeated
/// underscores and trims `.`, `_` and `-` from both ends.
pub fn sanitize_component(text: &str) -> String {
    UNSAFE_RUN
        .replace_all(text, "_")
        .trim_matches(|c| matches!(c, '.' | '_' | '-'))
        .to_string()
}

/// Joins the output directory with either the explicit name or the derived one.
pub fn output_path(out_dir: &Path, explicit_name: Option<&str>, text: &str) -> PathBuf {
    match explicit_name {
        Some(name) => out_dir.join(name),
        None => out_dir.join(derive_filename(text)),
    }
}
