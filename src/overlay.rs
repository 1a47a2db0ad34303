//! Logo and caption compositing on top of a rendered QR code.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::caption::{self, BandMetrics, Caption};
use crate::error::{QrError, QrResult};
use crate::qrcode::QrCodeEcc;
use crate::render::RenderedImage;

/// Largest logo side, as a share of the rendered image width.
pub const DEFAULT_LOGO_FRACTION: f32 = 0.20;

/// Extensions tried in order when several logo files share a stem.
const LOGO_EXTENSION_PREFERENCE: [&[&str]; 4] = [&["png"], &["jpg", "jpeg"], &["webp"], &["bmp"]];

/// What to draw over a rendered QR code.
#[derive(Clone, Debug, Default)]
pub struct OverlaySpec {
    pub logo: Option<RgbaImage>,
    pub caption: Option<Caption>,
    /// Level the symbol was encoded with; bounds how much of it the logo may cover.
    pub ecl: QrCodeEcc,
}

impl OverlaySpec {
    pub fn is_empty(&self) -> bool {
        self.logo.is_none() && self.caption.is_none()
    }
}

/// Largest logo side, as a share of the symbol side (quiet zone excluded), that keeps a
/// centered logo recoverable at the given level.
///
/// The covered share of the symbol is the square of this value: about 1.4%, 3.2%, 4.8% and
/// 6.3% for L, M, Q and H, against recovery capacities of roughly 7%, 15%, 25% and 30% of
/// codewords. The margin absorbs codewords that are only partly covered.
pub fn max_logo_fraction(ecl: QrCodeEcc) -> f32 {
    match ecl {
        QrCodeEcc::Low => 0.12,
        QrCodeEcc::Medium => 0.18,
        QrCodeEcc::Quartile => 0.22,
        QrCodeEcc::High => 0.25,
    }
}

/// Side of the square box a logo is fitted into, in pixels.
pub fn logo_box_px(rendered: &RenderedImage, ecl: QrCodeEcc) -> u32 {
    let by_width = (rendered.width() as f32) * DEFAULT_LOGO_FRACTION;
    let by_level = (rendered.symbol_px() as f32) * max_logo_fraction(ecl);
    (by_width.min(by_level) as u32).max(1)
}

/// Applies the logo and caption in `spec` to a copy of `rendered`.
///
/// The logo is fitted into a square box (see [`logo_box_px`]) keeping its aspect ratio,
/// centered on the QR area and alpha-blended. The caption is appended as a band below the
/// QR area. The input image is left untouched.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(logo = spec.logo.is_some(), caption = spec.caption.is_some())
)]
pub fn compose(rendered: &RenderedImage, spec: &OverlaySpec) -> QrResult<RenderedImage> {
    let mut out = rendered.clone();
    if let Some(logo) = &spec.logo {
        paste_logo(&mut out, logo, spec.ecl);
    }
    if let Some(caption) = &spec.caption {
        out = append_caption(out, caption)?;
    }
    Ok(out)
}

fn paste_logo(out: &mut RenderedImage, logo: &RgbaImage, ecl: QrCodeEcc) {
    let bound = logo_box_px(out, ecl);
    let (lw, lh) = logo.dimensions();
    let (w, h) = if lw >= lh {
        (bound, ((u64::from(bound) * u64::from(lh)) / u64::from(lw.max(1))) as u32)
    } else {
        (((u64::from(bound) * u64::from(lw)) / u64::from(lh.max(1))) as u32, bound)
    };
    let (w, h) = (w.max(1), h.max(1));
    let resized = imageops::resize(logo, w, h, FilterType::Lanczos3);

    let x = (out.width() - w) / 2;
    let y = (out.qr_height - h) / 2;
    tracing::debug!(w, h, x, y, bound, "placing logo");
    imageops::overlay(&mut out.image, &resized, i64::from(x), i64::from(y));
}

fn append_caption(base: RenderedImage, caption: &Caption) -> QrResult<RenderedImage> {
    let width = base.width();
    let metrics = BandMetrics::for_width(width, caption.font_px)?;
    let canvas_height = base.height().checked_add(metrics.height).ok_or_else(|| {
        QrError::invalid_argument(format!(
            "caption band of {} px does not fit under a {} px image",
            metrics.height,
            base.height()
        ))
    })?;
    let band = caption::render_band(&caption.text, width, metrics.height, metrics.font_px)?;

    let mut canvas = RgbaImage::from_pixel(width, canvas_height, caption::BAND_BACKGROUND);
    imageops::replace(&mut canvas, &base.image, 0, 0);
    imageops::replace(&mut canvas, &band, 0, i64::from(base.height()));
    tracing::debug!(font_px = metrics.font_px, band = metrics.height, "appended caption");

    Ok(RenderedImage {
        image: canvas,
        ..base
    })
}

/// Finds a logo file for `name`.
///
/// `name` is used as is when it points at an existing file. Otherwise it is matched
/// case-insensitively against the files in `logos_dir`, either by full file name or by stem.
/// Among several matches `.png` wins over `.jpg`/`.jpeg`, then `.webp`, then `.bmp`, then
/// anything else; remaining ties go to the alphabetically first name.
///
/// # Errors
///
/// Returns [`QrError::AssetNotFound`] if the directory is missing or nothing matches.
pub fn find_logo(logos_dir: &Path, name: &str) -> QrResult<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    let entries = fs::read_dir(logos_dir).map_err(|err| {
        QrError::asset_not_found(format!("logo directory '{}': {err}", logos_dir.display()))
    })?;

    let desired_name = name.to_lowercase();
    let desired_stem = Path::new(&desired_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| desired_name.clone());

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            file_name == desired_name || stem == desired_stem
        })
        .collect();
    candidates.sort_by(|a, b| extension_rank(a).cmp(&extension_rank(b)).then_with(|| a.cmp(b)));

    candidates.into_iter().next().ok_or_else(|| {
        QrError::asset_not_found(format!("no logo named '{name}' in '{}'", logos_dir.display()))
    })
}

fn extension_rank(path: &Path) -> usize {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    LOGO_EXTENSION_PREFERENCE
        .iter()
        .position(|group| group.contains(&ext.as_str()))
        .unwrap_or(LOGO_EXTENSION_PREFERENCE.len())
}

/// Decodes a logo file into RGBA.
///
/// # Errors
///
/// Returns [`QrError::AssetNotFound`] if the file cannot be read or decoded.
pub fn load_logo(path: &Path) -> QrResult<RgbaImage> {
    let img = image::open(path).map_err(|err| {
        QrError::asset_not_found(format!("cannot load logo '{}': {err}", path.display()))
    })?;
    Ok(img.to_rgba8())
}
