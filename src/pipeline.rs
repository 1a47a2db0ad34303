//! End-to-end generation: encode, rasterize, overlay, write.

use std::path::PathBuf;

use crate::caption::Caption;
use crate::config::GenerateOptions;
use crate::error::QrResult;
use crate::output::{self, OutputTarget};
use crate::overlay::{self, OverlaySpec};
use crate::qrcode::{QrCode, QrCodeEcc};
use crate::render::{self, RenderRequest, RenderedImage};

/// Text plus the error correction level to encode it at.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EncodingRequest {
    pub text: String,
    pub ecl: QrCodeEcc,
}

impl EncodingRequest {
    pub fn new(text: impl Into<String>, ecl: QrCodeEcc) -> Self {
        Self {
            text: text.into(),
            ecl,
        }
    }

    /// # Errors
    ///
    /// Returns [`QrError::CapacityExceeded`](crate::error::QrError::CapacityExceeded) if the
    /// text does not fit a version 40 symbol.
    pub fn encode(&self) -> QrResult<QrCode> {
        let qr = QrCode::encode_text(&self.text, self.ecl)?;
        tracing::debug!(
            version = qr.version().value(),
            size = qr.size(),
            mask = qr.mask().value(),
            ecl = %self.ecl,
            "encoded symbol"
        );
        Ok(qr)
    }
}

/// Builds the final image for `opts` without touching the output directory.
///
/// Fails fast: a missing logo is reported before any encoding work is done.
pub fn build_image(opts: &GenerateOptions) -> QrResult<RenderedImage> {
    opts.validate()?;
    render_validated(opts)
}

fn render_validated(opts: &GenerateOptions) -> QrResult<RenderedImage> {
    let logo = match &opts.logo_name {
        Some(name) => {
            let path = overlay::find_logo(&opts.logos_dir, name)?;
            tracing::debug!(path = %path.display(), "using logo");
            Some(overlay::load_logo(&path)?)
        }
        None => None,
    };

    let symbol = EncodingRequest::new(opts.text.clone(), opts.ecl).encode()?;
    if opts.quiet_zone < 4 {
        tracing::warn!(
            quiet_zone = opts.quiet_zone,
            "quiet zone below 4 modules may hurt scanning"
        );
    }
    let rendered = render::rasterize(&RenderRequest::new(&symbol, opts.size, opts.quiet_zone))?;

    let spec = OverlaySpec {
        logo,
        caption: opts.caption.as_ref().map(|text| Caption {
            text: text.clone(),
            font_px: opts.caption_size,
        }),
        ecl: opts.ecl,
    };
    if spec.is_empty() {
        Ok(rendered)
    } else {
        overlay::compose(&rendered, &spec)
    }
}

/// Runs the whole pipeline and returns the absolute path of the written PNG.
///
/// # Errors
///
/// Any [`QrError`](crate::error::QrError); no file is written on failure.
#[tracing::instrument(
    skip_all,
    fields(ecl = %opts.ecl, size = opts.size, quiet_zone = opts.quiet_zone)
)]
pub fn generate(opts: &GenerateOptions) -> QrResult<PathBuf> {
    opts.validate()?;
    let target = OutputTarget::new(
        output::output_path(&opts.output_dir, opts.file_name.as_deref(), &opts.text),
        opts.force,
    );
    target.check_available()?;

    let image = render_validated(opts)?;
    output::write_png(&image.image, &target)
}
