use image::{ImageBuffer, Rgba, RgbaImage};

use crate::error::{QrError, QrResult};
use crate::qrcode::QrCode;

/*---- Rasterization ----*/

/// Largest accepted `pixel_size`. An RGBA image of this side takes 256 MiB.
pub const MAX_PIXEL_SIZE: u32 = 8192;

/// Colors used for dark and light modules. The quiet zone uses the light color.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Palette {
    pub dark: Rgba<u8>,
    pub light: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark: Rgba([0, 0, 0, 255]),
            light: Rgba([255, 255, 255, 255]),
        }
    }
}

/// Parameters for turning a symbol into pixels.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    pub symbol: &'a QrCode,
    /// Target width and height in pixels, before rounding down to a whole module scale.
    pub pixel_size: u32,
    /// Border width in modules.
    pub quiet_zone: u32,
    pub palette: Palette,
}

impl<'a> RenderRequest<'a> {
    pub fn new(symbol: &'a QrCode, pixel_size: u32, quiet_zone: u32) -> Self {
        Self {
            symbol,
            pixel_size,
            quiet_zone,
            palette: Palette::default(),
        }
    }
}

/// A rendered QR code together with the geometry it was drawn with.
///
/// `qr_height` is the height of the square QR area at the top of `image`; a caption band,
/// if any, lies below it.
#[derive(Clone, PartialEq, Debug)]
pub struct RenderedImage {
    pub image: RgbaImage,
    pub module_px: u32,
    pub quiet_zone: u32,
    pub symbol_modules: u32,
    pub qr_height: u32,
}

impl RenderedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Side of the symbol itself in pixels, quiet zone excluded.
    pub fn symbol_px(&self) -> u32 {
        self.symbol_modules * self.module_px
    }
}

/// Renders a QR code into an RGBA image.
///
/// Every module becomes a `scale × scale` block where
/// `scale = floor(pixel_size / (size + 2 * quiet_zone))`. The image side is therefore
/// `scale * (size + 2 * quiet_zone)`, which can be smaller than `pixel_size`; modules are
/// never stretched by a fractional amount.
///
/// # Errors
///
/// Returns [`QrError::ImageTooSmall`] if `pixel_size` cannot give every module at least one
/// pixel, and [`QrError::InvalidArgument`] if it is above [`MAX_PIXEL_SIZE`].
///
/// # Example
///
/// ```rust
/// use urlqr::qrcode::{QrCode, QrCodeEcc};
/// use urlqr::render::{rasterize, RenderRequest};
///
/// let qr = QrCode::encode_text("Hello, World!", QrCodeEcc::Low).unwrap();
/// let rendered = rasterize(&RenderRequest::new(&qr, 300, 4)).unwrap();
/// assert_eq!(rendered.width(), 290);
/// ```
pub fn rasterize(req: &RenderRequest<'_>) -> QrResult<RenderedImage> {
    if req.pixel_size > MAX_PIXEL_SIZE {
        return Err(QrError::invalid_argument(format!(
            "size of {} px exceeds the maximum of {MAX_PIXEL_SIZE} px",
            req.pixel_size
        )));
    }

    let symbol_modules = req.symbol.size() as u32;
    let total = req
        .quiet_zone
        .checked_mul(2)
        .and_then(|border| border.checked_add(symbol_modules))
        .ok_or_else(|| {
            QrError::invalid_argument(format!(
                "quiet zone of {} modules is too large",
                req.quiet_zone
            ))
        })?;

    let scale = req.pixel_size / total;
    if scale < 1 {
        return Err(QrError::image_too_small(format!(
            "{} px cannot fit {} modules ({} symbol + 2 x {} quiet zone)",
            req.pixel_size, total, symbol_modules, req.quiet_zone
        )));
    }

    let side = scale * total;
    let border = i64::from(req.quiet_zone);
    let img: RgbaImage = ImageBuffer::from_fn(side, side, |x, y| {
        let qr_x = i64::from(x / scale) - border;
        let qr_y = i64::from(y / scale) - border;
        if module_at(req.symbol, qr_x, qr_y) {
            req.palette.dark
        } else {
            req.palette.light
        }
    });

    tracing::debug!(scale, side, requested = req.pixel_size, "rasterized symbol");
    Ok(RenderedImage {
        image: img,
        module_px: scale,
        quiet_zone: req.quiet_zone,
        symbol_modules,
        qr_height: side,
    })
}

// Coordinates in the quiet zone are outside the symbol and read as light.
fn module_at(qr: &QrCode, x: i64, y: i64) -> bool {
    match (i32::try_from(x), i32::try_from(y)) {
        (Ok(x), Ok(y)) => qr.get_module(x, y),
        _ => false,
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::qrcode::QrCodeEcc;

    fn sample() -> QrCode {
        QrCode::encode_text(
            "https://apps.apple.com/us/app/magicshotbox/id6748461314",
            QrCodeEcc::Medium,
        )
        .unwrap()
    }

    #[test]
    fn test_integer_scale_rounds_down() {
        let qr = sample();
        let total = qr.size() as u32 + 8;
        let rendered = rasterize(&RenderRequest::new(&qr, 300, 4)).unwrap();
        assert_eq!(rendered.module_px, 300 / total);
        assert_eq!(rendered.image.dimensions(), (total * (300 / total), total * (300 / total)));
        assert!(rendered.width() <= 300);
        assert_eq!(rendered.qr_height, rendered.height());
    }

    #[test]
    fn test_one_pixel_per_module() {
        let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
        let rendered = rasterize(&RenderRequest::new(&qr, 29, 4)).unwrap();
        assert_eq!(rendered.image.dimensions(), (29, 29));
        assert_eq!(rendered.module_px, 1);
    }

    #[test]
    fn test_image_too_small() {
        let qr = QrCode::encode_text("Hello, world!", QrCodeEcc::Low).unwrap();
        let err = rasterize(&RenderRequest::new(&qr, 28, 4)).unwrap_err();
        assert!(matches!(err, QrError::ImageTooSmall(_)));
        assert!(matches!(
            rasterize(&RenderRequest::new(&qr, 0, 0)),
            Err(QrError::ImageTooSmall(_))
        ));
    }

    #[test]
    fn test_pixel_size_above_maximum_is_rejected() {
        let qr = sample();
        let at_max = rasterize(&RenderRequest::new(&qr, MAX_PIXEL_SIZE, 4)).unwrap();
        assert!(at_max.width() <= MAX_PIXEL_SIZE);

        for size in [MAX_PIXEL_SIZE + 1, 100_000, u32::MAX] {
            let err = rasterize(&RenderRequest::new(&qr, size, 4)).unwrap_err();
            assert!(matches!(err, QrError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_oversized_quiet_zone_is_rejected() {
        let qr = QrCode::encode_text("x", QrCodeEcc::Low).unwrap();
        let err = rasterize(&RenderRequest::new(&qr, 300, u32::MAX)).unwrap_err();
        assert!(matches!(err, QrError::InvalidArgument(_)));
    }

    #[test]
    fn test_modules_and_quiet_zone_colors() {
        let qr = sample();
        let rendered = rasterize(&RenderRequest::new(&qr, 300, 4)).unwrap();
        let s = rendered.module_px;
        let white = Rgba([255, 255, 255, 255]);
        let black = Rgba([0, 0, 0, 255]);
        // Quiet zone corner
        assert_eq!(*rendered.image.get_pixel(0, 0), white);
        assert_eq!(*rendered.image.get_pixel(4 * s - 1, 4 * s - 1), white);
        // Top left finder corner, all pixels of the module
        for dy in 0..s {
            for dx in 0..s {
                assert_eq!(*rendered.image.get_pixel(4 * s + dx, 4 * s + dy), black);
            }
        }
        // Every pixel is one of the two palette colors
        assert!(rendered.image.pixels().all(|p| *p == white || *p == black));
    }

    #[test]
    fn test_custom_palette() {
        let qr = sample();
        let mut req = RenderRequest::new(&qr, 300, 2);
        req.palette = Palette {
            dark: Rgba([10, 20, 30, 255]),
            light: Rgba([250, 240, 230, 255]),
        };
        let rendered = rasterize(&req).unwrap();
        let s = rendered.module_px;
        assert_eq!(*rendered.image.get_pixel(0, 0), req.palette.light);
        assert_eq!(*rendered.image.get_pixel(2 * s, 2 * s), req.palette.dark);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let qr = sample();
        let a = rasterize(&RenderRequest::new(&qr, 300, 4)).unwrap();
        let b = rasterize(&RenderRequest::new(&qr, 300, 4)).unwrap();
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }
}
