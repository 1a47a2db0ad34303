//! Caption text rasterization.
//!
//! Text is laid out as a one-line SVG `<text>` element, converted to paths by `usvg` using
//! the system font database and rasterized with `resvg`. When no font is available the band
//! stays blank and a warning is logged.

use std::sync::Arc;

use anyhow::Context;
use image::{Rgba, RgbaImage};
use resvg::tiny_skia;

use crate::error::{QrError, QrResult};

const FONT_FAMILY: &str = "DejaVu Sans, Arial, Helvetica, Liberation Sans, sans-serif";

/// Largest explicit caption font size, in pixels.
pub const MAX_CAPTION_FONT_PX: u32 = 1024;

/// Horizontal margin kept free on both sides of the caption, in pixels.
const SIDE_MARGIN: u32 = 8;

/// Caption request: the text plus an optional explicit font size in pixels.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Caption {
    pub text: String,
    pub font_px: Option<u32>,
}

impl Caption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_px: None,
        }
    }

    pub fn with_font_px(mut self, font_px: u32) -> Self {
        self.font_px = Some(font_px);
        self
    }
}

/// Size of the band appended under a QR image of a given width.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BandMetrics {
    pub font_px: u32,
    pub padding: u32,
    pub height: u32,
}

impl BandMetrics {
    /// Font size is the explicit size if positive, else 8% of the width but at least 20 px.
    /// The band is the font size plus padding above and below, and never less than 40 px.
    ///
    /// # Errors
    ///
    /// Returns [`QrError::InvalidArgument`] if the explicit size is above
    /// [`MAX_CAPTION_FONT_PX`] or the band height does not fit in a `u32`.
    pub fn for_width(width: u32, explicit_font_px: Option<u32>) -> QrResult<Self> {
        let explicit = explicit_font_px.filter(|&px| px > 0);
        if let Some(px) = explicit.filter(|&px| px > MAX_CAPTION_FONT_PX) {
            return Err(QrError::invalid_argument(format!(
                "caption size of {px} px exceeds the maximum of {MAX_CAPTION_FONT_PX} px"
            )));
        }

        let font_px = match explicit {
            Some(px) => px,
            None => (((width as f32) * 0.08) as u32).max(20),
        };
        let padding = match explicit {
            Some(px) => px.max(12),
            None => (((width as f32) * 0.02) as u32).max(12),
        };
        let height = padding
            .checked_mul(2)
            .and_then(|pad| pad.checked_add(font_px))
            .ok_or_else(|| {
                QrError::invalid_argument(format!("caption band for {width} px is too tall"))
            })?
            .max(40);
        Ok(Self {
            font_px,
            padding,
            height,
        })
    }
}

/// Renders `text` centered on an opaque white band of `width × height` pixels.
///
/// Text wider than the band (minus a small margin) is scaled down around its center so it
/// fits on one line.
pub fn render_band(text: &str, width: u32, height: u32, font_px: u32) -> QrResult<RgbaImage> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    let mut opts = usvg::Options::default();
    opts.fontdb = Arc::new(fontdb);

    let svg = band_svg(text, width, height, font_px);
    let tree = usvg::Tree::from_str(&svg, &opts).context("parse caption svg")?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        QrError::image_too_small(format!("caption band of {width}x{height} px"))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    if !tree.root().has_children() {
        tracing::warn!(text, "no usable font found; caption band left blank");
    } else {
        let text_width = tree.root().abs_bounding_box().width();
        let available = width.saturating_sub(2 * SIDE_MARGIN).max(1) as f32;
        let transform = if text_width > available {
            let s = available / text_width;
            let (cx, cy) = ((width as f32) / 2.0, (height as f32) / 2.0);
            tracing::debug!(text_width, available, scale = s, "shrinking caption to fit");
            tiny_skia::Transform::from_row(s, 0.0, 0.0, s, cx * (1.0 - s), cy * (1.0 - s))
        } else {
            tiny_skia::Transform::identity()
        };
        resvg::render(&tree, transform, &mut pixmap.as_mut());
    }

    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(width, height, data)
        .ok_or_else(|| anyhow::anyhow!("caption pixel buffer length mismatch").into())
}

/// White background color of the caption band.
pub const BAND_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn band_svg(text: &str, width: u32, height: u32, font_px: u32) -> String {
    format!(
        concat!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
            "<text x=\"{cx}\" y=\"{cy}\" font-family=\"{family}\" font-size=\"{size}\" ",
            "text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"#000000\" ",
            "stroke=\"#FFFFFF\" stroke-width=\"2\" paint-order=\"stroke\" xml:space=\"preserve\">{text}</text>",
            "</svg>"
        ),
        w = width,
        h = height,
        cx = (width as f32) / 2.0,
        cy = (height as f32) / 2.0,
        family = FONT_FAMILY,
        size = font_px,
        text = escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_scale_with_width() {
        let m = BandMetrics::for_width(287, None).unwrap();
        assert_eq!(m.font_px, 22);
        assert_eq!(m.padding, 12);
        assert_eq!(m.height, 46);

        let wide = BandMetrics::for_width(1000, None).unwrap();
        assert_eq!(wide.font_px, 80);
        assert_eq!(wide.padding, 20);
        assert_eq!(wide.height, 120);
    }

    #[test]
    fn metrics_floor_for_small_images() {
        let m = BandMetrics::for_width(50, None).unwrap();
        assert_eq!(m.font_px, 20);
        assert_eq!(m.height, 44);
    }

    #[test]
    fn metrics_with_explicit_font_size() {
        let m = BandMetrics::for_width(287, Some(30)).unwrap();
        assert_eq!(m.font_px, 30);
        assert_eq!(m.padding, 30);
        assert_eq!(m.height, 90);

        let small = BandMetrics::for_width(287, Some(8)).unwrap();
        assert_eq!(small.padding, 12);
        assert_eq!(small.height, 40);

        assert_eq!(
            BandMetrics::for_width(287, Some(0)).unwrap(),
            BandMetrics::for_width(287, None).unwrap()
        );
    }

    #[test]
    fn metrics_reject_huge_font_sizes() {
        let at_max = BandMetrics::for_width(287, Some(MAX_CAPTION_FONT_PX)).unwrap();
        assert_eq!(at_max.height, MAX_CAPTION_FONT_PX * 3);

        for px in [MAX_CAPTION_FONT_PX + 1, 2_000_000_000, u32::MAX] {
            let err = BandMetrics::for_width(287, Some(px)).unwrap_err();
            assert!(matches!(err, QrError::InvalidArgument(_)));
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
        assert_eq!(escape_xml("tab\there"), "tab here");
    }

    #[test]
    fn svg_parses_with_hostile_text() {
        let svg = band_svg("</text><script>", 200, 46, 20);
        let opts = usvg::Options::default();
        usvg::Tree::from_str(&svg, &opts).unwrap();
    }

    #[test]
    fn band_has_requested_size_and_white_edges() {
        let band = render_band("Scan me", 287, 46, 22).unwrap();
        assert_eq!(band.dimensions(), (287, 46));
        assert_eq!(*band.get_pixel(0, 0), BAND_BACKGROUND);
        assert_eq!(*band.get_pixel(286, 45), BAND_BACKGROUND);
        assert!(band.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn band_contains_text_ink() {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        if fontdb.faces().next().is_none() {
            eprintln!("no system fonts installed; skipping");
            return;
        }

        let band = render_band("Scan me", 287, 46, 22).unwrap();
        let dark = band.pixels().filter(|p| p[0] < 128 && p[1] < 128 && p[2] < 128).count();
        assert!(dark > 50, "expected drawn glyphs, found {dark} dark pixels");

        let blank = render_band("", 287, 46, 22).unwrap();
        assert!(blank.pixels().all(|p| *p == BAND_BACKGROUND));
    }
}
