use std::path::Path;

use image::{GenericImageView, Rgba, RgbaImage};
use urlqr::overlay::{self, OverlaySpec};
use urlqr::pipeline::build_image;
use urlqr::render::{rasterize, RenderRequest};
use urlqr::{GenerateOptions, QrCode, QrCodeEcc, QrError};

const APP_URL: &str = "https://apps.apple.com/us/app/magicshotbox/id6748461314";

fn decode(img: &RgbaImage) -> String {
    let luma = image::DynamicImage::ImageRgba8(img.clone()).to_luma8();
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        luma.width() as usize,
        luma.height() as usize,
        |x, y| luma.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR code");
    let (_meta, content) = grids[0].decode().expect("decodable");
    content
}

fn options_in(dir: &Path, text: &str) -> GenerateOptions {
    GenerateOptions {
        output_dir: dir.join("Outputs"),
        logos_dir: dir.join("Logos"),
        ..GenerateOptions::new(text)
    }
}

fn write_logo(dir: &Path, name: &str) {
    std::fs::create_dir_all(dir).unwrap();
    let logo = RgbaImage::from_fn(120, 80, |x, y| {
        if (x / 10 + y / 10) % 2 == 0 {
            Rgba([220, 30, 30, 255])
        } else {
            Rgba([30, 30, 220, 255])
        }
    });
    logo.save(dir.join(name)).unwrap();
}

#[test]
fn decodes_at_every_level() {
    let texts = ["HELLO WORLD", "0123456789012345", APP_URL, "Grüße aus Köln ✓"];
    for ecl in QrCodeEcc::ALL {
        for text in texts {
            let qr = QrCode::encode_text(text, ecl).unwrap();
            let rendered = rasterize(&RenderRequest::new(&qr, 400, 4)).unwrap();
            assert_eq!(decode(&rendered.image), text, "level {ecl}");
        }
    }
}

fn long_text(len: usize) -> String {
    "https://example.com/catalogue/item?id=0123&lang=en-gb#section-"
        .chars()
        .cycle()
        .take(len)
        .collect()
}

#[test]
fn decodes_large_versions() {
    for len in [200, 800] {
        let text = long_text(len);
        for ecl in QrCodeEcc::ALL {
            let qr = QrCode::encode_text(&text, ecl).unwrap();
            assert!(qr.version().value() >= 7, "{len} bytes at {ecl}");
            let rendered = rasterize(&RenderRequest::new(&qr, 1200, 4)).unwrap();
            assert_eq!(decode(&rendered.image), text, "{len} bytes at {ecl}");
        }
    }
}

#[test]
fn app_url_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = urlqr::generate(&options_in(dir.path(), APP_URL)).unwrap();
    assert!(path.is_absolute());
    assert_eq!(path.file_name().unwrap(), "apps.apple.com_id6748461314.png");

    let img = image::open(&path).unwrap();
    let (w, h) = img.dimensions();
    assert_eq!(w, h);
    assert!(w <= 300);
    assert!(w > 150);
    assert_eq!(decode(&img.to_rgba8()), APP_URL);
}

#[test]
fn logo_keeps_code_decodable() {
    for ecl in QrCodeEcc::ALL {
        let dir = tempfile::tempdir().unwrap();
        write_logo(&dir.path().join("Logos"), "brand.png");
        let opts = GenerateOptions {
            ecl,
            logo_name: Some("brand".into()),
            ..options_in(dir.path(), APP_URL)
        };
        let img = build_image(&opts).unwrap();
        assert_eq!(decode(&img.image), APP_URL, "level {ecl}");

        let plain = build_image(&GenerateOptions { logo_name: None, ..opts }).unwrap();
        assert_ne!(img.image, plain.image);
    }
}

#[test]
fn logo_on_large_symbols_stays_decodable() {
    let dir = tempfile::tempdir().unwrap();
    write_logo(&dir.path().join("Logos"), "brand.png");
    let text = long_text(400);
    for ecl in QrCodeEcc::ALL {
        let opts = GenerateOptions {
            ecl,
            size: 1200,
            logo_name: Some("brand".into()),
            ..options_in(dir.path(), &text)
        };
        let img = build_image(&opts).unwrap();
        assert_eq!(decode(&img.image), text, "level {ecl}");
    }
}

#[test]
fn caption_band_sits_below_code() {
    let dir = tempfile::tempdir().unwrap();
    let opts = GenerateOptions {
        caption: Some("Download MagicShotBox".into()),
        ..options_in(dir.path(), APP_URL)
    };
    let with_caption = build_image(&opts).unwrap();
    let plain = build_image(&GenerateOptions { caption: None, ..opts }).unwrap();

    assert_eq!(with_caption.width(), plain.width());
    assert!(with_caption.height() > plain.height());
    assert_eq!(with_caption.qr_height, plain.height());

    let (w, h) = (plain.width(), plain.height());
    let code_area = image::imageops::crop_imm(&with_caption.image, 0, 0, w, h).to_image();
    assert_eq!(code_area, plain.image);
    assert_eq!(decode(&code_area), APP_URL);
}

#[test]
fn logo_and_caption_compose_in_order() {
    let qr = QrCode::encode_text(APP_URL, QrCodeEcc::High).unwrap();
    let base = rasterize(&RenderRequest::new(&qr, 300, 4)).unwrap();
    let spec = OverlaySpec {
        logo: Some(RgbaImage::from_pixel(40, 40, Rgba([0, 160, 0, 255]))),
        caption: Some(urlqr::caption::Caption::new("Menu").with_font_px(18)),
        ecl: QrCodeEcc::High,
    };
    let out = overlay::compose(&base, &spec).unwrap();
    let centre = out.image.get_pixel(base.width() / 2, base.qr_height / 2);
    assert!(centre[1] > 100 && centre[0] < 100);
    let (w, h) = (base.width(), base.qr_height);
    let code_area = image::imageops::crop_imm(&out.image, 0, 0, w, h).to_image();
    assert_eq!(decode(&code_area), APP_URL);
}

#[test]
fn failures_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let outputs = dir.path().join("Outputs");

    let missing_logo = GenerateOptions {
        logo_name: Some("nope".into()),
        ..options_in(dir.path(), APP_URL)
    };
    assert!(matches!(
        urlqr::generate(&missing_logo),
        Err(QrError::AssetNotFound(_))
    ));

    let tiny = GenerateOptions {
        size: 20,
        ..options_in(dir.path(), APP_URL)
    };
    assert!(matches!(urlqr::generate(&tiny), Err(QrError::ImageTooSmall(_))));

    let huge = options_in(dir.path(), &"x".repeat(3000));
    assert!(matches!(
        urlqr::generate(&huge),
        Err(QrError::CapacityExceeded(_))
    ));

    let entries = std::fs::read_dir(&outputs).map(|d| d.count()).unwrap_or(0);
    assert_eq!(entries, 0);
}

#[test]
fn overwrite_needs_force() {
    let dir = tempfile::tempdir().unwrap();
    let opts = GenerateOptions {
        file_name: Some("fixed.png".into()),
        ..options_in(dir.path(), APP_URL)
    };
    let first = urlqr::generate(&opts).unwrap();
    let err = urlqr::generate(&opts).unwrap_err();
    assert!(matches!(err, QrError::FileExists(_)));
    assert_eq!(err.exit_code(), 1);

    let forced = urlqr::generate(&GenerateOptions { force: true, ..opts }).unwrap();
    assert_eq!(first, forced);
    assert_eq!(decode(&image::open(&forced).unwrap().to_rgba8()), APP_URL);
}
