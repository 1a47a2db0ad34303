//! # urlqr
//!
//! Turns a URL (or any text) into a scannable QR code PNG, optionally with a centered logo
//! and a caption band underneath.
//!
//! The pipeline has four stages:
//!
//! - [`qrcode`]: encodes text into a QR Code Model 2 symbol (versions 1 to 40, levels L/M/Q/H,
//!   automatic mask selection).
//! - [`render`]: rasterizes the symbol at a whole number of pixels per module, with a quiet zone.
//! - [`overlay`]: pastes a logo sized for the error correction level and appends a caption
//!   rendered by [`caption`].
//! - [`output`]: derives a file name from the text and writes the PNG without partial files.
//!
//! [`pipeline::generate`] runs all of them from a [`config::GenerateOptions`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use urlqr::{config::GenerateOptions, qrcode::QrCodeEcc};
//!
//! let opts = GenerateOptions {
//!     ecl: QrCodeEcc::High,
//!     logo_name: Some("brand".into()),
//!     caption: Some("Scan me".into()),
//!     ..GenerateOptions::new("https://example.com/menu")
//! };
//! let path = urlqr::pipeline::generate(&opts)?;
//! println!("{}", path.display());
//! # Ok::<(), urlqr::error::QrError>(())
//! ```
//!
//! Encoding alone:
//!
//! ```rust
//! use urlqr::qrcode::{QrCode, QrCodeEcc};
//!
//! let qr = QrCode::encode_text("Hello, World!", QrCodeEcc::Low).unwrap();
//! assert_eq!(qr.size(), 21);
//! ```

#![forbid(unsafe_code)]

pub mod caption;
pub mod config;
pub mod error;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod qrcode;
pub mod render;

pub use config::GenerateOptions;
pub use error::{QrError, QrResult};
pub use pipeline::generate;
pub use qrcode::{QrCode, QrCodeEcc};
