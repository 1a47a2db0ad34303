use std::path::PathBuf;

use crate::caption::MAX_CAPTION_FONT_PX;
use crate::error::{QrError, QrResult};
use crate::qrcode::QrCodeEcc;
use crate::render::MAX_PIXEL_SIZE;

pub const DEFAULT_SIZE: u32 = 300;
pub const DEFAULT_QUIET_ZONE: u32 = 4;
pub const DEFAULT_ECL: QrCodeEcc = QrCodeEcc::Medium;
pub const DEFAULT_OUTPUT_DIR: &str = "Outputs";
pub const DEFAULT_LOGOS_DIR: &str = "Logos";

/// Everything one invocation needs, with the command line defaults.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GenerateOptions {
    /// Text to encode. Usually a URL, but any string is accepted.
    pub text: String,
    pub ecl: QrCodeEcc,
    /// Requested side in pixels; the result is rounded down to a whole module scale.
    pub size: u32,
    /// Border width in modules.
    pub quiet_zone: u32,
    /// Logo file name or stem, looked up in `logos_dir`.
    pub logo_name: Option<String>,
    pub caption: Option<String>,
    pub caption_size: Option<u32>,
    pub output_dir: PathBuf,
    pub logos_dir: PathBuf,
    /// Overrides the file name derived from `text`.
    pub file_name: Option<String>,
    pub force: bool,
}

impl GenerateOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Rejects empty text and sizes above [`MAX_PIXEL_SIZE`] or [`MAX_CAPTION_FONT_PX`].
    pub fn validate(&self) -> QrResult<()> {
        if self.text.is_empty() {
            return Err(QrError::invalid_argument("text to encode must not be empty"));
        }
        if self.size > MAX_PIXEL_SIZE {
            return Err(QrError::invalid_argument(format!(
                "size of {} px exceeds the maximum of {MAX_PIXEL_SIZE} px",
                self.size
            )));
        }
        if let Some(px) = self.caption_size.filter(|&px| px > MAX_CAPTION_FONT_PX) {
            return Err(QrError::invalid_argument(format!(
                "caption size of {px} px exceeds the maximum of {MAX_CAPTION_FONT_PX} px"
            )));
        }
        Ok(())
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            ecl: DEFAULT_ECL,
            size: DEFAULT_SIZE,
            quiet_zone: DEFAULT_QUIET_ZONE,
            logo_name: None,
            caption: None,
            caption_size: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            logos_dir: PathBuf::from(DEFAULT_LOGOS_DIR),
            file_name: None,
            force: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_command_line() {
        let opts = GenerateOptions::new("https://example.com");
        assert_eq!(opts.text, "https://example.com");
        assert_eq!(opts.size, 300);
        assert_eq!(opts.quiet_zone, 4);
        assert_eq!(opts.ecl, QrCodeEcc::Medium);
        assert_eq!(opts.output_dir, PathBuf::from("Outputs"));
        assert_eq!(opts.logos_dir, PathBuf::from("Logos"));
        assert!(!opts.force);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert!(GenerateOptions::default().validate().is_err());

        let mut opts = GenerateOptions::new("x");
        opts.size = MAX_PIXEL_SIZE;
        assert!(opts.validate().is_ok());
        opts.size = MAX_PIXEL_SIZE + 1;
        assert!(matches!(opts.validate(), Err(QrError::InvalidArgument(_))));

        let mut opts = GenerateOptions::new("x");
        opts.caption_size = Some(u32::MAX);
        assert!(matches!(opts.validate(), Err(QrError::InvalidArgument(_))));
    }
}
