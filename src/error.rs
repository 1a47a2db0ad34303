use std::path::PathBuf;

use crate::qrcode::DataTooLong;

pub type QrResult<T> = Result<T, QrError>;

#[derive(thiserror::Error, Debug)]
pub enum QrError {
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(#[from] DataTooLong),

    #[error("image too small: {0}")]
    ImageTooSmall(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("file exists: {} (use --force to overwrite)", .0.display())]
    FileExists(PathBuf),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QrError {
    pub fn image_too_small(msg: impl Into<String>) -> Self {
        Self::ImageTooSmall(msg.into())
    }

    pub fn asset_not_found(msg: impl Into<String>) -> Self {
        Self::AssetNotFound(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Process exit status for this error: 2 for bad input, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}
