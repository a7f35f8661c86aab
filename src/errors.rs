use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("Clipboard initialization failed: {0}")]
    ClipboardInitError(String),

    #[error("Clipboard write failed: {0}")]
    ClipboardWriteError(String),

    #[error("Image load failed: {0}")]
    ImageLoadError(String),

    #[error("Rasterization failed: {0}")]
    RasterizeError(String),

    #[error("Image encoding failed: {0}")]
    EncodeError(String),

    #[error("File operation error: {0}")]
    FileError(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Entry already exists: {0}")]
    DuplicateEntry(String),

    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl From<std::io::Error> for ShareError {
    fn from(err: std::io::Error) -> Self {
        ShareError::IoError(err.to_string())
    }
}

impl From<image::ImageError> for ShareError {
    fn from(err: image::ImageError) -> Self {
        ShareError::EncodeError(err.to_string())
    }
}

impl From<serde_json::Error> for ShareError {
    fn from(err: serde_json::Error) -> Self {
        ShareError::ConfigError(err.to_string())
    }
}
