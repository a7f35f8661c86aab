use crate::errors::ShareError;
use crate::export::encode::PngPayload;
use arboard::{Clipboard, ImageData};
use async_trait::async_trait;
use image::ImageFormat;
use std::borrow::Cow;
use tracing::{debug, trace};

#[async_trait]
pub trait ClipboardSink: Send + Sync {
    /// Places an `image/png` payload on the clipboard.
    async fn write_image(&self, payload: &PngPayload) -> Result<(), ShareError>;

    async fn write_text(&self, text: &str) -> Result<(), ShareError>;
}

/// The operating system clipboard.
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        SystemClipboard
    }
}

#[async_trait]
impl ClipboardSink for SystemClipboard {
    async fn write_image(&self, payload: &PngPayload) -> Result<(), ShareError> {
        let bytes = payload.bytes.clone();
        tokio::task::spawn_blocking(move || {
            // arboard takes raw RGBA pixels, not the encoded PNG
            let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
                .map_err(|e| ShareError::ClipboardWriteError(e.to_string()))?
                .to_rgba8();
            trace!(
                "Decoded clipboard image {}x{}",
                decoded.width(),
                decoded.height()
            );

            let mut clipboard =
                Clipboard::new().map_err(|e| ShareError::ClipboardInitError(e.to_string()))?;
            clipboard
                .set_image(ImageData {
                    width: decoded.width() as usize,
                    height: decoded.height() as usize,
                    bytes: Cow::Owned(decoded.into_raw()),
                })
                .map_err(|e| ShareError::ClipboardWriteError(e.to_string()))?;
            debug!("Image written to clipboard");
            Ok::<(), ShareError>(())
        })
        .await
        .map_err(|e| ShareError::ClipboardWriteError(e.to_string()))?
    }

    async fn write_text(&self, text: &str) -> Result<(), ShareError> {
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || {
            let mut clipboard =
                Clipboard::new().map_err(|e| ShareError::ClipboardInitError(e.to_string()))?;
            clipboard
                .set_text(text)
                .map_err(|e| ShareError::ClipboardWriteError(e.to_string()))?;
            debug!("Text written to clipboard");
            Ok::<(), ShareError>(())
        })
        .await
        .map_err(|e| ShareError::ClipboardWriteError(e.to_string()))?
    }
}
