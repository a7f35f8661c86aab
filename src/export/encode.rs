use crate::errors::ShareError;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use tracing::debug;

pub const PNG_MIME: &str = "image/png";

/// An encoded PNG ready for the clipboard or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngPayload {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PngPayload {
    pub fn mime(&self) -> &'static str {
        PNG_MIME
    }
}

pub fn encode_png(bitmap: &RgbaImage) -> Result<PngPayload, ShareError> {
    let (width, height) = bitmap.dimensions();
    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, CompressionType::Best, FilterType::Adaptive)
        .write_image(bitmap.as_raw(), width, height, ExtendedColorType::Rgba8)?;

    if bytes.is_empty() {
        return Err(ShareError::EncodeError("encoder produced no payload".to_string()));
    }
    debug!("Encoded {}x{} PNG ({} bytes)", width, height, bytes.len());
    Ok(PngPayload {
        bytes,
        width,
        height,
    })
}
