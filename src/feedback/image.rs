use crate::error::InputError;
use ::image::codecs::jpeg::JpegEncoder;
use ::image::imageops::FilterType;
use ::image::ImageReader;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::io::Cursor;
use tracing::{debug, info};

/// Longest side a frame may have when it reaches a provider
pub const MAX_IMAGE_DIMENSION: u32 = 1500;

const JPEG_QUALITY: u8 = 85;

/// A decoded frame screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

impl DecodedImage {
    /// Decode a standard-alphabet base64 image. `index` is the frame position,
    /// used only for error reporting.
    pub fn from_base64(encoded: &str, index: usize) -> Result<Self, InputError> {
        // Tolerate data URLs as sent by browser canvases
        let payload = match encoded.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|source| InputError::InvalidBase64 { index, source })?;
        if bytes.is_empty() {
            return Err(InputError::EmptyImage(index));
        }

        let media_type = sniff_media_type(&bytes);
        Self { bytes, media_type }.fit_within(MAX_IMAGE_DIMENSION, index)
    }

    /// Shrink the image so its longest side is at most `max_dim`, re-encoded
    /// as JPEG. Images already within bounds, and data whose header the image
    /// codecs cannot read, pass through unchanged.
    pub fn fit_within(self, max_dim: u32, index: usize) -> Result<Self, InputError> {
        let dimensions = ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());
        let (width, height) = match dimensions {
            Some(dimensions) => dimensions,
            None => {
                debug!("Frame {} header unreadable, passing through as-is", index);
                return Ok(self);
            }
        };
        if width.max(height) <= max_dim {
            return Ok(self);
        }

        let unreadable = |source: ::image::ImageError| InputError::UnreadableImage { index, source };
        let decoded = ::image::load_from_memory(&self.bytes).map_err(unreadable)?;
        let resized = decoded.resize(max_dim, max_dim, FilterType::Lanczos3);
        // JPEG has no alpha channel
        let rgb = resized.to_rgb8();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(unreadable)?;

        info!(
            "Downscaled frame {} from {}x{} to {}x{}",
            index,
            width,
            height,
            rgb.width(),
            rgb.height()
        );
        Ok(Self {
            bytes,
            media_type: "image/jpeg",
        })
    }

    pub fn extension(&self) -> &'static str {
        match self.media_type {
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

/// Identify the image format from its magic bytes. Unknown data is assumed to
/// be PNG, which is what design tools export by default.
fn sniff_media_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/png"
    }
}
