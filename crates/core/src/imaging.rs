//! Upload validation, optional recompression and transport encoding for
//! submitted images.
//!
//! Validation failures map straight to client-facing [`ErrorCode`]s.
//! Compression is best effort: [`prepare_for_transport`] falls back to the
//! original bytes whenever re-encoding fails.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use crate::error_code::ErrorCode;

/// Accepted `Content-Type` values for uploads.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// Accepted file extensions for uploads (compared case-insensitively).
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png"];

/// Recompression settings applied before an image is queued.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionConfig {
    pub enabled: bool,
    /// JPEG quality, 1..=100.
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    /// Images smaller than this are queued untouched.
    pub min_bytes: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: 85,
            max_width: 1920,
            max_height: 1920,
            min_bytes: 1024 * 1024,
        }
    }
}

/// An uploaded file as received from the multipart form.
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub file_name: &'a str,
    pub content_type: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// Check that an upload is a non-empty, size-bounded JPEG or PNG that
/// actually decodes.
pub fn validate_upload(upload: &Upload<'_>, max_bytes: usize) -> Result<(), ErrorCode> {
    if upload.bytes.is_empty() {
        return Err(ErrorCode::EmptyFile);
    }
    if upload.bytes.len() > max_bytes {
        return Err(ErrorCode::FileTooLarge);
    }

    let content_type_ok = upload
        .content_type
        .map(|ct| ALLOWED_CONTENT_TYPES.contains(&ct.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    let extension = upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !content_type_ok || !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ErrorCode::FileFormatNotSupported);
    }

    image::load_from_memory(upload.bytes).map_err(|_| ErrorCode::FileFormatNotSupported)?;
    Ok(())
}

/// Resize to fit the configured bounding box (never upscaling) and
/// re-encode as JPEG.
///
/// Returns the input unchanged when it is below `min_bytes`.
pub fn compress(original: &[u8], config: &CompressionConfig) -> Result<Vec<u8>, image::ImageError> {
    if original.len() < config.min_bytes {
        return Ok(original.to_vec());
    }

    let mut img = image::load_from_memory(original)?;
    if img.width() > config.max_width || img.height() > config.max_height {
        img = img.resize(config.max_width, config.max_height, FilterType::Triangle);
    }

    let rgb = img.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, config.quality.clamp(1, 100));
        encoder.encode_image(&rgb)?;
    }
    let compressed = out.into_inner();

    tracing::debug!(
        original_bytes = original.len(),
        compressed_bytes = compressed.len(),
        ratio_percent = compressed.len() * 100 / original.len(),
        "Image compressed",
    );
    Ok(compressed)
}

/// Apply compression when enabled and encode the result for the queue.
///
/// Compression errors are logged and the original bytes are used.
pub fn prepare_for_transport(original: &[u8], config: &CompressionConfig) -> String {
    if !config.enabled {
        return encode_base64(original);
    }
    match compress(original, config) {
        Ok(bytes) => encode_base64(&bytes),
        Err(e) => {
            tracing::warn!(error = %e, "Image compression failed, using original bytes");
            encode_base64(original)
        }
    }
}

/// Standard-alphabet base64 with padding.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use image::{DynamicImage, ImageFormat, RgbImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
        }));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn upload<'a>(name: &'a str, ct: &'a str, bytes: &'a [u8]) -> Upload<'a> {
        Upload {
            file_name: name,
            content_type: Some(ct),
            bytes,
        }
    }

    #[test]
    fn accepts_valid_png() {
        let bytes = png_bytes(8, 8);
        assert_matches!(validate_upload(&upload("cat.PNG", "image/png", &bytes), 1 << 20), Ok(()));
    }

    #[test]
    fn rejects_empty_file() {
        assert_matches!(
            validate_upload(&upload("cat.png", "image/png", &[]), 1 << 20),
            Err(ErrorCode::EmptyFile)
        );
    }

    #[test]
    fn rejects_oversized_file() {
        let bytes = png_bytes(8, 8);
        assert_matches!(
            validate_upload(&upload("cat.png", "image/png", &bytes), 4),
            Err(ErrorCode::FileTooLarge)
        );
    }

    #[test]
    fn rejects_unknown_extension_or_content_type() {
        let bytes = png_bytes(8, 8);
        assert_matches!(
            validate_upload(&upload("cat.gif", "image/png", &bytes), 1 << 20),
            Err(ErrorCode::FileFormatNotSupported)
        );
        assert_matches!(
            validate_upload(&upload("cat.png", "text/plain", &bytes), 1 << 20),
            Err(ErrorCode::FileFormatNotSupported)
        );
        let no_ct = Upload {
            file_name: "cat.png",
            content_type: None,
            bytes: &bytes,
        };
        assert_matches!(validate_upload(&no_ct, 1 << 20), Err(ErrorCode::FileFormatNotSupported));
    }

    #[test]
    fn rejects_bytes_that_do_not_decode() {
        assert_matches!(
            validate_upload(&upload("cat.jpg", "image/jpeg", b"definitely not a jpeg"), 1 << 20),
            Err(ErrorCode::FileFormatNotSupported)
        );
    }

    #[test]
    fn small_images_skip_compression() {
        let bytes = png_bytes(4, 4);
        let config = CompressionConfig {
            min_bytes: bytes.len() + 1,
            ..CompressionConfig::default()
        };
        assert_eq!(compress(&bytes, &config).unwrap(), bytes);
    }

    #[test]
    fn large_images_are_resized_into_bounding_box() {
        let bytes = png_bytes(200, 100);
        let config = CompressionConfig {
            enabled: true,
            quality: 70,
            max_width: 50,
            max_height: 50,
            min_bytes: 0,
        };
        let out = compress(&bytes, &config).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 50);
        assert_eq!(decoded.height(), 25);
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn images_within_bounds_are_not_upscaled() {
        let bytes = png_bytes(20, 10);
        let config = CompressionConfig {
            min_bytes: 0,
            ..CompressionConfig::default()
        };
        let decoded = image::load_from_memory(&compress(&bytes, &config).unwrap()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 10));
    }

    #[test]
    fn compression_failure_falls_back_to_original() {
        let garbage = b"not an image at all";
        let config = CompressionConfig {
            min_bytes: 0,
            ..CompressionConfig::default()
        };
        assert_eq!(prepare_for_transport(garbage, &config), encode_base64(garbage));
    }

    #[test]
    fn disabled_compression_only_encodes() {
        let bytes = png_bytes(64, 64);
        let config = CompressionConfig {
            enabled: false,
            min_bytes: 0,
            ..CompressionConfig::default()
        };
        assert_eq!(prepare_for_transport(&bytes, &config), encode_base64(&bytes));
    }

    #[test]
    fn base64_uses_standard_alphabet() {
        assert_eq!(encode_base64(b"hi?"), "aGk/");
    }
}
