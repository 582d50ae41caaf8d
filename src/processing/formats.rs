//! Image format detection and encoding

use std::io::Cursor;
use std::path::Path;

use crate::config::ImageFormat;
use crate::error::{FastConvertError, Result};

/// Check whether a file extension is a supported input format
pub fn is_supported_input_format(extension: &str) -> bool {
    matches!(
        extension.to_lowercase().as_str(),
        "jpg" | "jpeg" | "png" | "webp" | "gif" | "tiff" | "tif" | "bmp"
    )
}

/// Detect image format from file extension
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<ImageFormat> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            FastConvertError::unsupported_format("Unknown".to_string(), Some(path.to_path_buf()))
        })?;

    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "webp" => Ok(ImageFormat::WebP),
        "gif" => Ok(ImageFormat::Gif),
        "tiff" | "tif" => Ok(ImageFormat::Tiff),
        "bmp" => Ok(ImageFormat::Bmp),
        _ => Err(FastConvertError::unsupported_format(
            extension.to_string(),
            Some(path.to_path_buf()),
        )),
    }
}

/// Detect image format from file content (magic bytes), falling back to the
/// file extension when sniffing is inconclusive
pub fn detect_format(data: &[u8], path: &Path) -> Result<ImageFormat> {
    if let Some(kind) = infer::get(data) {
        match kind.mime_type() {
            "image/jpeg" => return Ok(ImageFormat::Jpeg),
            "image/png" => return Ok(ImageFormat::Png),
            "image/webp" => return Ok(ImageFormat::WebP),
            "image/gif" => return Ok(ImageFormat::Gif),
            "image/tiff" => return Ok(ImageFormat::Tiff),
            "image/bmp" => return Ok(ImageFormat::Bmp),
            other if other.starts_with("image/") => {
                return Err(FastConvertError::unsupported_format(
                    other.to_string(),
                    Some(path.to_path_buf()),
                ));
            }
            _ => {}
        }
    }

    detect_format_from_path(path)
}

/// Encode an image to `format` at the requested quality.
///
/// Quality applies to JPEG; the remaining formats encode lossless or with
/// their codec defaults.
pub fn encode_image(
    image: &image::DynamicImage,
    format: ImageFormat,
    quality: u8,
) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
            encoder.encode_image(&rgb)?;
        }
        ImageFormat::Png => {
            image.write_to(&mut cursor, image::ImageOutputFormat::Png)?;
        }
        ImageFormat::WebP => {
            let rgba = image.to_rgba8();
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut cursor);
            encoder.encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                image::ColorType::Rgba8,
            )?;
        }
        ImageFormat::Gif => {
            image.write_to(&mut cursor, image::ImageOutputFormat::Gif)?;
        }
        ImageFormat::Tiff => {
            image.write_to(&mut cursor, image::ImageOutputFormat::Tiff)?;
        }
        ImageFormat::Bmp => {
            image.write_to(&mut cursor, image::ImageOutputFormat::Bmp)?;
        }
    }

    Ok(cursor.into_inner())
}
