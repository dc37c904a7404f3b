//! Decoding onto an off-screen surface and re-encoding to a target format.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::data_uri::DataUri;
use crate::error::{ConvertError, Result};
use crate::format::TargetFormat;

/// JPEG quality used when no explicit quality is given, matching the
/// default of a browser canvas encoder.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Decodes `bytes` into an RGBA surface covering the whole image.
pub fn decode_surface(bytes: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(bytes).map_err(ConvertError::Decode)?;
    Ok(DynamicImage::ImageRgba8(img.to_rgba8()))
}

/// Width and height of an encoded image, read from its header.
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ConvertError::Io)?;
    reader.into_dimensions().map_err(ConvertError::Decode)
}

/// Re-encodes the full surface to `target`.
pub fn encode_surface(surface: &DynamicImage, target: TargetFormat) -> Result<Vec<u8>> {
    match target {
        TargetFormat::Jpeg | TargetFormat::Jpg => encode_jpeg(surface, DEFAULT_JPEG_QUALITY),
        TargetFormat::Png => encode_raster(surface, ImageFormat::Png, "PNG"),
        TargetFormat::Webp => encode_raster(surface, ImageFormat::WebP, "WEBP"),
        TargetFormat::Svg => encode_svg(surface),
    }
}

/// Decodes `bytes` and re-encodes them to `target` in one go.
pub fn convert(bytes: &[u8], target: TargetFormat) -> Result<Vec<u8>> {
    let surface = decode_surface(bytes)?;
    encode_surface(&surface, target)
}

/// JPEG has no alpha channel; transparent pixels lose their alpha.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .encode_image(&rgb)
        .map_err(|source| ConvertError::Encode {
            format: "JPEG",
            source,
        })?;
    Ok(buffer)
}

fn encode_raster(img: &DynamicImage, format: ImageFormat, label: &'static str) -> Result<Vec<u8>> {
    let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
    let mut buffer = Vec::new();
    rgba.write_to(&mut Cursor::new(&mut buffer), format)
        .map_err(|source| ConvertError::Encode {
            format: label,
            source,
        })?;
    Ok(buffer)
}

/// SVG document sized to the image with the pixels embedded as a PNG.
fn encode_svg(img: &DynamicImage) -> Result<Vec<u8>> {
    let (w, h) = img.dimensions();
    let png = encode_raster(img, ImageFormat::Png, "SVG")?;
    let href = DataUri::with_mime("image/png", &png);
    let doc = format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            "  <image width=\"{w}\" height=\"{h}\" href=\"{href}\"/>\n",
            "</svg>\n"
        ),
        w = w,
        h = h,
        href = href
    );
    Ok(doc.into_bytes())
}
