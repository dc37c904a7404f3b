//! Quality-driven recompression.

use image::imageops::FilterType;
use image::GenericImageView;

use crate::codec;
use crate::error::{ConvertError, Result};

pub const MIN_QUALITY: f32 = 0.1;
pub const MAX_QUALITY: f32 = 1.0;
pub const DEFAULT_QUALITY: f32 = 0.8;
pub const QUALITY_STEP: f32 = 0.1;

/// Clamps into [0.1, 1.0] and snaps to the 0.1 slider step. `None` for
/// non-finite input.
pub fn normalize_quality(quality: f32) -> Option<f32> {
    if !quality.is_finite() {
        return None;
    }
    let clamped = quality.clamp(MIN_QUALITY, MAX_QUALITY);
    Some((clamped / QUALITY_STEP).round() * QUALITY_STEP)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressOptions {
    /// 0.1 to 1.0.
    pub quality: f32,
    /// Target size; `None` keeps the source dimension.
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl CompressedImage {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Routine the compressor screen hands its image to.
pub trait Compressor {
    fn compress(&self, input: &[u8], options: &CompressOptions) -> Result<CompressedImage>;
}

/// Re-encodes as JPEG at the requested quality. Resizes only when the
/// requested dimensions differ from the source.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegCompressor;

impl Compressor for JpegCompressor {
    fn compress(&self, input: &[u8], options: &CompressOptions) -> Result<CompressedImage> {
        let quality = normalize_quality(options.quality)
            .ok_or_else(|| ConvertError::Compression(format!("invalid quality {}", options.quality)))?;
        if options.width == Some(0) || options.height == Some(0) {
            return Err(ConvertError::Compression("zero target dimension".into()));
        }

        let img = image::load_from_memory(input).map_err(ConvertError::Decode)?;
        let (w, h) = img.dimensions();
        let target = (options.width.unwrap_or(w), options.height.unwrap_or(h));
        let img = if target != (w, h) {
            log::debug!("resize {}x{} -> {}x{}", w, h, target.0, target.1);
            img.resize_exact(target.0, target.1, FilterType::Lanczos3)
        } else {
            img
        };

        let jpeg_quality = (quality * 100.0).round() as u8;
        let bytes = codec::encode_jpeg(&img, jpeg_quality)?;
        log::debug!(
            "compressed {} -> {} bytes at JPEG(q={})",
            input.len(),
            bytes.len(),
            jpeg_quality
        );
        Ok(CompressedImage {
            bytes,
            mime: "image/jpeg",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::sample_png;

    #[test]
    fn normalize_snaps_and_clamps() {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-6;
        assert!(close(normalize_quality(0.0).unwrap(), MIN_QUALITY));
        assert!(close(normalize_quality(7.0).unwrap(), MAX_QUALITY));
        assert!(close(normalize_quality(0.74).unwrap(), 0.7));
        assert_eq!(normalize_quality(f32::NAN), None);
    }

    #[test]
    fn lower_quality_is_never_larger() {
        let png = sample_png(96, 96);
        let opts = |quality| CompressOptions {
            quality,
            width: Some(96),
            height: Some(96),
        };
        let high = JpegCompressor.compress(&png, &opts(1.0)).unwrap();
        let low = JpegCompressor.compress(&png, &opts(0.1)).unwrap();
        assert!(low.size() <= high.size());
        assert_eq!(low.mime, "image/jpeg");
    }

    #[test]
    fn source_dimensions_mean_no_resize() {
        let png = sample_png(40, 30);
        let out = JpegCompressor
            .compress(
                &png,
                &CompressOptions {
                    quality: DEFAULT_QUALITY,
                    width: Some(40),
                    height: Some(30),
                },
            )
            .unwrap();
        assert_eq!(codec::dimensions(&out.bytes).unwrap(), (40, 30));
    }

    #[test]
    fn rejects_garbage() {
        let opts = CompressOptions {
            quality: 0.5,
            width: None,
            height: None,
        };
        assert!(JpegCompressor.compress(b"junk", &opts).is_err());
    }
}
