use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ConvertError;

lazy_static! {
    /// Trailing extension of a file name: the last dot and what follows,
    /// provided it contains no further dot or slash.
    static ref EXTENSION: Regex = Regex::new(r"\.[^/.]+$").unwrap();
}

/// Formats the converter can re-encode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetFormat {
    Jpeg,
    Jpg,
    Png,
    Webp,
    /// Raster wrapped in an SVG document, not a vector trace.
    Svg,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 5] = [
        TargetFormat::Jpeg,
        TargetFormat::Jpg,
        TargetFormat::Png,
        TargetFormat::Webp,
        TargetFormat::Svg,
    ];

    /// Upper-case label used on the convert buttons.
    pub fn label(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Jpg => "JPG",
            TargetFormat::Png => "PNG",
            TargetFormat::Webp => "WEBP",
            TargetFormat::Svg => "SVG",
        }
    }

    /// Extension written on the downloaded file. JPEG and JPG stay distinct.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Jpg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg | TargetFormat::Jpg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::Webp => "image/webp",
            TargetFormat::Svg => "image/svg+xml",
        }
    }

    /// Raster codec backing this target. SVG embeds a PNG.
    pub fn raster_format(&self) -> image::ImageFormat {
        match self {
            TargetFormat::Jpeg | TargetFormat::Jpg => image::ImageFormat::Jpeg,
            TargetFormat::Png | TargetFormat::Svg => image::ImageFormat::Png,
            TargetFormat::Webp => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.');
        TargetFormat::ALL
            .into_iter()
            .find(|f| f.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConvertError::UnsupportedFormat(s.to_string()))
    }
}

/// Swaps the extension of `name` for `extension`. Names without an
/// extension come back unchanged.
pub fn replace_extension(name: &str, extension: &str) -> String {
    EXTENSION
        .replace(name, format!(".{}", extension).as_str())
        .into_owned()
}

/// Download name for `name` converted to `target`.
pub fn converted_file_name(name: &str, target: TargetFormat) -> String {
    replace_extension(name, target.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("png".parse::<TargetFormat>().unwrap(), TargetFormat::Png);
        assert_eq!("JPG".parse::<TargetFormat>().unwrap(), TargetFormat::Jpg);
        assert_eq!(".webp".parse::<TargetFormat>().unwrap(), TargetFormat::Webp);
        assert!(matches!(
            "tiff".parse::<TargetFormat>(),
            Err(ConvertError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn swaps_only_the_last_extension() {
        assert_eq!(
            converted_file_name("holiday.photo.png", TargetFormat::Jpeg),
            "holiday.photo.jpeg"
        );
        assert_eq!(converted_file_name("cat.PNG", TargetFormat::Webp), "cat.webp");
    }

    #[test]
    fn names_without_extension_are_kept() {
        assert_eq!(converted_file_name("README", TargetFormat::Png), "README");
        assert_eq!(
            converted_file_name("dir.d/README", TargetFormat::Png),
            "dir.d/README"
        );
    }
}
