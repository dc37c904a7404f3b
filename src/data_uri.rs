//! Base64 data URIs, the in-memory form a read file is held in.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{ConvertError, Result};

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime: String,
    payload: String,
}

impl DataUri {
    /// Encodes `bytes`, sniffing the MIME type from the image header.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mime = image::guess_format(bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or(FALLBACK_MIME);
        Self::with_mime(mime, bytes)
    }

    pub fn with_mime(mime: &str, bytes: &[u8]) -> Self {
        Self {
            mime: mime.to_string(),
            payload: STANDARD.encode(bytes),
        }
    }

    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| ConvertError::DataUri("missing data: scheme".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ConvertError::DataUri("missing ',' separator".into()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| ConvertError::DataUri("only base64 payloads are supported".into()))?;
        Ok(Self {
            mime: if mime.is_empty() { FALLBACK_MIME } else { mime }.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.payload.as_bytes())
            .map_err(|e| ConvertError::DataUri(e.to_string()))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png_mime() {
        let mut png = Vec::new();
        image::RgbImage::new(2, 2)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let uri = DataUri::from_bytes(&png);
        assert_eq!(uri.mime(), "image/png");
        assert!(uri.to_string().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn parse_rejects_non_base64_payloads() {
        assert!(DataUri::parse("data:text/plain,hello").is_err());
        assert!(DataUri::parse("blob:abc").is_err());
    }

    #[test]
    fn parsed_uri_decodes_to_original_bytes() {
        let uri = DataUri::parse("data:;base64,aGVsbG8=").unwrap();
        assert_eq!(uri.mime(), FALLBACK_MIME);
        assert_eq!(uri.decode().unwrap(), b"hello");
    }
}
