use thiserror::Error;

/// Every error the converter and compressor can produce.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// An action that needs a held image ran with none.
    #[error("no image selected")]
    NoImage,

    #[error("unsupported target format: {0}")]
    UnsupportedFormat(String),

    /// The selected file could not be read into memory.
    #[error("failed to read {name}: {reason}")]
    Read { name: String, reason: String },

    #[error("malformed data URI: {0}")]
    DataUri(String),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("PDF generation failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
