//! Screens, their messages, and the loop that drives them.

pub mod chooser;
pub mod compressor;
pub mod converter;
pub mod effect;
pub mod runtime;

pub use chooser::{Choice, Chooser, Msg};
pub use compressor::{CompressionResult, CompressorMsg, CompressorScreen};
pub use converter::{ConverterMsg, ConverterScreen, UploadedImage};
pub use effect::{Download, Effect, SelectedFile};
pub use runtime::{DirectoryServices, MemoryServices, Runtime, Services};

/// Attribution line shown under every screen.
pub const FOOTER: &str = "© 2024 Image Converter. All Rights Reserved | Managed by Webkuu";
