pub mod app;
pub mod blob;
pub mod codec;
pub mod compress;
pub mod config;
pub mod data_uri;
pub mod error;
pub mod format;
pub mod pdf;

use wasm_bindgen::prelude::*;

use crate::compress::{CompressOptions, Compressor, JpegCompressor};
use crate::format::TargetFormat;
use crate::pdf::PageLayout;

pub use crate::error::{ConvertError, Result};

fn js_error(e: ConvertError) -> JsError {
    JsError::new(&e.to_string())
}

/// Installs the console logger (and the panic hook when that feature is on).
#[wasm_bindgen]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("logger already installed");
    }
}

/// Labels of the formats `convert_image` accepts.
#[wasm_bindgen]
pub fn supported_formats() -> js_sys::Array {
    TargetFormat::ALL
        .iter()
        .map(|f| JsValue::from_str(f.label()))
        .collect()
}

/// Re-encodes `input` to `format` (JPEG, JPG, PNG, WEBP or SVG).
#[wasm_bindgen]
pub fn convert_image(input: &[u8], format: &str) -> std::result::Result<Vec<u8>, JsError> {
    let target: TargetFormat = format.parse().map_err(js_error)?;
    codec::convert(input, target).map_err(js_error)
}

/// File name a conversion of `name` to `format` downloads under.
#[wasm_bindgen]
pub fn download_name(name: &str, format: &str) -> std::result::Result<String, JsError> {
    let target: TargetFormat = format.parse().map_err(js_error)?;
    Ok(crate::format::converted_file_name(name, target))
}

/// One-page PDF with `name` as its label and the image below it.
#[wasm_bindgen]
pub fn image_to_pdf(input: &[u8], name: &str) -> std::result::Result<Vec<u8>, JsError> {
    pdf::export_pdf(input, name, &PageLayout::default()).map_err(js_error)
}

/// Recompresses `input` as JPEG at `quality` (0.1 to 1.0), keeping its size.
#[wasm_bindgen]
pub fn compress_image(input: &[u8], quality: f32) -> std::result::Result<Vec<u8>, JsError> {
    let options = CompressOptions {
        quality,
        width: None,
        height: None,
    };
    JpegCompressor
        .compress(input, &options)
        .map(|c| c.bytes)
        .map_err(js_error)
}
