//! Compressor screen: one held image, a quality setting, and a history of
//! every compression made during the session.

use std::time::Duration;

use crate::app::effect::{CompressorTask, Download, Effect, SelectedFile, Ticket, Tickets};
use crate::blob::{BlobStore, ObjectUrl};
use crate::codec;
use crate::compress::{normalize_quality, CompressOptions, CompressedImage, Compressor};
use crate::config::Settings;
use crate::error::Result;
use crate::format::replace_extension;

pub const NO_IMAGE_ALERT: &str = "Please upload an image first.";
pub const FAILURE_ALERT: &str = "Image compression failed. Please try again.";

pub const HELP_LINES: &[&str] = &[
    "Upload an image using the \"Upload a file\" button.",
    "Adjust the compression quality using the slider.",
    "Press the \"Compress\" button to start the compression.",
    "Download the compressed image using the \"Download\" button.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionResult {
    pub link: ObjectUrl,
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug)]
struct Original {
    bytes: Vec<u8>,
    link: ObjectUrl,
    size_bytes: u64,
    dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone)]
struct Compressed {
    link: ObjectUrl,
    size_bytes: u64,
}

#[derive(Debug)]
pub enum CompressorMsg {
    Upload(SelectedFile),
    SetQuality(f32),
    Compress,
    Compressed {
        ticket: Ticket,
        result: Result<CompressedImage>,
    },
    Reveal(Ticket),
    Reset,
    ToggleHelp,
    ToggleHistory,
    DownloadCompressed,
    DownloadHistory(usize),
}

#[derive(Debug)]
pub struct CompressorScreen {
    blobs: BlobStore,
    original: Option<Original>,
    output_name: String,
    quality: f32,
    compressed: Option<Compressed>,
    history: Vec<CompressionResult>,
    in_progress: bool,
    loading: bool,
    show_compressed: bool,
    show_help: bool,
    show_history: bool,
    pending: Option<Ticket>,
    pending_reveal: Option<Ticket>,
    tickets: Tickets,
    default_quality: f32,
    reveal_delay: Duration,
}

impl CompressorScreen {
    pub fn new(settings: &Settings) -> Self {
        Self {
            blobs: BlobStore::new(),
            original: None,
            output_name: String::new(),
            quality: settings.default_quality,
            compressed: None,
            history: Vec::new(),
            in_progress: false,
            loading: false,
            show_compressed: false,
            show_help: false,
            show_history: false,
            pending: None,
            pending_reveal: None,
            tickets: Tickets::default(),
            default_quality: settings.default_quality,
            reveal_delay: settings.reveal_delay,
        }
    }

    pub fn has_image(&self) -> bool {
        self.original.is_some()
    }

    pub fn original_link(&self) -> Option<&ObjectUrl> {
        self.original.as_ref().map(|o| &o.link)
    }

    pub fn original_size(&self) -> u64 {
        self.original.as_ref().map_or(0, |o| o.size_bytes)
    }

    pub fn compressed_link(&self) -> Option<&ObjectUrl> {
        self.compressed.as_ref().map(|c| &c.link)
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed.as_ref().map_or(0, |c| c.size_bytes)
    }

    /// Sizes as shown next to the slider, rounded to whole KB.
    pub fn original_size_kb(&self) -> u64 {
        to_kb(self.original_size())
    }

    pub fn compressed_size_kb(&self) -> u64 {
        to_kb(self.compressed_size())
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed.is_some()
    }

    pub fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the compressed preview and its download link are shown.
    pub fn shows_compressed(&self) -> bool {
        self.show_compressed
    }

    pub fn help(&self) -> Option<&'static [&'static str]> {
        self.show_help.then_some(HELP_LINES)
    }

    pub fn shows_history(&self) -> bool {
        self.show_history
    }

    pub fn history(&self) -> &[CompressionResult] {
        &self.history
    }

    pub fn status(&self) -> Option<&'static str> {
        if self.in_progress {
            Some("Compressing image...")
        } else if self.is_compressed() {
            Some("Image compressed successfully!")
        } else {
            None
        }
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn update(&mut self, msg: CompressorMsg) -> Vec<Effect> {
        match msg {
            CompressorMsg::Upload(file) => {
                self.upload(file);
                Vec::new()
            }
            CompressorMsg::SetQuality(q) => {
                match normalize_quality(q) {
                    Some(q) => self.quality = q,
                    None => log::warn!("compressor: ignoring quality {}", q),
                }
                Vec::new()
            }
            CompressorMsg::Compress => self.compress(),
            CompressorMsg::Compressed { ticket, result } => self.finish(ticket, result),
            CompressorMsg::Reveal(ticket) => {
                if self.pending_reveal == Some(ticket) {
                    self.pending_reveal = None;
                    self.loading = false;
                    self.show_compressed = true;
                }
                Vec::new()
            }
            CompressorMsg::Reset => {
                self.reset();
                Vec::new()
            }
            CompressorMsg::ToggleHelp => {
                self.show_help = !self.show_help;
                Vec::new()
            }
            CompressorMsg::ToggleHistory => {
                self.show_history = !self.show_history;
                Vec::new()
            }
            CompressorMsg::DownloadCompressed => {
                let Some(compressed) = &self.compressed else {
                    return Vec::new();
                };
                self.download(&compressed.link, &self.output_name)
                    .into_iter()
                    .collect()
            }
            CompressorMsg::DownloadHistory(index) => match self.history.get(index) {
                Some(entry) => self.download(&entry.link, &entry.name).into_iter().collect(),
                None => Vec::new(),
            },
        }
    }

    fn upload(&mut self, file: SelectedFile) {
        if let Some(previous) = self.original.take() {
            self.blobs.revoke(&previous.link);
        }
        let mime = image::guess_format(&file.bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        let link = self.blobs.create(mime, file.bytes.clone());
        let dimensions = codec::dimensions(&file.bytes).ok();
        log::debug!(
            "compressor: holding {} ({} bytes, {:?})",
            file.name,
            file.size(),
            dimensions
        );

        self.output_name = output_name_for(&file.name);
        self.original = Some(Original {
            size_bytes: file.size(),
            bytes: file.bytes,
            link,
            dimensions,
        });
        self.clear_result();
    }

    fn compress(&mut self) -> Vec<Effect> {
        let Some(original) = &self.original else {
            return vec![Effect::Alert(NO_IMAGE_ALERT.to_string())];
        };
        let input = original.bytes.clone();
        let options = CompressOptions {
            quality: self.quality,
            width: original.dimensions.map(|(w, _)| w),
            height: original.dimensions.map(|(_, h)| h),
        };

        let ticket = self.tickets.issue();
        self.pending = Some(ticket);
        self.pending_reveal = None;
        self.in_progress = true;
        self.show_compressed = false;
        self.loading = true;
        vec![Effect::Compressor(CompressorTask::Compress {
            ticket,
            input,
            options,
        })]
    }

    fn finish(&mut self, ticket: Ticket, result: Result<CompressedImage>) -> Vec<Effect> {
        if self.pending != Some(ticket) {
            log::debug!("compressor: dropping stale result");
            return Vec::new();
        }
        self.pending = None;
        self.in_progress = false;

        match result {
            Ok(image) => {
                let size_bytes = image.size();
                let link = self.blobs.create(image.mime, image.bytes);
                log::info!(
                    "compressor: {} -> {} bytes at quality {:.1}",
                    self.original_size(),
                    size_bytes,
                    self.quality
                );
                self.history.push(CompressionResult {
                    link: link.clone(),
                    name: self.output_name.clone(),
                    size_bytes,
                });
                self.compressed = Some(Compressed { link, size_bytes });
                self.pending_reveal = Some(ticket);
                vec![Effect::Compressor(CompressorTask::Reveal {
                    ticket,
                    after: self.reveal_delay,
                })]
            }
            Err(e) => {
                log::error!("compressor: image compression failed: {}", e);
                self.loading = false;
                vec![Effect::Alert(FAILURE_ALERT.to_string())]
            }
        }
    }

    /// Clears the active image and result. History and panel toggles stay.
    fn reset(&mut self) {
        if let Some(original) = self.original.take() {
            self.blobs.revoke(&original.link);
        }
        self.output_name.clear();
        self.quality = self.default_quality;
        self.clear_result();
    }

    fn clear_result(&mut self) {
        // The result's blob stays alive; history links to it.
        self.compressed = None;
        self.show_compressed = false;
        self.in_progress = false;
        self.loading = false;
        self.pending = None;
        self.pending_reveal = None;
    }

    fn download(&self, link: &ObjectUrl, name: &str) -> Option<Effect> {
        let bytes = self.blobs.get(link)?;
        Some(Effect::Download(Download {
            file_name: name.to_string(),
            mime: self.blobs.mime(link).unwrap_or("image/jpeg").to_string(),
            bytes: bytes.to_vec(),
        }))
    }
}

/// Runs a compression request through `compressor`.
pub fn perform(
    ticket: Ticket,
    input: &[u8],
    options: &CompressOptions,
    compressor: &dyn Compressor,
) -> CompressorMsg {
    CompressorMsg::Compressed {
        ticket,
        result: compressor.compress(input, options),
    }
}

/// Compressed output is JPEG; the name follows.
fn output_name_for(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        return name.to_string();
    }
    let renamed = replace_extension(name, "jpg");
    if renamed == name {
        format!("{}.jpg", name)
    } else {
        renamed
    }
}

fn to_kb(bytes: u64) -> u64 {
    (bytes as f64 / 1024.0).round() as u64
}
