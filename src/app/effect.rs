use std::path::Path;
use std::time::Duration;

use crate::compress::CompressOptions;
use crate::data_uri::DataUri;
use crate::error::{ConvertError, Result};
use crate::format::TargetFormat;
use crate::pdf::PageLayout;

/// Identifies one async request so its completion can be matched against
/// the latest request a screen issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Hands out increasing tickets.
#[derive(Debug, Default)]
pub struct Tickets {
    last: u64,
}

impl Tickets {
    pub fn issue(&mut self) -> Ticket {
        self.last += 1;
        Ticket(self.last)
    }
}

/// A file as delivered by the picker: its name and full contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ConvertError::Read {
                name: path.display().to_string(),
                reason: "path has no file name".into(),
            })?;
        let bytes = std::fs::read(path).map_err(|e| ConvertError::Read {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A file the host should save for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Work requested by the converter screen.
#[derive(Debug)]
pub enum ConverterTask {
    /// Read the file into a data URI.
    Read { ticket: Ticket, file: SelectedFile },
    Encode {
        data: DataUri,
        name: String,
        target: TargetFormat,
    },
    ExportPdf {
        data: DataUri,
        name: String,
        layout: PageLayout,
        file_name: String,
    },
}

/// Work requested by the compressor screen.
#[derive(Debug)]
pub enum CompressorTask {
    Compress {
        ticket: Ticket,
        input: Vec<u8>,
        options: CompressOptions,
    },
    /// Fire `Reveal` for `ticket` once `after` has elapsed.
    Reveal { ticket: Ticket, after: Duration },
}

/// Side effect returned by an update, executed by the runtime.
#[derive(Debug)]
pub enum Effect {
    Converter(ConverterTask),
    Compressor(CompressorTask),
    Download(Download),
    /// Blocking message box.
    Alert(String),
}
