//! Converter screen: one held image that can be deleted, exported to PDF,
//! or re-encoded to another format.

use crate::app::effect::{ConverterTask, Download, Effect, SelectedFile, Ticket, Tickets};
use crate::codec;
use crate::config::Settings;
use crate::data_uri::DataUri;
use crate::error::Result;
use crate::format::{converted_file_name, TargetFormat};
use crate::pdf::{self, PageLayout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub data: DataUri,
    pub name: String,
}

#[derive(Debug)]
pub enum ConverterMsg {
    Upload(SelectedFile),
    FileRead { ticket: Ticket, image: UploadedImage },
    Delete,
    ExportPdf,
    Convert(TargetFormat),
    /// Several targets at once; the encodes may run in parallel.
    ConvertAll(Vec<TargetFormat>),
    Finished(Result<Download>),
}

#[derive(Debug)]
pub struct ConverterScreen {
    image: Option<UploadedImage>,
    pending_read: Option<Ticket>,
    tickets: Tickets,
    layout: PageLayout,
    pdf_file_name: String,
}

impl ConverterScreen {
    pub fn new(settings: &Settings) -> Self {
        Self {
            image: None,
            pending_read: None,
            tickets: Tickets::default(),
            layout: settings.pdf_layout,
            pdf_file_name: settings.pdf_file_name.clone(),
        }
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.image.as_ref()
    }

    pub fn is_reading(&self) -> bool {
        self.pending_read.is_some()
    }

    pub fn update(&mut self, msg: ConverterMsg) -> Vec<Effect> {
        match msg {
            ConverterMsg::Upload(file) => {
                let ticket = self.tickets.issue();
                log::debug!("converter: reading {} ({} bytes)", file.name, file.size());
                self.pending_read = Some(ticket);
                vec![Effect::Converter(ConverterTask::Read { ticket, file })]
            }
            ConverterMsg::FileRead { ticket, image } => {
                if self.pending_read != Some(ticket) {
                    log::debug!("converter: dropping stale read of {}", image.name);
                    return Vec::new();
                }
                self.pending_read = None;
                self.image = Some(image);
                Vec::new()
            }
            ConverterMsg::Delete => {
                self.image = None;
                self.pending_read = None;
                Vec::new()
            }
            ConverterMsg::ExportPdf => match &self.image {
                Some(image) => vec![Effect::Converter(ConverterTask::ExportPdf {
                    data: image.data.clone(),
                    name: image.name.clone(),
                    layout: self.layout,
                    file_name: self.pdf_file_name.clone(),
                })],
                None => Vec::new(),
            },
            ConverterMsg::Convert(target) => self.encode_tasks(&[target]),
            ConverterMsg::ConvertAll(targets) => self.encode_tasks(&targets),
            ConverterMsg::Finished(Ok(download)) => {
                log::info!(
                    "converter: {} ready ({} bytes)",
                    download.file_name,
                    download.bytes.len()
                );
                vec![Effect::Download(download)]
            }
            ConverterMsg::Finished(Err(e)) => {
                log::error!("converter: {}", e);
                vec![Effect::Alert(format!("Conversion failed: {}", e))]
            }
        }
    }

    fn encode_tasks(&self, targets: &[TargetFormat]) -> Vec<Effect> {
        let Some(image) = &self.image else {
            return Vec::new();
        };
        targets
            .iter()
            .map(|&target| {
                Effect::Converter(ConverterTask::Encode {
                    data: image.data.clone(),
                    name: image.name.clone(),
                    target,
                })
            })
            .collect()
    }
}

/// Runs a converter task to completion.
pub fn perform(task: ConverterTask) -> ConverterMsg {
    match task {
        ConverterTask::Read { ticket, file } => ConverterMsg::FileRead {
            ticket,
            image: UploadedImage {
                data: DataUri::from_bytes(&file.bytes),
                name: file.name,
            },
        },
        ConverterTask::Encode { data, name, target } => {
            ConverterMsg::Finished(encode(&data, &name, target))
        }
        ConverterTask::ExportPdf {
            data,
            name,
            layout,
            file_name,
        } => ConverterMsg::Finished(export(&data, &name, &layout, file_name)),
    }
}

fn encode(data: &DataUri, name: &str, target: TargetFormat) -> Result<Download> {
    let bytes = codec::convert(&data.decode()?, target)?;
    Ok(Download {
        file_name: converted_file_name(name, target),
        mime: target.mime_type().to_string(),
        bytes,
    })
}

fn export(data: &DataUri, name: &str, layout: &PageLayout, file_name: String) -> Result<Download> {
    let bytes = pdf::export_pdf(&data.decode()?, name, layout)?;
    Ok(Download {
        file_name,
        mime: "application/pdf".to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::sample_png;

    fn screen() -> ConverterScreen {
        ConverterScreen::new(&Settings::default())
    }

    /// Uploads and completes the read immediately.
    fn load(screen: &mut ConverterScreen, name: &str) {
        let mut effects = screen.update(ConverterMsg::Upload(SelectedFile::new(name, sample_png(12, 8))));
        let Some(Effect::Converter(task)) = effects.pop() else {
            panic!("expected a read task");
        };
        assert!(screen.update(perform(task)).is_empty());
    }

    fn run_single(screen: &mut ConverterScreen, msg: ConverterMsg) -> Vec<Effect> {
        let mut effects = screen.update(msg);
        assert_eq!(effects.len(), 1);
        match effects.pop().unwrap() {
            Effect::Converter(task) => screen.update(perform(task)),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn actions_without_image_are_noops() {
        let mut s = screen();
        assert!(s.update(ConverterMsg::Delete).is_empty());
        assert!(s.update(ConverterMsg::ExportPdf).is_empty());
        assert!(s.update(ConverterMsg::Convert(TargetFormat::Png)).is_empty());
        assert!(s.image().is_none());
    }

    #[test]
    fn upload_then_delete() {
        let mut s = screen();
        load(&mut s, "cat.png");
        assert_eq!(s.image().unwrap().name, "cat.png");
        assert_eq!(s.image().unwrap().data.mime(), "image/png");

        s.update(ConverterMsg::Delete);
        assert!(s.image().is_none());
        s.update(ConverterMsg::Delete);
        assert!(s.image().is_none());
    }

    #[test]
    fn convert_names_download_after_target() {
        let mut s = screen();
        load(&mut s, "cat.png");
        for target in [TargetFormat::Jpeg, TargetFormat::Jpg, TargetFormat::Png, TargetFormat::Webp] {
            let effects = run_single(&mut s, ConverterMsg::Convert(target));
            match effects.as_slice() {
                [Effect::Download(d)] => {
                    assert_eq!(d.file_name, format!("cat.{}", target.extension()));
                    assert_eq!(d.mime, target.mime_type());
                }
                other => panic!("unexpected effects {other:?}"),
            }
        }
    }

    #[test]
    fn pdf_export_uses_fixed_name() {
        let mut s = screen();
        load(&mut s, "dog.webp");
        let effects = run_single(&mut s, ConverterMsg::ExportPdf);
        match effects.as_slice() {
            [Effect::Download(d)] => {
                assert_eq!(d.file_name, "converted_image.pdf");
                assert!(d.bytes.starts_with(b"%PDF"));
            }
            other => panic!("unexpected effects {other:?}"),
        }
    }

    #[test]
    fn latest_upload_wins_when_reads_complete_out_of_order() {
        let mut s = screen();
        let mut first = s.update(ConverterMsg::Upload(SelectedFile::new("a.png", sample_png(4, 4))));
        let mut second = s.update(ConverterMsg::Upload(SelectedFile::new("b.png", sample_png(6, 6))));

        let (Some(Effect::Converter(a)), Some(Effect::Converter(b))) = (first.pop(), second.pop()) else {
            panic!("expected read tasks");
        };
        s.update(perform(b));
        s.update(perform(a));
        assert_eq!(s.image().unwrap().name, "b.png");
        assert!(!s.is_reading());
    }

    #[test]
    fn delete_discards_a_pending_read() {
        let mut s = screen();
        let mut effects = s.update(ConverterMsg::Upload(SelectedFile::new("a.png", sample_png(4, 4))));
        s.update(ConverterMsg::Delete);
        let Some(Effect::Converter(task)) = effects.pop() else {
            panic!("expected a read task");
        };
        s.update(perform(task));
        assert!(s.image().is_none());
    }

    #[test]
    fn undecodable_upload_alerts_on_convert() {
        let mut s = screen();
        let mut effects = s.update(ConverterMsg::Upload(SelectedFile::new("notes.txt", b"hello".to_vec())));
        let Some(Effect::Converter(task)) = effects.pop() else {
            panic!("expected a read task");
        };
        s.update(perform(task));
        let effects = run_single(&mut s, ConverterMsg::Convert(TargetFormat::Png));
        assert!(matches!(effects.as_slice(), [Effect::Alert(_)]));
    }
}
