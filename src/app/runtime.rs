//! Ordered message loop. Every state change, whether from the user or from a
//! finished task, goes through one FIFO queue.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;

use crate::app::chooser::{Chooser, Envelope, Msg};
use crate::app::compressor::{self, CompressorMsg};
use crate::app::converter::{self, ConverterMsg};
use crate::app::effect::{CompressorTask, Download, Effect};
use crate::compress::{Compressor, JpegCompressor};
use crate::config::Settings;
use crate::error::Result;

/// What the host provides: the compression routine, somewhere to save
/// downloads, and a way to show alerts.
pub trait Services {
    fn compressor(&self) -> &dyn Compressor;
    fn save(&mut self, download: Download) -> Result<()>;
    fn alert(&mut self, message: &str);
}

/// Keeps downloads and alerts in memory.
#[derive(Debug, Default)]
pub struct MemoryServices<C = JpegCompressor> {
    pub compressor: C,
    pub downloads: Vec<Download>,
    pub alerts: Vec<String>,
}

impl<C: Compressor> MemoryServices<C> {
    pub fn with_compressor(compressor: C) -> Self {
        Self {
            compressor,
            downloads: Vec::new(),
            alerts: Vec::new(),
        }
    }
}

impl<C: Compressor> Services for MemoryServices<C> {
    fn compressor(&self) -> &dyn Compressor {
        &self.compressor
    }

    fn save(&mut self, download: Download) -> Result<()> {
        self.downloads.push(download);
        Ok(())
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

/// Writes downloads into a directory. Saving the same name twice overwrites.
#[derive(Debug)]
pub struct DirectoryServices {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl DirectoryServices {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Vec::new(),
        }
    }

    /// Paths written so far, in order.
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl Services for DirectoryServices {
    fn compressor(&self) -> &dyn Compressor {
        &JpegCompressor
    }

    fn save(&mut self, download: Download) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Only the final component; a name must not escape the directory.
        let file_name = Path::new(&download.file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "download".into());
        let path = self.dir.join(file_name);
        fs::write(&path, &download.bytes)?;
        log::info!("saved {} ({} bytes)", path.display(), download.bytes.len());
        self.saved.push(path);
        Ok(())
    }

    fn alert(&mut self, message: &str) {
        log::warn!("alert: {}", message);
        eprintln!("{}", message);
    }
}

#[derive(Debug)]
struct Timer {
    due: Duration,
    epoch: u64,
    msg: CompressorMsg,
}

pub struct Runtime<S> {
    chooser: Chooser,
    services: S,
    queue: VecDeque<Envelope>,
    timers: Vec<Timer>,
    now: Duration,
}

impl<S: Services> Runtime<S> {
    pub fn new(settings: Settings, services: S) -> Self {
        Self {
            chooser: Chooser::new(settings),
            services,
            queue: VecDeque::new(),
            timers: Vec::new(),
            now: Duration::ZERO,
        }
    }

    pub fn chooser(&self) -> &Chooser {
        &self.chooser
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    /// Time elapsed on the runtime clock.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Queues a user message for the mounted screen and runs the loop
    /// until the queue is empty.
    pub fn dispatch(&mut self, msg: Msg) {
        let epoch = self.chooser.epoch();
        self.queue.push_back(Envelope { epoch, msg });
        self.drain();
    }

    /// Moves the clock forward, firing timers that come due in order.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.due <= self.now);
        self.timers = pending;
        due.sort_by_key(|t| t.due);
        for timer in due {
            self.queue.push_back(Envelope {
                epoch: timer.epoch,
                msg: Msg::Compressor(timer.msg),
            });
        }
        self.drain();
    }

    fn drain(&mut self) {
        while let Some(envelope) = self.queue.pop_front() {
            let effects = self.chooser.update(envelope);
            let epoch = self.chooser.epoch();
            self.perform(epoch, effects);
        }
    }

    fn perform(&mut self, epoch: u64, effects: Vec<Effect>) {
        let mut encodes = Vec::new();
        for effect in effects {
            match effect {
                Effect::Converter(task) => encodes.push(task),
                Effect::Compressor(CompressorTask::Compress {
                    ticket,
                    input,
                    options,
                }) => {
                    let msg = compressor::perform(ticket, &input, &options, self.services.compressor());
                    self.queue.push_back(Envelope {
                        epoch,
                        msg: Msg::Compressor(msg),
                    });
                }
                Effect::Compressor(CompressorTask::Reveal { ticket, after }) => {
                    self.timers.push(Timer {
                        due: self.now + after,
                        epoch,
                        msg: CompressorMsg::Reveal(ticket),
                    });
                }
                Effect::Download(download) => {
                    let name = download.file_name.clone();
                    if let Err(e) = self.services.save(download) {
                        log::error!("failed to save {}: {}", name, e);
                        self.services.alert(&format!("Could not save {}: {}", name, e));
                    }
                }
                Effect::Alert(message) => self.services.alert(&message),
            }
        }

        // Converter tasks are independent; completions queue in request order.
        let results: Vec<ConverterMsg> = if encodes.len() > 1 {
            encodes.into_par_iter().map(converter::perform).collect()
        } else {
            encodes.into_iter().map(converter::perform).collect()
        };
        for msg in results {
            self.queue.push_back(Envelope {
                epoch,
                msg: Msg::Converter(msg),
            });
        }
    }
}

impl Runtime<MemoryServices> {
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, MemoryServices::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::chooser::Choice;
    use crate::app::effect::SelectedFile;
    use crate::codec::tests::sample_png;
    use crate::format::TargetFormat;

    #[test]
    fn convert_all_saves_in_request_order() {
        let mut rt = Runtime::in_memory(Settings::default());
        rt.dispatch(Msg::Choose(Choice::Convert));
        rt.dispatch(Msg::Converter(ConverterMsg::Upload(SelectedFile::new(
            "pic.png",
            sample_png(16, 16),
        ))));
        rt.dispatch(Msg::Converter(ConverterMsg::ConvertAll(vec![
            TargetFormat::Webp,
            TargetFormat::Jpg,
            TargetFormat::Png,
        ])));

        let names: Vec<_> = rt
            .services()
            .downloads
            .iter()
            .map(|d| d.file_name.as_str())
            .collect();
        assert_eq!(names, ["pic.webp", "pic.jpg", "pic.png"]);
    }

    #[test]
    fn reveal_waits_for_the_clock() {
        let mut rt = Runtime::in_memory(Settings::default());
        rt.dispatch(Msg::Choose(Choice::Compress));
        rt.dispatch(Msg::Compressor(CompressorMsg::Upload(SelectedFile::new(
            "pic.png",
            sample_png(16, 16),
        ))));
        rt.dispatch(Msg::Compressor(CompressorMsg::Compress));

        let screen = rt.chooser().compressor().unwrap();
        assert!(screen.is_compressed());
        assert!(!screen.shows_compressed());
        assert_eq!(rt.pending_timers(), 1);

        rt.advance(Duration::from_millis(1999));
        assert!(!rt.chooser().compressor().unwrap().shows_compressed());
        rt.advance(Duration::from_millis(1));
        assert_eq!(rt.now(), Duration::from_secs(2));
        assert!(rt.chooser().compressor().unwrap().shows_compressed());
        assert_eq!(rt.pending_timers(), 0);
    }

    #[test]
    fn timers_from_an_unmounted_screen_are_dropped() {
        let mut rt = Runtime::in_memory(Settings::default());
        rt.dispatch(Msg::Choose(Choice::Compress));
        rt.dispatch(Msg::Compressor(CompressorMsg::Upload(SelectedFile::new(
            "pic.png",
            sample_png(16, 16),
        ))));
        rt.dispatch(Msg::Compressor(CompressorMsg::Compress));
        rt.dispatch(Msg::Choose(Choice::Convert));
        rt.dispatch(Msg::Choose(Choice::Compress));
        rt.advance(Duration::from_secs(5));

        let screen = rt.chooser().compressor().unwrap();
        assert!(!screen.shows_compressed());
        assert!(screen.history().is_empty());
    }

    #[test]
    fn directory_services_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut services = DirectoryServices::new(dir.path().join("out"));
        services
            .save(Download {
                file_name: "../escape.png".into(),
                mime: "image/png".into(),
                bytes: vec![1, 2, 3],
            })
            .unwrap();
        let written = dir.path().join("out").join("escape.png");
        assert_eq!(services.saved(), [written.clone()]);
        assert_eq!(fs::read(written).unwrap(), vec![1, 2, 3]);
    }
}
