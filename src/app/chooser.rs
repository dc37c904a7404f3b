//! Top-level switch mounting one screen at a time.

use crate::app::compressor::{CompressorMsg, CompressorScreen};
use crate::app::converter::{ConverterMsg, ConverterScreen};
use crate::app::effect::Effect;
use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Convert,
    Compress,
}

#[derive(Debug)]
pub enum Msg {
    Choose(Choice),
    Converter(ConverterMsg),
    Compressor(CompressorMsg),
}

/// A message stamped with the mount it is addressed to.
#[derive(Debug)]
pub struct Envelope {
    pub epoch: u64,
    pub msg: Msg,
}

#[derive(Debug)]
enum Mounted {
    Converter(ConverterScreen),
    Compressor(CompressorScreen),
}

#[derive(Debug)]
pub struct Chooser {
    settings: Settings,
    mounted: Option<Mounted>,
    /// Bumped on every mount so late completions of an unmounted screen
    /// can be recognised.
    epoch: u64,
}

impl Chooser {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            mounted: None,
            epoch: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn selected(&self) -> Option<Choice> {
        match self.mounted {
            Some(Mounted::Converter(_)) => Some(Choice::Convert),
            Some(Mounted::Compressor(_)) => Some(Choice::Compress),
            None => None,
        }
    }

    pub fn converter(&self) -> Option<&ConverterScreen> {
        match &self.mounted {
            Some(Mounted::Converter(s)) => Some(s),
            _ => None,
        }
    }

    pub fn compressor(&self) -> Option<&CompressorScreen> {
        match &self.mounted {
            Some(Mounted::Compressor(s)) => Some(s),
            _ => None,
        }
    }

    pub fn update(&mut self, envelope: Envelope) -> Vec<Effect> {
        if let Msg::Choose(choice) = envelope.msg {
            self.choose(choice);
            return Vec::new();
        }
        if envelope.epoch != self.epoch {
            log::debug!("chooser: dropping message for unmounted screen");
            return Vec::new();
        }
        match (&mut self.mounted, envelope.msg) {
            (Some(Mounted::Converter(screen)), Msg::Converter(msg)) => screen.update(msg),
            (Some(Mounted::Compressor(screen)), Msg::Compressor(msg)) => screen.update(msg),
            (_, msg) => {
                log::debug!("chooser: no mounted screen for {:?}", msg);
                Vec::new()
            }
        }
    }

    fn choose(&mut self, choice: Choice) {
        if self.selected() == Some(choice) {
            return;
        }
        self.epoch += 1;
        self.mounted = Some(match choice {
            Choice::Convert => Mounted::Converter(ConverterScreen::new(&self.settings)),
            Choice::Compress => Mounted::Compressor(CompressorScreen::new(&self.settings)),
        });
        log::debug!("chooser: mounted {:?} (epoch {})", choice, self.epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::effect::SelectedFile;

    fn send(chooser: &mut Chooser, msg: Msg) -> Vec<Effect> {
        let epoch = chooser.epoch();
        chooser.update(Envelope { epoch, msg })
    }

    #[test]
    fn starts_unselected() {
        let mut chooser = Chooser::new(Settings::default());
        assert_eq!(chooser.selected(), None);
        assert!(send(&mut chooser, Msg::Compressor(CompressorMsg::Compress)).is_empty());
    }

    #[test]
    fn switching_discards_screen_state() {
        let mut chooser = Chooser::new(Settings::default());
        send(&mut chooser, Msg::Choose(Choice::Compress));
        send(
            &mut chooser,
            Msg::Compressor(CompressorMsg::Upload(SelectedFile::new("a.png", vec![1, 2, 3]))),
        );
        assert!(chooser.compressor().unwrap().has_image());

        send(&mut chooser, Msg::Choose(Choice::Convert));
        assert!(chooser.compressor().is_none());
        send(&mut chooser, Msg::Choose(Choice::Compress));
        assert!(!chooser.compressor().unwrap().has_image());
    }

    #[test]
    fn reselecting_keeps_the_mounted_screen() {
        let mut chooser = Chooser::new(Settings::default());
        send(&mut chooser, Msg::Choose(Choice::Compress));
        send(&mut chooser, Msg::Compressor(CompressorMsg::ToggleHelp));
        send(&mut chooser, Msg::Choose(Choice::Compress));
        assert!(chooser.compressor().unwrap().help().is_some());
    }

    #[test]
    fn stale_epoch_is_dropped() {
        let mut chooser = Chooser::new(Settings::default());
        send(&mut chooser, Msg::Choose(Choice::Compress));
        let old = chooser.epoch();
        send(&mut chooser, Msg::Choose(Choice::Convert));
        send(&mut chooser, Msg::Choose(Choice::Compress));
        let effects = chooser.update(Envelope {
            epoch: old,
            msg: Msg::Compressor(CompressorMsg::Compress),
        });
        assert!(effects.is_empty());
    }
}
