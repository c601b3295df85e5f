//! Command dispatcher: drains the shared command sink that both ingress
//! paths write into, applies the configured CC remap table, and hands the
//! results to the effect chain boundary (here: structured logs plus preset
//! resolution against the store).

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use rack_core::{Command, MidiMessageType, PresetStore};
use tracing::{debug, info, warn};

/// Target of a MIDI control-change remap. The table is user configuration;
/// nothing is remapped by default.
#[derive(Debug, Clone)]
pub enum CcMapping {
    Bypass { effect_id: String },
    Param { effect_id: String, param: String },
    MasterVolume,
}

pub struct Dispatcher {
    store: Arc<PresetStore>,
    cc_map: HashMap<u8, CcMapping>,
}

impl Dispatcher {
    pub fn new(store: Arc<PresetStore>) -> Self {
        Self::with_cc_map(store, HashMap::new())
    }

    pub fn with_cc_map(store: Arc<PresetStore>, cc_map: HashMap<u8, CcMapping>) -> Self {
        Self { store, cc_map }
    }

    /// Consume commands until the channel closes (all senders dropped).
    pub fn run(self, commands: Receiver<Command>) {
        for command in commands {
            self.apply(self.remap(command));
        }
        debug!("command channel closed; dispatcher exiting");
    }

    /// Translate a control-change event through the CC map. Unmapped
    /// controllers and non-CC events pass through untouched.
    fn remap(&self, command: Command) -> Command {
        let (data1, data2) = match &command {
            Command::NoteEvent {
                message: MidiMessageType::ControlChange,
                data1,
                data2,
                ..
            } => (*data1, *data2),
            _ => return command,
        };
        match self.cc_map.get(&data1) {
            Some(CcMapping::Bypass { effect_id }) => Command::Bypass {
                effect_id: effect_id.clone(),
                // MIDI switch convention: 0-63 off, 64-127 on
                enabled: data2 >= 64,
            },
            Some(CcMapping::Param { effect_id, param }) => Command::SetParam {
                effect_id: effect_id.clone(),
                param: param.clone(),
                value: data2 as f32 / 127.0,
            },
            Some(CcMapping::MasterVolume) => Command::MasterVolume {
                value: data2 as f32 / 127.0,
            },
            None => command,
        }
    }

    fn apply(&self, command: Command) {
        match command {
            Command::LoadPreset { preset_id } => match self.store.get(preset_id) {
                Ok(Some(preset)) => info!(
                    "loading preset {} ('{}', {} effects)",
                    preset.id,
                    preset.name,
                    preset.effects.len()
                ),
                Ok(None) => warn!("ignoring load of unknown preset {}", preset_id),
                Err(e) => warn!("failed to load preset {}: {}", preset_id, e),
            },
            Command::Bypass { effect_id, enabled } => {
                info!("bypass {} -> {}", effect_id, enabled);
            }
            Command::SetParam {
                effect_id,
                param,
                value,
            } => {
                info!("set {}.{} = {}", effect_id, param, value);
            }
            Command::MasterVolume { value } => {
                info!("master volume -> {}", value);
            }
            Command::NoteEvent {
                channel,
                message,
                data1,
                data2,
            } => {
                debug!(?message, channel, data1, data2, "MIDI event");
            }
        }
    }
}

/// Run a dispatcher on its own thread.
pub fn spawn(dispatcher: Dispatcher, commands: Receiver<Command>) -> JoinHandle<()> {
    std::thread::spawn(move || dispatcher.run(commands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dispatcher_with(cc_map: HashMap<u8, CcMapping>) -> (Dispatcher, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = Arc::new(PresetStore::new(dir.path().join("presets.json")));
        (Dispatcher::with_cc_map(store, cc_map), dir)
    }

    fn cc(data1: u8, data2: u8) -> Command {
        Command::NoteEvent {
            channel: 0,
            message: MidiMessageType::ControlChange,
            data1,
            data2,
        }
    }

    #[test]
    fn test_unmapped_cc_passes_through() {
        let (dispatcher, _dir) = dispatcher_with(HashMap::new());
        assert_eq!(dispatcher.remap(cc(64, 127)), cc(64, 127));
    }

    #[test]
    fn test_sustain_pedal_maps_to_bypass() {
        let mut map = HashMap::new();
        map.insert(
            64,
            CcMapping::Bypass {
                effect_id: "drive-1".to_string(),
            },
        );
        let (dispatcher, _dir) = dispatcher_with(map);

        assert_eq!(
            dispatcher.remap(cc(64, 127)),
            Command::Bypass {
                effect_id: "drive-1".to_string(),
                enabled: true,
            }
        );
        assert_eq!(
            dispatcher.remap(cc(64, 0)),
            Command::Bypass {
                effect_id: "drive-1".to_string(),
                enabled: false,
            }
        );
    }

    #[test]
    fn test_cc_value_scales_to_unit_range() {
        let mut map = HashMap::new();
        map.insert(7, CcMapping::MasterVolume);
        map.insert(
            11,
            CcMapping::Param {
                effect_id: "wah-1".to_string(),
                param: "position".to_string(),
            },
        );
        let (dispatcher, _dir) = dispatcher_with(map);

        assert_eq!(
            dispatcher.remap(cc(7, 127)),
            Command::MasterVolume { value: 1.0 }
        );
        assert_eq!(
            dispatcher.remap(cc(11, 0)),
            Command::SetParam {
                effect_id: "wah-1".to_string(),
                param: "position".to_string(),
                value: 0.0,
            }
        );
    }

    #[test]
    fn test_note_events_are_not_remapped() {
        let mut map = HashMap::new();
        map.insert(
            64,
            CcMapping::Bypass {
                effect_id: "drive-1".to_string(),
            },
        );
        let (dispatcher, _dir) = dispatcher_with(map);

        let note = Command::NoteEvent {
            channel: 0,
            message: MidiMessageType::NoteOn,
            data1: 64,
            data2: 100,
        };
        assert_eq!(dispatcher.remap(note.clone()), note);
    }
}
