use serde::{Deserialize, Serialize};

/// An effect configuration as stored inside a preset. The rack core treats
/// these as opaque JSON and passes them through verbatim.
pub type EffectConfig = serde_json::Value;

/// A named, ordered chain of effect configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: u64,
    pub name: String,
    pub effects: Vec<EffectConfig>,
    /// RFC 3339 UTC timestamp, set once at creation.
    pub created_at: String,
    /// RFC 3339 UTC timestamp, refreshed on every mutation.
    pub updated_at: String,
}

/// MIDI channel-message class, taken from the high nibble of the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidiMessageType {
    NoteOn,
    NoteOff,
    ControlChange,
    ProgramChange,
    PitchBend,
    Unknown,
}

/// Canonical command produced by the normalizer and consumed by the
/// dispatcher. Commands are ephemeral values; they are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Bypass {
        effect_id: String,
        enabled: bool,
    },
    SetParam {
        effect_id: String,
        param: String,
        value: f32,
    },
    LoadPreset {
        preset_id: u64,
    },
    MasterVolume {
        value: f32,
    },
    /// Raw MIDI passthrough when no higher-level mapping applies.
    NoteEvent {
        channel: u8,
        message: MidiMessageType,
        data1: u8,
        data2: u8,
    },
}
