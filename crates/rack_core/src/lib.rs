//! Core types and logic for the rack control server: the preset data model,
//! the file-backed preset store, and the command normalizer that maps raw
//! MIDI/OSC input onto canonical commands.

pub mod normalize;
pub mod store;
pub mod types;

pub use normalize::{normalize_midi, normalize_osc};
pub use store::{PresetStore, StoreError};
pub use types::{Command, EffectConfig, MidiMessageType, Preset};
