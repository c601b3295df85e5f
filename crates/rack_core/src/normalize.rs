//! Command normalization: pure mappings from raw MIDI byte triples and OSC
//! address patterns onto canonical [`Command`] values.

use rosc::OscType;

use crate::types::{Command, MidiMessageType};

/// Normalize a 3-byte MIDI channel message into a [`Command::NoteEvent`].
///
/// The channel is the low nibble of the status byte, the message class the
/// high nibble. Unmapped classes (including system messages) come through as
/// `Unknown` rather than being dropped; CC-to-parameter remapping is a
/// dispatcher-level configuration concern, not performed here.
pub fn normalize_midi(status: u8, data1: u8, data2: u8) -> Command {
    let message = match status & 0xF0 {
        0x80 => MidiMessageType::NoteOff,
        0x90 => MidiMessageType::NoteOn,
        0xB0 => MidiMessageType::ControlChange,
        0xC0 => MidiMessageType::ProgramChange,
        0xE0 => MidiMessageType::PitchBend,
        _ => MidiMessageType::Unknown,
    };
    Command::NoteEvent {
        channel: status & 0x0F,
        message,
        data1,
        data2,
    }
}

/// Normalize an OSC message into a [`Command`], or `None` when the address
/// matches no known pattern (unrecognized messages are dropped, not errors).
///
/// Recognized addresses, first match wins:
/// - `/effect/{id}/bypass [state]` (default on)
/// - `/effect/{id}/param/{name} [value]` (default 0)
/// - `/preset/load [id]` (default 1)
/// - `/master/volume [value]` (default 1.0)
pub fn normalize_osc(addr: &str, args: &[OscType]) -> Option<Command> {
    let segments: Vec<&str> = addr.split('/').collect();
    match segments.as_slice() {
        ["", "effect", effect_id, "bypass"] => Some(Command::Bypass {
            effect_id: (*effect_id).to_string(),
            enabled: numeric_arg(args).unwrap_or(1.0) != 0.0,
        }),
        ["", "effect", effect_id, "param", param] => Some(Command::SetParam {
            effect_id: (*effect_id).to_string(),
            param: (*param).to_string(),
            value: numeric_arg(args).unwrap_or(0.0),
        }),
        ["", "preset", "load"] => Some(Command::LoadPreset {
            preset_id: numeric_arg(args).map(|v| v.max(0.0) as u64).unwrap_or(1),
        }),
        ["", "master", "volume"] => Some(Command::MasterVolume {
            value: numeric_arg(args).unwrap_or(1.0),
        }),
        _ => None,
    }
}

/// First argument as a number, accepting any numeric OSC type. Controllers
/// disagree on whether toggles arrive as ints, floats, or bools.
fn numeric_arg(args: &[OscType]) -> Option<f32> {
    match args.first()? {
        OscType::Int(i) => Some(*i as f32),
        OscType::Float(f) => Some(*f),
        OscType::Long(l) => Some(*l as f32),
        OscType::Double(d) => Some(*d as f32),
        OscType::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_channel_is_low_nibble() {
        for status in 0u8..=255 {
            let Command::NoteEvent { channel, .. } = normalize_midi(status, 0, 0) else {
                panic!("normalize_midi must always produce a NoteEvent");
            };
            assert_eq!(channel, status & 0x0F);
        }
    }

    #[test]
    fn test_midi_note_on() {
        assert_eq!(
            normalize_midi(0x90, 60, 100),
            Command::NoteEvent {
                channel: 0,
                message: MidiMessageType::NoteOn,
                data1: 60,
                data2: 100,
            }
        );
    }

    #[test]
    fn test_midi_message_classes() {
        let cases = [
            (0x81, MidiMessageType::NoteOff),
            (0x95, MidiMessageType::NoteOn),
            (0xB0, MidiMessageType::ControlChange),
            (0xC3, MidiMessageType::ProgramChange),
            (0xEF, MidiMessageType::PitchBend),
            (0xA0, MidiMessageType::Unknown),
            (0xF8, MidiMessageType::Unknown),
        ];
        for (status, expected) in cases {
            let Command::NoteEvent { message, .. } = normalize_midi(status, 1, 2) else {
                unreachable!();
            };
            assert_eq!(message, expected, "status byte {status:#04x}");
        }
    }

    #[test]
    fn test_osc_bypass() {
        assert_eq!(
            normalize_osc("/effect/delay-1/bypass", &[OscType::Int(1)]),
            Some(Command::Bypass {
                effect_id: "delay-1".to_string(),
                enabled: true,
            })
        );
        assert_eq!(
            normalize_osc("/effect/delay-1/bypass", &[OscType::Float(0.0)]),
            Some(Command::Bypass {
                effect_id: "delay-1".to_string(),
                enabled: false,
            })
        );
    }

    #[test]
    fn test_osc_bypass_defaults_on() {
        assert_eq!(
            normalize_osc("/effect/fuzz-2/bypass", &[]),
            Some(Command::Bypass {
                effect_id: "fuzz-2".to_string(),
                enabled: true,
            })
        );
    }

    #[test]
    fn test_osc_param() {
        assert_eq!(
            normalize_osc("/effect/delay-1/param/time", &[OscType::Int(500)]),
            Some(Command::SetParam {
                effect_id: "delay-1".to_string(),
                param: "time".to_string(),
                value: 500.0,
            })
        );
    }

    #[test]
    fn test_osc_param_defaults_zero() {
        assert_eq!(
            normalize_osc("/effect/reverb-1/param/mix", &[]),
            Some(Command::SetParam {
                effect_id: "reverb-1".to_string(),
                param: "mix".to_string(),
                value: 0.0,
            })
        );
    }

    #[test]
    fn test_osc_preset_load_default() {
        assert_eq!(
            normalize_osc("/preset/load", &[]),
            Some(Command::LoadPreset { preset_id: 1 })
        );
        assert_eq!(
            normalize_osc("/preset/load", &[OscType::Int(3)]),
            Some(Command::LoadPreset { preset_id: 3 })
        );
    }

    #[test]
    fn test_osc_master_volume() {
        assert_eq!(
            normalize_osc("/master/volume", &[OscType::Float(0.8)]),
            Some(Command::MasterVolume { value: 0.8 })
        );
        assert_eq!(
            normalize_osc("/master/volume", &[]),
            Some(Command::MasterVolume { value: 1.0 })
        );
    }

    #[test]
    fn test_osc_unrecognized() {
        assert_eq!(normalize_osc("/unknown/path", &[OscType::Int(1)]), None);
        assert_eq!(normalize_osc("/effect/delay-1", &[]), None);
        assert_eq!(normalize_osc("", &[]), None);
    }

    #[test]
    fn test_osc_bool_and_double_args() {
        assert_eq!(
            normalize_osc("/effect/comp-1/bypass", &[OscType::Bool(false)]),
            Some(Command::Bypass {
                effect_id: "comp-1".to_string(),
                enabled: false,
            })
        );
        assert_eq!(
            normalize_osc("/master/volume", &[OscType::Double(0.5)]),
            Some(Command::MasterVolume { value: 0.5 })
        );
    }
}
