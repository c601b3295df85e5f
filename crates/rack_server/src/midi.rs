//! MIDI ingress for the rack control server.
//!
//! Provides MIDI device enumeration and connection management, and converts
//! raw MIDI bytes into canonical commands pushed into the shared sink.

use crossbeam_channel::Sender;
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use rack_core::{Command, normalize_midi};
use tracing::{info, warn};

const CLIENT_NAME: &str = "rack";

/// Information about a MIDI input port.
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    pub name: String,
    pub index: usize,
}

/// Manages the MIDI input/output connections and forwards normalized
/// events into the command sink.
pub struct MidiIngress {
    /// Whether a MIDI backend exists on this machine, probed once at startup.
    available: bool,
    input: Mutex<Option<MidiInputConnection<()>>>,
    output: Mutex<Option<MidiOutputConnection>>,
    connected_port: Mutex<Option<String>>,
    sink: Sender<Command>,
}

impl MidiIngress {
    pub fn new(sink: Sender<Command>) -> Self {
        let available = MidiInput::new(CLIENT_NAME).is_ok();
        if !available {
            warn!("no MIDI backend available; MIDI control disabled");
        }
        Self {
            available,
            input: Mutex::new(None),
            output: Mutex::new(None),
            connected_port: Mutex::new(None),
            sink,
        }
    }

    /// Whether a MIDI backend is present. Absence is a degraded state, not
    /// an error: enumeration returns empty and `open` fails softly.
    pub fn available(&self) -> bool {
        self.available
    }

    /// List available MIDI input ports. Empty when the backend is absent.
    pub fn list_ports(&self) -> Vec<MidiPortInfo> {
        if !self.available {
            return Vec::new();
        }
        let midi_in = match MidiInput::new(CLIENT_NAME) {
            Ok(m) => m,
            Err(_) => return Vec::new(),
        };

        midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_in
                    .port_name(port)
                    .ok()
                    .map(|name| MidiPortInfo { name, index })
            })
            .collect()
    }

    /// Connect to a MIDI input port by index and install the message
    /// handler. An invalid index or claimed port returns an error rather
    /// than crashing.
    pub fn open(&self, port_index: usize) -> Result<(), String> {
        if !self.available {
            return Err("no MIDI backend available".to_string());
        }

        // Drop any existing connection first
        self.close();

        let midi_in = MidiInput::new(CLIENT_NAME)
            .map_err(|e| format!("failed to create MIDI input: {e}"))?;
        let ports = midi_in.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| format!("MIDI port index {port_index} out of range"))?;
        let name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| format!("port {port_index}"));

        let sink = self.sink.clone();
        let connection = midi_in
            .connect(
                port,
                "rack-input",
                move |_timestamp_us, data, _| {
                    if data.is_empty() {
                        return;
                    }
                    let data1 = data.get(1).copied().unwrap_or(0);
                    let data2 = data.get(2).copied().unwrap_or(0);
                    // Fire-and-forget: a closed sink just drops the event
                    let _ = sink.send(normalize_midi(data[0], data1, data2));
                },
                (),
            )
            .map_err(|e| format!("failed to connect to MIDI port '{name}': {e}"))?;

        *self.input.lock() = Some(connection);
        *self.connected_port.lock() = Some(name.clone());
        info!("MIDI input connected to '{}'", name);

        // Output is best-effort; absence only disables raw sends
        match MidiOutput::new(CLIENT_NAME) {
            Ok(midi_out) => {
                let out_ports = midi_out.ports();
                if let Some(out_port) = out_ports.get(port_index) {
                    match midi_out.connect(out_port, "rack-output") {
                        Ok(conn) => *self.output.lock() = Some(conn),
                        Err(e) => warn!("MIDI output unavailable: {}", e),
                    }
                }
            }
            Err(e) => warn!("MIDI output unavailable: {}", e),
        }

        Ok(())
    }

    /// Send raw bytes to the output port. No-op when none is open.
    pub fn send(&self, message: &[u8]) {
        if let Some(out) = self.output.lock().as_mut() {
            if let Err(e) = out.send(message) {
                warn!("failed to send MIDI message: {}", e);
            }
        }
    }

    /// Name of the currently connected input port.
    pub fn connected_port(&self) -> Option<String> {
        self.connected_port.lock().clone()
    }

    /// Release both ports. Safe to call when nothing is open.
    pub fn close(&self) {
        *self.input.lock() = None;
        *self.output.lock() = None;
        *self.connected_port.lock() = None;
    }
}
