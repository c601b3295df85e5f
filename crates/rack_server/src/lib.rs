use std::path::PathBuf;
use std::sync::Arc;

use rack_core::PresetStore;

pub mod dispatch;
mod http_server;
pub mod midi;
pub mod osc;

pub use dispatch::{CcMapping, Dispatcher};
pub use http_server::{AppState, create_router};
pub use midi::MidiIngress;
pub use osc::OscIngress;

/// Server configuration
pub struct ServerConfig {
    pub http_port: u16,
    pub osc_port: u16,
    pub feedback_host: String,
    pub feedback_port: u16,
    pub presets_file: PathBuf,
    /// MIDI input port index to open at startup, if any.
    pub midi_port: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 5000,
            osc_port: 8000,
            feedback_host: "127.0.0.1".to_string(),
            feedback_port: 9000,
            presets_file: PathBuf::from("presets.json"),
            midi_port: None,
        }
    }
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let store = Arc::new(PresetStore::new(&config.presets_file));
    tracing::info!("preset store at {}", store.path().display());

    // Shared sink both ingress paths write into; the dispatcher drains it
    let (command_tx, command_rx) = crossbeam_channel::unbounded();

    let midi = Arc::new(MidiIngress::new(command_tx.clone()));
    if let Some(index) = config.midi_port {
        if let Err(e) = midi.open(index) {
            tracing::warn!("MIDI port {} not opened: {}", index, e);
        }
    }

    let osc = Arc::new(OscIngress::new(command_tx));
    if let Err(e) = osc.start(config.osc_port) {
        tracing::warn!("OSC server not started: {}", e);
    }
    if let Err(e) = osc.setup_client(&config.feedback_host, config.feedback_port) {
        tracing::warn!("OSC feedback client not configured: {}", e);
    }

    dispatch::spawn(Dispatcher::new(store.clone()), command_rx);

    let state = AppState {
        store,
        midi: midi.clone(),
        osc: osc.clone(),
    };
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("HTTP server listening on http://localhost:{}", config.http_port);

    axum::serve(listener, app).await?;

    // Shutdown: stop the listener and drop pending callbacks
    osc.stop();
    midi.close();

    Ok(())
}
