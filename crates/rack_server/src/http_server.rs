use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use rack_core::{EffectConfig, Preset, PresetStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::midi::MidiIngress;
use crate::osc::OscIngress;

// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PresetStore>,
    pub midi: Arc<MidiIngress>,
    pub osc: Arc<OscIngress>,
}

/// Body of POST/PUT preset requests; both fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct PresetRequest {
    name: Option<String>,
    effects: Option<Vec<EffectConfig>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

// Build the Axum router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/presets", get(list_presets).post(create_preset))
        .route(
            "/api/presets/:id",
            get(get_preset).put(update_preset).delete(delete_preset),
        )
        .route("/api/midi/devices", get(midi_devices))
        .route("/api/osc/config", get(osc_config))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "message": "rack server running" }))
}

async fn list_presets(State(state): State<AppState>) -> Result<Json<Vec<Preset>>, AppError> {
    Ok(Json(state.store.list()?))
}

async fn create_preset(
    State(state): State<AppState>,
    Json(payload): Json<PresetRequest>,
) -> Result<(StatusCode, Json<Preset>), AppError> {
    let preset = state.store.create(payload.name, payload.effects)?;
    Ok((StatusCode::CREATED, Json(preset)))
}

async fn get_preset(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Preset>, AppError> {
    state
        .store
        .get(id)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Preset {id} not found")))
}

async fn update_preset(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<PresetRequest>,
) -> Result<Json<Preset>, AppError> {
    state
        .store
        .update(id, payload.name, payload.effects)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Preset {id} not found")))
}

// Deleting a missing preset is still a 200 (idempotent)
async fn delete_preset(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.delete(id)?;
    Ok(Json(json!({ "message": "Preset deleted" })))
}

async fn midi_devices(State(state): State<AppState>) -> Json<serde_json::Value> {
    let devices: Vec<String> = state
        .midi
        .list_ports()
        .into_iter()
        .map(|port| port.name)
        .collect();
    let message = if state.midi.available() {
        format!("{} MIDI input device(s) available", devices.len())
    } else {
        "No MIDI backend available on this system".to_string()
    };
    Json(json!({ "devices": devices, "message": message }))
}

async fn osc_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    let (port, message) = match state.osc.listen_port() {
        Some(port) => (port, format!("OSC server listening on port {port}")),
        None => (0, "OSC server not running".to_string()),
    };
    Json(json!({ "host": "0.0.0.0", "port": port, "message": message }))
}

// Error handling
pub enum AppError {
    NotFound(String),
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
