//! File-backed preset storage.
//!
//! The store owns a single JSON file holding the full preset array. Every
//! operation re-reads the file before acting and rewrites it after mutating,
//! so the on-disk state and the returned value always agree. Each
//! read-modify-write cycle runs inside one critical section, which keeps id
//! assignment race-free under concurrent creates.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use crate::types::{EffectConfig, Preset};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read preset file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write preset file: {0}")]
    Write(#[source] std::io::Error),
    #[error("preset file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sole owner of the persisted preset collection.
pub struct PresetStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PresetStore {
    /// Create a store backed by the given file. The file is created lazily
    /// on the first mutation; a missing file reads as an empty collection.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All presets in insertion order.
    pub fn list(&self) -> Result<Vec<Preset>, StoreError> {
        let _guard = self.lock.lock();
        self.read_all()
    }

    /// Create a preset, assigning the next free id (max existing + 1, so ids
    /// are never reused after a deletion).
    pub fn create(
        &self,
        name: Option<String>,
        effects: Option<Vec<EffectConfig>>,
    ) -> Result<Preset, StoreError> {
        let _guard = self.lock.lock();
        let mut presets = self.read_all()?;
        let id = presets.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let now = timestamp();
        let preset = Preset {
            id,
            name: name.unwrap_or_else(|| format!("Preset {id}")),
            effects: effects.unwrap_or_default(),
            created_at: now.clone(),
            updated_at: now,
        };
        presets.push(preset.clone());
        self.write_all(&presets)?;
        Ok(preset)
    }

    pub fn get(&self, id: u64) -> Result<Option<Preset>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.into_iter().find(|p| p.id == id))
    }

    /// Replace only the supplied fields and refresh `updated_at`. Returns
    /// `None` (leaving the file untouched) when the id is absent.
    pub fn update(
        &self,
        id: u64,
        name: Option<String>,
        effects: Option<Vec<EffectConfig>>,
    ) -> Result<Option<Preset>, StoreError> {
        let _guard = self.lock.lock();
        let mut presets = self.read_all()?;
        let Some(preset) = presets.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            preset.name = name;
        }
        if let Some(effects) = effects {
            preset.effects = effects;
        }
        preset.updated_at = timestamp();
        let updated = preset.clone();
        self.write_all(&presets)?;
        Ok(Some(updated))
    }

    /// Remove a preset. Deleting an absent id is success (idempotent).
    pub fn delete(&self, id: u64) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut presets = self.read_all()?;
        let before = presets.len();
        presets.retain(|p| p.id != id);
        if presets.len() != before {
            self.write_all(&presets)?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Preset>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path).map_err(StoreError::Read)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_all(&self, presets: &[Preset]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(presets)?;
        fs::write(&self.path, json).map_err(StoreError::Write)
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
