// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service, storage port and the view configuration it loads.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use vtk_scene_port::{GizmoPlacement, INTERNAL_CAMERA_FIELDS};

/// Keyed blob storage behind [`ConfigService`].
///
/// Hosts back it with whatever persistence the embedding page offers.
pub trait ConfigStore {
    /// Blob stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replace the blob stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Errors from loading or saving view configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("config key {0} not found")]
    NotFound(String),
    /// Stored blob is not valid JSON for the requested type.
    #[error("config blob malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// JSON (de)serialization on top of a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S: ConfigStore> ConfigService<S> {
    /// Service over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Value stored under `key`; `None` if the key is absent or empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Store `value` under `key` as pretty JSON.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        self.store.save_raw(key, &serde_json::to_vec_pretty(value)?)
    }
}

/// In-memory `ConfigStore`, for embedding hosts without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    blobs: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        self.blobs
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| ConfigError::NotFound(key.to_owned()))
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

/// Per-view settings that the host does not change at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Orientation marker placement.
    pub orientation: GizmoPlacement,
    /// Container width when the model does not set one.
    pub default_width: u32,
    /// Container height when the model does not set one.
    pub default_height: u32,
    /// Camera fields stripped before a snapshot reaches the model.
    pub camera_denylist: Vec<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            orientation: GizmoPlacement::default(),
            default_width: 300,
            default_height: 300,
            camera_denylist: INTERNAL_CAMERA_FIELDS
                .iter()
                .map(|field| (*field).to_owned())
                .collect(),
        }
    }
}

impl ViewConfig {
    /// Store key the view configuration lives under.
    pub const KEY: &'static str = "vtk-view";

    /// Load the view configuration, falling back to defaults when absent.
    pub fn load<S: ConfigStore>(service: &ConfigService<S>) -> Result<Self, ConfigError> {
        Ok(service.load(Self::KEY)?.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vtk_scene_port::ViewportCorner;

    #[test]
    fn missing_key_yields_defaults() {
        let service = ConfigService::new(MemoryConfigStore::new());
        let config = ViewConfig::load(&service).unwrap();
        assert_eq!(config, ViewConfig::default());
        assert_eq!(config.orientation.corner, ViewportCorner::BottomRight);
        assert_eq!(config.orientation.min_pixel_size, 75);
        assert_eq!(config.orientation.max_pixel_size, 300);
        assert_eq!(config.camera_denylist.len(), INTERNAL_CAMERA_FIELDS.len());
    }

    #[test]
    fn saved_config_loads_back() {
        let service = ConfigService::new(MemoryConfigStore::new());
        let config = ViewConfig {
            default_width: 640,
            camera_denylist: vec!["mtime".into()],
            ..ViewConfig::default()
        };
        service.save(ViewConfig::KEY, &config).unwrap();
        assert_eq!(ViewConfig::load(&service).unwrap(), config);
    }

    #[test]
    fn partial_blob_fills_defaults() {
        let store = MemoryConfigStore::new();
        store
            .save_raw(ViewConfig::KEY, br#"{"orientation": {"corner": "top_left"}}"#)
            .unwrap();
        let config = ViewConfig::load(&ConfigService::new(store)).unwrap();
        assert_eq!(config.orientation.corner, ViewportCorner::TopLeft);
        assert!((config.orientation.viewport_size - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.default_height, 300);
    }

    #[test]
    fn store_names_the_missing_key() {
        let store = MemoryConfigStore::new();
        match store.load_raw(ViewConfig::KEY) {
            Err(ConfigError::NotFound(key)) => assert_eq!(key, "vtk-view"),
            other => unreachable!("unexpected {other:?}"),
        }
    }

    #[test]
    fn corrupt_blob_is_a_serde_error() {
        let store = MemoryConfigStore::new();
        store.save_raw(ViewConfig::KEY, b"{not json").unwrap();
        assert!(matches!(
            ViewConfig::load(&ConfigService::new(store)),
            Err(ConfigError::Serde(_))
        ));
    }
}
