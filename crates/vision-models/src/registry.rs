//! Model registry and inference dispatch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::device::{Device, DeviceProbe, SystemProbe};
use crate::error::ModelError;

/// A registered model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Unique model name.
    pub name: String,

    /// Model family/type (e.g., "segmentation").
    #[serde(rename = "type")]
    pub model_type: String,

    /// Always "loaded" for registered entries.
    pub status: String,

    /// When the entry was (re)loaded.
    pub loaded_at: DateTime<Utc>,
}

/// Outcome of a dispatched inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    pub device: Device,
}

/// Snapshot returned by [`ModelRegistry::list_models`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInventory {
    pub available_models: Vec<String>,
    pub device: Device,
    pub timestamp: DateTime<Utc>,
}

/// Status lookup result. `NotLoaded` serializes as `{"status":"not_loaded"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    Loaded(ModelEntry),
    NotLoaded,
}

impl ModelStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl Serialize for ModelStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Loaded(entry) => entry.serialize(serializer),
            Self::NotLoaded => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", "not_loaded")?;
                map.end()
            }
        }
    }
}

/// The external model load procedure.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Prepare `name` of family `model_type` for inference.
    async fn load(&self, model_type: &str, name: &str) -> Result<(), ModelError>;
}

/// Loader that accepts every model without touching weights.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughLoader;

#[async_trait]
impl ModelLoader for PassthroughLoader {
    async fn load(&self, _model_type: &str, _name: &str) -> Result<(), ModelError> {
        Ok(())
    }
}

/// Registry of loaded models.
///
/// The compute device is chosen once at construction and never re-evaluated.
pub struct ModelRegistry {
    models: RwLock<IndexMap<String, ModelEntry>>,
    loader: Arc<dyn ModelLoader>,
    device: Device,
}

impl ModelRegistry {
    /// Registry with the passthrough loader and host device detection.
    pub fn new() -> Self {
        Self::with_loader(Arc::new(PassthroughLoader))
    }

    /// Registry with a custom loader and host device detection.
    pub fn with_loader(loader: Arc<dyn ModelLoader>) -> Self {
        Self::with_probe(loader, &SystemProbe)
    }

    /// Registry with a custom loader and device probe.
    pub fn with_probe(loader: Arc<dyn ModelLoader>, probe: &dyn DeviceProbe) -> Self {
        let device = Device::select(probe);
        tracing::info!(device = %device, "Compute device selected");

        Self {
            models: RwLock::new(IndexMap::new()),
            loader,
            device,
        }
    }

    /// Selected compute device.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Load (or reload) a model. Returns `false` if the loader fails.
    pub async fn load_model(&self, model_type: &str, name: &str) -> bool {
        tracing::info!(model = %name, model_type = %model_type, "Loading model");

        if let Err(e) = self.loader.load(model_type, name).await {
            tracing::error!(model = %name, error = %e, "Failed to load model");
            return false;
        }

        let entry = ModelEntry {
            name: name.to_string(),
            model_type: model_type.to_string(),
            status: "loaded".to_string(),
            loaded_at: Utc::now(),
        };
        self.models.write().await.insert(name.to_string(), entry);

        true
    }

    /// Run inference against a loaded model. `None` if it is not loaded.
    pub async fn run_inference(
        &self,
        name: &str,
        data: &serde_json::Value,
    ) -> Option<InferenceResult> {
        if !self.models.read().await.contains_key(name) {
            tracing::error!(model = %name, "Model not loaded");
            return None;
        }

        tracing::debug!(model = %name, device = %self.device, input = %data, "Running inference");

        Some(InferenceResult {
            model: name.to_string(),
            timestamp: Utc::now(),
            status: "success".to_string(),
            device: self.device,
        })
    }

    /// Look up a model entry.
    pub async fn get_model_status(&self, name: &str) -> ModelStatus {
        match self.models.read().await.get(name) {
            Some(entry) => ModelStatus::Loaded(entry.clone()),
            None => ModelStatus::NotLoaded,
        }
    }

    /// Registered names, in load order, plus the device.
    pub async fn list_models(&self) -> ModelInventory {
        ModelInventory {
            available_models: self.models.read().await.keys().cloned().collect(),
            device: self.device,
            timestamp: Utc::now(),
        }
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}
