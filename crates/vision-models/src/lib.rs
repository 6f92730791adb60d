//! Vision Plus model registry.
//!
//! Tracks which models are loaded and which compute device inference runs on.
//! The numeric work itself happens elsewhere; this crate covers:
//! - Model registration through a pluggable [`ModelLoader`]
//! - One-shot device selection (`cuda` > `mps` > `cpu`)
//! - Not-loaded detection for inference requests

pub mod device;
pub mod error;
pub mod registry;

pub use device::{Device, DeviceProbe, SystemProbe};
pub use error::ModelError;
pub use registry::{
    InferenceResult, ModelEntry, ModelInventory, ModelLoader, ModelRegistry, ModelStatus,
    PassthroughLoader,
};
