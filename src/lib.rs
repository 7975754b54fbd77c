//! Local runtime for the MiniCPM-V multimodal model.
//!
//! Gates inference on model-asset readiness: a catalog of required weights,
//! a streaming downloader with per-asset progress, and a pure readiness
//! function recomputed on every event the runtime processes. The native
//! inference engine is an external collaborator behind the
//! [`inference::InferenceEngine`] trait; its failures stay opaque here.

pub mod assets;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod inference;
pub mod status;

pub use assets::{AssetInfo, AssetKind, AssetStore};
pub use config::RuntimeConfig;
pub use controller::{Controller, StatusSnapshot};
pub use error::Error;
pub use events::RuntimeEvent;
pub use inference::{InferenceEngine, TokenSink};
pub use status::{compute_status, status_message, AppStatus, ReadinessInputs};
