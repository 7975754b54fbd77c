//! Structured events posted into the runtime's single ordered queue.
//!
//! Download tasks and inference calls never touch shared state directly;
//! they post one of these and the queue consumer applies it. That keeps all
//! state mutation on one task regardless of how many transfers are running.

use serde::{Deserialize, Serialize};

use crate::assets::catalog::AssetKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RuntimeEvent {
    /// A transfer reported bytes; `fraction` is in [0.0, 1.0].
    DownloadProgress { kind: AssetKind, fraction: f64 },
    /// The asset was moved into its final place.
    DownloadCompleted { kind: AssetKind },
    /// The transfer failed; the asset remains absent. Not retried.
    DownloadFailed { kind: AssetKind, error: String },
    /// An inference call is about to invoke the engine.
    InferenceStarted,
    /// Incremental prediction text from the engine.
    InferenceText { text: String },
    /// Embedding produced by a text-embedding call.
    EmbeddingReady { embedding: Vec<f32> },
    /// The inference call resolved, successfully or not.
    InferenceFinished,
}
