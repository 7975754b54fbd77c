//! Capability boundary to the native multimodal engine.
//!
//! The engine is an external collaborator: its failures are opaque by
//! contract (an empty embedding, a token stream that simply ends) and it
//! offers no cancellation. Adapters own whatever model handles or FFI
//! context their platform needs; the runtime depends only on this trait and
//! is exercised in tests through fake implementations.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

/// Receives incremental prediction text as the engine produces it.
pub type TokenSink = UnboundedSender<String>;

#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Mean-pooled embedding for `prompt`.
    ///
    /// Returns an empty vector on engine failure; no structured error is
    /// surfaced.
    async fn embed_text(&self, prompt: &str) -> Vec<f32>;

    /// Describe the image at `image_path` according to `prompt`, streaming
    /// text into `tokens`.
    ///
    /// The call resolves when the engine is done; on failure the stream
    /// simply ends with whatever was produced so far.
    async fn predict(&self, image_path: &Path, prompt: &str, tokens: TokenSink);
}
