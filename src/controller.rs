//! Runtime controller - owns the event queue and the published snapshot.
//!
//! Downloads and inference calls run on their own tasks but never mutate
//! shared state; they post [`RuntimeEvent`]s into one ordered queue. The
//! single consumer below applies each event, recomputes status through the
//! pure readiness function, and publishes the result on a watch channel.
//! One writer, any number of observers, no locks on the status path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use tokio::sync::{mpsc, watch};

use crate::assets::catalog::{asset_catalog_from, AssetCatalogEntry, AssetKind};
use crate::assets::downloader::{DownloadError, Downloader};
use crate::assets::store::{AssetStore, StoreError};
use crate::assets::AssetInfo;
use crate::config::RuntimeConfig;
use crate::events::RuntimeEvent;
use crate::inference::InferenceEngine;
use crate::status::{compute_status, status_message, AppStatus, AssetState, ReadinessInputs};

/// Published view of the runtime. Replaced wholesale on every event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: AppStatus,
    /// Human-readable status line.
    pub message: String,
    /// Prediction text streamed so far.
    pub reply: String,
    /// Embedding from the most recent text-embedding call.
    pub embedding: Vec<f32>,
    /// Per-asset presence and progress.
    pub assets: Vec<AssetInfo>,
}

pub struct Controller {
    store: AssetStore,
    engine: Arc<dyn InferenceEngine>,
    downloader: Downloader,
    events_tx: mpsc::UnboundedSender<RuntimeEvent>,
    snapshot_rx: watch::Receiver<StatusSnapshot>,
    default_prompt: String,
}

impl Controller {
    /// Build the runtime and spawn its event-queue consumer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: RuntimeConfig,
        engine: Arc<dyn InferenceEngine>,
    ) -> Result<Self, StoreError> {
        let store = match config.documents_dir {
            Some(dir) => AssetStore::new(dir),
            None => AssetStore::from_user_documents()?,
        };
        let catalog = asset_catalog_from(&config.model_repo_base);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let downloader = Downloader::new(store.clone(), catalog.clone(), events_tx.clone());

        let worker = Worker::new(store.clone(), catalog);
        let (snapshot_tx, snapshot_rx) = watch::channel(worker.snapshot());
        tokio::spawn(worker.run(events_rx, snapshot_tx));

        Ok(Self {
            store,
            engine,
            downloader,
            events_tx,
            snapshot_rx,
            default_prompt: config.default_prompt,
        })
    }

    /// Current published view.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch channel delivering every snapshot update.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Fetch any missing assets.
    ///
    /// No-op when everything is already on disk. Rejected while a download
    /// or inference call is active, so a second invocation cannot race the
    /// first. Transfer failures are not surfaced here; they show up as the
    /// status staying non-ready.
    pub fn download_all(&self) -> Result<(), DownloadError> {
        match self.snapshot().status {
            AppStatus::Ready => {
                info!("All model assets already present");
                Ok(())
            }
            AppStatus::Empty => {
                self.store.clear_temp_dir();
                self.store.ensure_model_dir();
                self.downloader.download_all();
                Ok(())
            }
            status => {
                warn!("download_all rejected while {}", status);
                Err(DownloadError::AlreadyActive)
            }
        }
    }

    /// Run multimodal prediction over a staged image.
    ///
    /// Status is Busy from just before the engine is invoked until it
    /// resolves, success or failure uniformly; streamed text lands in the
    /// snapshot's `reply` as it arrives.
    pub async fn predict(&self, image_path: &Path, prompt: &str) {
        if !self.store.all_present() {
            warn!("predict called before all model assets are present");
        }
        let prompt = self.effective_prompt(prompt);
        self.post(RuntimeEvent::InferenceStarted);

        let (tokens_tx, mut tokens_rx) = mpsc::unbounded_channel();
        let events = self.events_tx.clone();
        let forward = tokio::spawn(async move {
            while let Some(text) = tokens_rx.recv().await {
                if events.send(RuntimeEvent::InferenceText { text }).is_err() {
                    break;
                }
            }
        });

        self.engine.predict(image_path, &prompt, tokens_tx).await;
        let _ = forward.await;
        self.post(RuntimeEvent::InferenceFinished);
    }

    /// Embed `prompt` (or the default prompt when empty).
    ///
    /// Returns the engine's embedding, which is empty when the engine
    /// failed; the same vector is published in the snapshot.
    pub async fn embed_text(&self, prompt: &str) -> Vec<f32> {
        let prompt = self.effective_prompt(prompt);
        self.post(RuntimeEvent::InferenceStarted);

        let embedding = self.engine.embed_text(&prompt).await;
        self.post(RuntimeEvent::EmbeddingReady {
            embedding: embedding.clone(),
        });
        self.post(RuntimeEvent::InferenceFinished);
        embedding
    }

    /// Stage user-supplied image bytes for a later predict call.
    pub fn stage_image(&self, data: &[u8]) -> Result<PathBuf, StoreError> {
        self.store.stage_image(data)
    }

    fn effective_prompt(&self, prompt: &str) -> String {
        if prompt.is_empty() {
            self.default_prompt.clone()
        } else {
            prompt.to_string()
        }
    }

    fn post(&self, event: RuntimeEvent) {
        let _ = self.events_tx.send(event);
    }
}

/// Single consumer of the event queue; the only writer of runtime state.
struct Worker {
    store: AssetStore,
    catalog: Vec<AssetCatalogEntry>,
    llm_progress: f64,
    projector_progress: f64,
    inference_in_flight: u32,
    reply: String,
    embedding: Vec<f32>,
}

impl Worker {
    fn new(store: AssetStore, catalog: Vec<AssetCatalogEntry>) -> Self {
        Self {
            store,
            catalog,
            llm_progress: 0.0,
            projector_progress: 0.0,
            inference_in_flight: 0,
            reply: String::new(),
            embedding: Vec::new(),
        }
    }

    async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<RuntimeEvent>,
        snapshots: watch::Sender<StatusSnapshot>,
    ) {
        while let Some(event) = events.recv().await {
            self.apply(event);
            if snapshots.send(self.snapshot()).is_err() {
                break; // nobody is watching anymore
            }
        }
    }

    fn apply(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::DownloadProgress { kind, fraction } => {
                self.set_progress(kind, fraction.clamp(0.0, 1.0));
            }
            // Progress only means something while a transfer is in flight.
            RuntimeEvent::DownloadCompleted { kind } => self.set_progress(kind, 0.0),
            RuntimeEvent::DownloadFailed { kind, .. } => self.set_progress(kind, 0.0),
            RuntimeEvent::InferenceStarted => {
                self.inference_in_flight += 1;
                self.reply.clear();
            }
            RuntimeEvent::InferenceText { text } => self.reply.push_str(&text),
            RuntimeEvent::EmbeddingReady { embedding } => self.embedding = embedding,
            RuntimeEvent::InferenceFinished => {
                self.inference_in_flight = self.inference_in_flight.saturating_sub(1);
            }
        }
    }

    fn set_progress(&mut self, kind: AssetKind, fraction: f64) {
        match kind {
            AssetKind::Llm => self.llm_progress = fraction,
            AssetKind::Projector => self.projector_progress = fraction,
        }
    }

    fn inputs(&self) -> ReadinessInputs {
        ReadinessInputs {
            llm: AssetState {
                present: self.store.exists(AssetKind::Llm),
                progress: self.llm_progress,
            },
            projector: AssetState {
                present: self.store.exists(AssetKind::Projector),
                progress: self.projector_progress,
            },
            inference_in_flight: self.inference_in_flight > 0,
        }
    }

    fn snapshot(&self) -> StatusSnapshot {
        let inputs = self.inputs();
        let assets = self
            .catalog
            .iter()
            .map(|entry| {
                let state = match entry.kind {
                    AssetKind::Llm => inputs.llm,
                    AssetKind::Projector => inputs.projector,
                };
                AssetInfo::from_catalog_and_state(entry, state)
            })
            .collect();

        StatusSnapshot {
            status: compute_status(&inputs),
            message: status_message(&inputs),
            reply: self.reply.clone(),
            embedding: self.embedding.clone(),
            assets,
        }
    }
}
