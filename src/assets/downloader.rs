//! Asset downloads with streamed progress.
//!
//! Each required asset is fetched by its own task. Transfers stream into a
//! `.partial` file next to the final path and are renamed into place only on
//! success, so a failed or interrupted transfer never leaves a truncated
//! asset where the readiness check would find it. Failures are logged and
//! reported as events; there is no automatic retry.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::StreamExt;
use log::{debug, error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::UnboundedSender;

use crate::events::RuntimeEvent;

use super::catalog::AssetCatalogEntry;
use super::store::AssetStore;

/// Progress events are throttled to avoid flooding the queue.
const PROGRESS_INTERVAL_MS: u128 = 100;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("a download or inference call is already active")]
    AlreadyActive,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches the declared assets, reporting progress and completion as events.
pub struct Downloader {
    store: AssetStore,
    catalog: Vec<AssetCatalogEntry>,
    client: reqwest::Client,
    events: UnboundedSender<RuntimeEvent>,
}

impl Downloader {
    pub fn new(
        store: AssetStore,
        catalog: Vec<AssetCatalogEntry>,
        events: UnboundedSender<RuntimeEvent>,
    ) -> Self {
        Self {
            store,
            catalog,
            client: reqwest::Client::new(),
            events,
        }
    }

    /// Start one independent fetch per missing asset.
    ///
    /// Returns once the transfers are spawned; completions and failures
    /// arrive as events. Assets already at their final path are skipped.
    pub fn download_all(&self) {
        for entry in &self.catalog {
            if self.store.exists(entry.kind) {
                info!("{} already present, skipping", entry.filename);
                continue;
            }

            let entry = entry.clone();
            let dest = self.store.local_path_for(entry.kind);
            let client = self.client.clone();
            let events = self.events.clone();

            tokio::spawn(async move {
                let kind = entry.kind;
                match fetch_asset(&client, &entry, &dest, &events).await {
                    Ok(()) => {
                        info!("Download complete: {} -> {:?}", entry.filename, dest);
                        let _ = events.send(RuntimeEvent::DownloadCompleted { kind });
                    }
                    Err(e) => {
                        // The asset stays absent; readiness recomputation
                        // reflects that without blocking the caller.
                        error!("Download of {} failed: {}", entry.filename, e);
                        let _ = tokio::fs::remove_file(partial_path(&dest)).await;
                        let _ = events.send(RuntimeEvent::DownloadFailed {
                            kind,
                            error: e.to_string(),
                        });
                    }
                }
            });
        }
    }
}

/// Stream one asset into its `.partial` file, then rename into place.
/// The rename is the only corruption protection on this path.
async fn fetch_asset(
    client: &reqwest::Client,
    entry: &AssetCatalogEntry,
    dest: &Path,
    events: &UnboundedSender<RuntimeEvent>,
) -> Result<(), DownloadError> {
    info!("Starting download of {} from {}", entry.filename, entry.url);

    let response = client.get(&entry.url).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    let total = response.content_length().unwrap_or_else(|| {
        warn!(
            "No Content-Length for {}, using catalog size for progress",
            entry.filename
        );
        entry.size_bytes
    });

    let partial = partial_path(dest);
    let file = tokio::fs::File::create(&partial).await?;
    let mut file = tokio::io::BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_emit = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if last_emit.elapsed().as_millis() >= PROGRESS_INTERVAL_MS || downloaded >= total {
            let fraction = if total > 0 {
                (downloaded as f64 / total as f64).clamp(0.0, 1.0)
            } else {
                0.0
            };
            debug!(
                "{}: {:.1}% ({}/{} bytes)",
                entry.filename,
                fraction * 100.0,
                downloaded,
                total
            );
            let _ = events.send(RuntimeEvent::DownloadProgress {
                kind: entry.kind,
                fraction,
            });
            last_emit = Instant::now();
        }
    }

    file.flush().await?;
    drop(file);

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_sit_next_to_the_destination() {
        assert_eq!(
            partial_path(Path::new("/docs/cpm/ggml-model-Q4_0.gguf")),
            PathBuf::from("/docs/cpm/ggml-model-Q4_0.gguf.partial")
        );
    }
}
