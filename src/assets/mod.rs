pub mod catalog;
pub mod downloader;
pub mod store;

pub use catalog::{asset_catalog, AssetCatalogEntry, AssetKind};
pub use downloader::{DownloadError, Downloader};
pub use store::{AssetStore, StoreError};

use serde::Serialize;

use crate::status::AssetState;

/// Combined per-asset view (catalog + observed state).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    // From catalog
    pub kind: AssetKind,
    pub display_name: String,
    pub filename: String,

    // From observed state
    pub is_downloaded: bool,
    pub progress: f64,
}

impl AssetInfo {
    pub fn from_catalog_and_state(catalog: &AssetCatalogEntry, state: AssetState) -> Self {
        Self {
            kind: catalog.kind,
            display_name: catalog.display_name.clone(),
            filename: catalog.filename.clone(),
            is_downloaded: state.present,
            progress: state.progress,
        }
    }
}
