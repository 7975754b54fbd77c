use derive_more::From;

use crate::assets::downloader::DownloadError;
use crate::assets::store::StoreError;

/// Crate-level error aggregating what callers can actually hit.
#[derive(Debug, From)]
pub enum Error {
    #[from]
    Store(StoreError),

    #[from]
    Download(DownloadError),
}
