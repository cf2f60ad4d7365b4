mod checker;
mod engine;
mod fetcher;
mod manifest;
mod mirror;
mod service;

use thiserror::Error;

pub use checker::{check_for_update, UpdateCheck};
pub use engine::{apply_update, synchronize, synchronize_with_progress, SyncOutcome, SyncReport};
pub use fetcher::RemoteSite;
pub use manifest::{FileList, ModelManifest, VersionDescriptor, WeightsGroup};
pub use mirror::MirrorStore;
pub use service::{SyncJob, SyncPhase, SyncService};

/// Failures fall into the two phases of a pass: the update check and
/// the asset download/write loop. A failed update leaves the mirror
/// partially updated with the old version descriptor, so the next pass
/// retries in full.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("update check failed: {0}")]
    Check(anyhow::Error),
    #[error("asset update failed: {0}")]
    Update(anyhow::Error),
}
