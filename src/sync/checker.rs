use tracing::debug;

use crate::config::VERSION_FILE;

use super::fetcher::RemoteSite;
use super::manifest::VersionDescriptor;
use super::mirror::MirrorStore;
use super::SyncError;

/// Result of comparing the remote version descriptor to the mirrored one.
#[derive(Debug, Clone)]
pub struct UpdateCheck {
    pub remote: VersionDescriptor,
    pub needed: bool,
}

/// Fetch the remote version descriptor and compare its `build` to the
/// local copy. A missing local descriptor means an update is needed.
/// Any network or parse failure aborts the check; there is no retry.
pub async fn check_for_update(
    site: &RemoteSite,
    mirror: &MirrorStore,
) -> Result<UpdateCheck, SyncError> {
    let remote: VersionDescriptor = site
        .fetch_json(VERSION_FILE)
        .await
        .map_err(SyncError::Check)?;
    let local = mirror.local_version().map_err(SyncError::Check)?;

    let needed = match &local {
        Some(local) => local.build != remote.build,
        None => true,
    };
    debug!(
        "update check: remote build {} local build {:?} needed={}",
        remote.build,
        local.as_ref().map(|v| v.build.as_str()),
        needed
    );
    Ok(UpdateCheck { remote, needed })
}
