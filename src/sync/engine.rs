use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{FILE_LIST_FILE, MODEL_MANIFEST_FILE, VERSION_FILE};

use super::checker::check_for_update;
use super::fetcher::RemoteSite;
use super::manifest::{FileList, ModelManifest};
use super::mirror::MirrorStore;
use super::SyncError;

/// Per-pass result aggregation.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub files_checked: usize,
    pub files_downloaded: usize,
    pub files_skipped: usize,
}

#[derive(Debug)]
pub enum SyncOutcome {
    /// Builds matched; nothing was downloaded.
    Current,
    Updated(SyncReport),
}

/// Run one full synchronization pass: check the version descriptor and,
/// when stale, mirror the manifests and every file they name.
pub async fn synchronize(
    site: &RemoteSite,
    mirror: &mut MirrorStore,
) -> Result<SyncOutcome, SyncError> {
    synchronize_with_progress(site, mirror, |_, _| {}).await
}

/// As [`synchronize`], invoking `progress(name, downloaded)` after each
/// file is checked.
pub async fn synchronize_with_progress<F>(
    site: &RemoteSite,
    mirror: &mut MirrorStore,
    progress: F,
) -> Result<SyncOutcome, SyncError>
where
    F: FnMut(&str, bool),
{
    let check = check_for_update(site, mirror).await?;
    if !check.needed {
        debug!("mirror is current at build {}", check.remote.build);
        return Ok(SyncOutcome::Current);
    }

    let report = apply_update(site, mirror, progress).await?;
    mirror
        .commit_build(&check.remote)
        .map_err(SyncError::Update)?;
    info!(
        "synchronized build {}: {} downloaded, {} skipped",
        check.remote.build, report.files_downloaded, report.files_skipped
    );
    Ok(SyncOutcome::Updated(report))
}

/// Mirror the manifests and the files they enumerate. Strictly
/// sequential; a failure leaves earlier downloads in place with the old
/// version descriptor, and the caller must not commit the new build.
pub async fn apply_update<F>(
    site: &RemoteSite,
    mirror: &mut MirrorStore,
    mut progress: F,
) -> Result<SyncReport, SyncError>
where
    F: FnMut(&str, bool),
{
    let mut report = SyncReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(VERSION_FILE.to_string());

    for name in [MODEL_MANIFEST_FILE, FILE_LIST_FILE] {
        seen.insert(name.to_string());
        sync_file(site, mirror, name, &mut report, &mut progress).await?;
    }

    // The manifests just mirrored enumerate the rest of the set.
    let manifest: ModelManifest = mirror
        .read_json(MODEL_MANIFEST_FILE)
        .map_err(SyncError::Update)?;
    let file_list: FileList = mirror.read_json(FILE_LIST_FILE).map_err(SyncError::Update)?;

    for name in manifest.weight_paths().iter().chain(file_list.iter()) {
        if !seen.insert(name.clone()) {
            continue;
        }
        sync_file(site, mirror, name, &mut report, &mut progress).await?;
    }

    Ok(report)
}

/// Mirror a single file: probe its remote `Last-Modified` and skip the
/// body fetch when it matches the recorded value, otherwise download and
/// overwrite.
async fn sync_file<F>(
    site: &RemoteSite,
    mirror: &mut MirrorStore,
    name: &str,
    report: &mut SyncReport,
    progress: &mut F,
) -> Result<(), SyncError>
where
    F: FnMut(&str, bool),
{
    report.files_checked += 1;
    let remote_modified = site.last_modified(name).await.map_err(SyncError::Update)?;

    let unchanged = matches!(
        (&remote_modified, mirror.recorded_last_modified(name)),
        (Some(remote), Some(local)) if remote == local
    ) && mirror.contains(name);

    if unchanged {
        debug!("skipping {} (last-modified unchanged)", name);
        report.files_skipped += 1;
        progress(name, false);
        return Ok(());
    }

    let bytes = site.download(name).await.map_err(SyncError::Update)?;
    mirror.write_file(name, &bytes).map_err(SyncError::Update)?;
    mirror.record_file(name, remote_modified);
    report.files_downloaded += 1;
    progress(name, true);
    Ok(())
}
