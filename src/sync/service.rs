use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::warn;

use crate::config::EngineConfig;
use crate::core::events::{self, EventBus};
use crate::core::settings::SettingsManager;
use crate::server::StaticServer;

use super::checker::check_for_update;
use super::engine::apply_update;
use super::fetcher::RemoteSite;
use super::mirror::MirrorStore;

/// Overall flow state: `idle → checking → downloading → serving`, with
/// `error` terminal until the next queued pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncPhase {
    Idle,
    Checking,
    Downloading,
    Serving,
    Error,
}

#[derive(Debug, Clone)]
pub struct SyncJob;

/// Queues synchronization passes onto a single worker task, so
/// overlapping requests serialize instead of racing on the server
/// stop/start ordering.
#[derive(Clone)]
pub struct SyncService {
    sender: UnboundedSender<SyncJob>,
}

impl SyncService {
    pub fn spawn(
        config: EngineConfig,
        bus: EventBus,
        server: Arc<Mutex<Option<StaticServer>>>,
        phase: Arc<Mutex<SyncPhase>>,
        settings: Arc<SettingsManager>,
    ) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(SyncJob) = receiver.recv().await {
                if let Err(error) = run_pass(&config, &bus, &server, &phase, &settings).await {
                    set_phase(&phase, &bus, SyncPhase::Error);
                    events::emit_sync_error(&bus, &error.to_string());
                    warn!("synchronization pass failed: {error:?}");
                }
            }
        });
        Self { sender }
    }

    pub fn queue(&self) -> Result<()> {
        self.sender
            .send(SyncJob)
            .context("send sync job to worker")
    }
}

async fn run_pass(
    config: &EngineConfig,
    bus: &EventBus,
    server: &Arc<Mutex<Option<StaticServer>>>,
    phase: &Arc<Mutex<SyncPhase>>,
    settings: &Arc<SettingsManager>,
) -> Result<()> {
    set_phase(phase, bus, SyncPhase::Checking);

    let site = RemoteSite::new(config.remote_base_url.clone());
    let mut mirror = MirrorStore::open(&config.mirror_dir)?;

    let check = check_for_update(&site, &mirror).await?;
    if check.needed {
        set_phase(phase, bus, SyncPhase::Downloading);
        let report = apply_update(&site, &mut mirror, |name, downloaded| {
            events::emit_sync_progress(bus, name, downloaded);
        })
        .await?;
        mirror.commit_build(&check.remote)?;
        events::emit_sync_report(bus, &report);
        settings.set_last_synced(OffsetDateTime::now_utc())?;
    }

    let url = restart_server(config, server).await?;
    events::emit_server_started(bus, &url);
    set_phase(phase, bus, SyncPhase::Serving);
    Ok(())
}

/// Stop any running server instance, then serve the mirror directory.
/// There is a brief unavailability window between the two; callers go
/// through the owned slot, never a shared global.
async fn restart_server(
    config: &EngineConfig,
    server: &Arc<Mutex<Option<StaticServer>>>,
) -> Result<String> {
    let previous = server.lock().take();
    if let Some(previous) = previous {
        previous.shutdown();
    }

    // The previous listener releases the fixed port asynchronously.
    let mut attempts = 0;
    let started = loop {
        match StaticServer::start(config.mirror_dir.clone(), config.server_port).await {
            Ok(started) => break started,
            Err(error) if attempts < 5 => {
                attempts += 1;
                warn!("local server bind failed (attempt {attempts}): {error}");
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
            Err(error) => return Err(error),
        }
    };
    let url = started.url();
    *server.lock() = Some(started);
    Ok(url)
}

fn set_phase(phase: &Arc<Mutex<SyncPhase>>, bus: &EventBus, next: SyncPhase) {
    *phase.lock() = next;
    events::emit_sync_phase(bus, next);
}
