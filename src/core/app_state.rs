use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::core::events::{EngineEvent, EventBus};
use crate::core::settings::SettingsManager;
use crate::server::StaticServer;
use crate::sync::{SyncPhase, SyncService};

/// Root engine state the host application owns for the lifetime of the
/// view component. The local server lives in an owned slot here; there
/// is no process-wide server instance.
pub struct AppState {
    settings: Arc<SettingsManager>,
    bus: EventBus,
    server: Arc<Mutex<Option<StaticServer>>>,
    phase: Arc<Mutex<SyncPhase>>,
    sync: Mutex<Option<SyncService>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(Arc::new(SettingsManager::new()))
    }

    pub fn with_settings(settings: Arc<SettingsManager>) -> Self {
        Self {
            settings,
            bus: EventBus::default(),
            server: Arc::new(Mutex::new(None)),
            phase: Arc::new(Mutex::new(SyncPhase::Idle)),
            sync: Mutex::new(None),
        }
    }

    pub fn settings_manager(&self) -> Arc<SettingsManager> {
        self.settings.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock()
    }

    /// URL of the running local server, once serving.
    pub fn serve_url(&self) -> Option<String> {
        self.server.lock().as_ref().map(StaticServer::url)
    }

    /// Queue a synchronization pass. Must be called from within the
    /// host's tokio runtime; passes serialize on a single worker.
    pub fn start_sync(&self) -> Result<()> {
        let service = self.ensure_sync_service();
        service.queue()
    }

    /// Host entry point for view attachment. Queues a synchronization
    /// pass only when automatic sync is enabled in settings.
    pub fn startup(&self) -> Result<()> {
        if self.settings.read().auto_sync {
            self.start_sync()?;
        }
        Ok(())
    }

    /// Component teardown: stop the local server if one is running.
    pub fn shutdown(&self) {
        if let Some(server) = self.server.lock().take() {
            server.shutdown();
        }
        *self.phase.lock() = SyncPhase::Idle;
    }

    fn ensure_sync_service(&self) -> SyncService {
        let mut guard = self.sync.lock();
        if let Some(service) = guard.as_ref() {
            return service.clone();
        }
        let service = SyncService::spawn(
            self.settings.effective_config(),
            self.bus.clone(),
            self.server.clone(),
            self.phase.clone(),
            self.settings.clone(),
        );
        *guard = Some(service.clone());
        service
    }
}
