use serde::Serialize;
use tokio::sync::broadcast;

use crate::sync::{SyncPhase, SyncReport};

pub const EVENT_SYNC_PHASE: &str = "sync-phase";
pub const EVENT_SYNC_PROGRESS: &str = "sync-progress";
pub const EVENT_SYNC_REPORT: &str = "sync-report";
pub const EVENT_SYNC_ERROR: &str = "sync-error";
pub const EVENT_SERVER_STARTED: &str = "server-started";
pub const EVENT_BRIDGE_READY: &str = "bridge-ready";
pub const EVENT_BRIDGE_MESSAGE: &str = "bridge-message";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum EngineEvent {
    SyncPhase { phase: SyncPhase },
    SyncProgress { name: String, downloaded: bool },
    SyncReport { report: SyncReport },
    SyncError { message: String },
    ServerStarted { url: String },
    BridgeReady,
    BridgeMessage { payload: String },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::SyncPhase { .. } => EVENT_SYNC_PHASE,
            EngineEvent::SyncProgress { .. } => EVENT_SYNC_PROGRESS,
            EngineEvent::SyncReport { .. } => EVENT_SYNC_REPORT,
            EngineEvent::SyncError { .. } => EVENT_SYNC_ERROR,
            EngineEvent::ServerStarted { .. } => EVENT_SERVER_STARTED,
            EngineEvent::BridgeReady => EVENT_BRIDGE_READY,
            EngineEvent::BridgeMessage { .. } => EVENT_BRIDGE_MESSAGE,
        }
    }
}

/// Broadcast channel the host UI subscribes to. Emitting never fails
/// the caller; events sent with no subscriber are dropped.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: EngineEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

pub fn emit_sync_phase(bus: &EventBus, phase: SyncPhase) {
    bus.emit(EngineEvent::SyncPhase { phase });
}

pub fn emit_sync_progress(bus: &EventBus, name: &str, downloaded: bool) {
    bus.emit(EngineEvent::SyncProgress {
        name: name.to_string(),
        downloaded,
    });
}

pub fn emit_sync_report(bus: &EventBus, report: &SyncReport) {
    bus.emit(EngineEvent::SyncReport {
        report: report.clone(),
    });
}

pub fn emit_sync_error(bus: &EventBus, message: &str) {
    bus.emit(EngineEvent::SyncError {
        message: message.to_string(),
    });
}

pub fn emit_server_started(bus: &EventBus, url: &str) {
    bus.emit(EngineEvent::ServerStarted {
        url: url.to_string(),
    });
}

pub fn emit_bridge_ready(bus: &EventBus) {
    bus.emit(EngineEvent::BridgeReady);
}

pub fn emit_bridge_message(bus: &EventBus, payload: &str) {
    bus.emit(EngineEvent::BridgeMessage {
        payload: payload.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_payloads_use_camel_case() {
        let event = EngineEvent::SyncProgress {
            name: "model.json".into(),
            downloaded: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "syncProgress");
        assert_eq!(json["payload"]["name"], "model.json");
        assert_eq!(json["payload"]["downloaded"], true);
        assert_eq!(event.name(), EVENT_SYNC_PROGRESS);
    }
}
