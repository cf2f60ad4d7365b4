//! Engine behind the Neuvo assistant view: mirrors web assets from the
//! remote content endpoint, serves the mirror from a local HTTP origin,
//! and speaks the JSON message bridge the hosted page expects. The
//! embedded web-view control itself stays on the host side, reached
//! through the [`bridge::PageHost`] seam.

pub mod bridge;
pub mod config;
pub mod core;
pub mod logging;
pub mod server;
pub mod sync;

pub use crate::bridge::{BridgeAction, BridgeEnvelope, PageHost, ViewBridge};
pub use crate::config::EngineConfig;
pub use crate::core::app_state::AppState;
pub use crate::core::events::{EngineEvent, EventBus};
pub use crate::core::settings::{EngineSettings, SettingsManager};
pub use crate::logging::init_logging;
pub use crate::server::StaticServer;
pub use crate::sync::{
    check_for_update, synchronize, synchronize_with_progress, MirrorStore, RemoteSite, SyncError,
    SyncOutcome, SyncPhase, SyncReport, VersionDescriptor,
};
