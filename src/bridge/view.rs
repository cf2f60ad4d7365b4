use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::core::events::{self, EventBus};

use super::envelope::BridgeEnvelope;

/// Seam to the embedded web-view control. Injection is fire-and-forget;
/// there is no acknowledgement channel beyond the generic inbound
/// message callback.
pub trait PageHost: Send + Sync {
    fn inject_script(&self, script: &str);
}

/// Typed command surface over the hosted page, plus the inbound side of
/// the message channel.
pub struct ViewBridge {
    host: Arc<dyn PageHost>,
    allowed_origins: Mutex<Vec<String>>,
    // One-shot latch: `ready` must not re-fire on reload events.
    ready_fired: AtomicBool,
    last_payload: Mutex<Option<String>>,
    bus: EventBus,
}

impl ViewBridge {
    pub fn new(host: Arc<dyn PageHost>, allowed_origins: Vec<String>, bus: EventBus) -> Self {
        Self {
            host,
            allowed_origins: Mutex::new(allowed_origins),
            ready_fired: AtomicBool::new(false),
            last_payload: Mutex::new(None),
            bus,
        }
    }

    pub fn ask(&self, content: Value) -> Result<()> {
        self.send(BridgeEnvelope::ask(content))
    }

    pub fn send_slots(&self, content: Value) -> Result<()> {
        self.send(BridgeEnvelope::slots(content))
    }

    pub fn send_version(&self) -> Result<()> {
        self.send(BridgeEnvelope::version())
    }

    pub fn set_online(&self) -> Result<()> {
        self.send(BridgeEnvelope::online())
    }

    pub fn set_offline(&self) -> Result<()> {
        self.send(BridgeEnvelope::offline())
    }

    fn send(&self, envelope: BridgeEnvelope) -> Result<()> {
        let script = envelope.to_script()?;
        self.host.inject_script(&script);
        Ok(())
    }

    /// Page-load callback from the host. Emits `ready` at most once,
    /// however many load events the view delivers.
    pub fn handle_page_load(&self) {
        if self.ready_fired.swap(true, Ordering::SeqCst) {
            debug!("suppressing duplicate ready signal");
            return;
        }
        events::emit_bridge_ready(&self.bus);
    }

    /// Inbound message from the hosted page. The payload is opaque at
    /// this layer; it is recorded and forwarded as-is.
    pub fn handle_message(&self, payload: impl Into<String>) {
        let payload = payload.into();
        *self.last_payload.lock() = Some(payload.clone());
        events::emit_bridge_message(&self.bus, &payload);
    }

    pub fn last_message(&self) -> Option<String> {
        self.last_payload.lock().clone()
    }

    /// Whether the view may navigate to `url`, per the origin allow-list.
    pub fn origin_allowed(&self, url: &str) -> bool {
        let Some(origin) = origin_of(url) else {
            return false;
        };
        self.allowed_origins
            .lock()
            .iter()
            .any(|pattern| pattern_matches(pattern, &origin))
    }

    /// Extend the allow-list, e.g. with the local server origin once
    /// mirrored serving starts.
    pub fn allow_origin(&self, origin: impl Into<String>) {
        let origin = origin.into();
        let mut origins = self.allowed_origins.lock();
        if !origins.contains(&origin) {
            origins.push(origin);
        }
    }
}

fn origin_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    if authority.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{authority}"))
}

/// Allow-list patterns hold at most one `*`, matching any run of
/// characters, e.g. `https://*.neuvo.ai`.
fn pattern_matches(pattern: &str, origin: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            origin.len() >= prefix.len() + suffix.len()
                && origin.starts_with(prefix)
                && origin.ends_with(suffix)
        }
        None => pattern == origin,
    }
}
