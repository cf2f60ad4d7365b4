use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Global handler the hosted page registers for messages from the host.
pub const PAGE_MESSAGE_HANDLER: &str = "window.NeuvoBridge.handleMessage";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BridgeAction {
    Ask,
    Slots,
    Version,
    Online,
    Offline,
}

/// Outbound message envelope. `content` is omitted entirely for
/// parameterless commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeEnvelope {
    pub action: BridgeAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl BridgeEnvelope {
    pub fn new(action: BridgeAction, content: Option<Value>) -> Self {
        Self { action, content }
    }

    pub fn ask(content: Value) -> Self {
        Self::new(BridgeAction::Ask, Some(content))
    }

    pub fn slots(content: Value) -> Self {
        Self::new(BridgeAction::Slots, Some(content))
    }

    pub fn version() -> Self {
        Self::new(BridgeAction::Version, None)
    }

    pub fn online() -> Self {
        Self::new(BridgeAction::Online, None)
    }

    pub fn offline() -> Self {
        Self::new(BridgeAction::Offline, None)
    }

    /// Render the script-injection call understood by the hosted page:
    /// one call to the global handler with the JSON-encoded envelope as
    /// its single string argument.
    pub fn to_script(&self) -> Result<String> {
        let encoded = serde_json::to_string(self).context("encode bridge envelope")?;
        let literal = serde_json::to_string(&encoded).context("quote bridge envelope")?;
        Ok(format!("{PAGE_MESSAGE_HANDLER}({literal});"))
    }
}
