mod envelope;
mod view;

pub use envelope::{BridgeAction, BridgeEnvelope, PAGE_MESSAGE_HANDLER};
pub use view::{PageHost, ViewBridge};
