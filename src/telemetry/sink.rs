//! Event sinks
//!
//! CRITICAL: `emit` is fire-and-forget. It must return quickly and must
//! never fail the caller; any delivery problem is logged where it happens.

use log::{info, warn};

use super::event::GovernanceEvent;
use crate::governance::verdict::Decision;

/// Destination for governance events.
///
/// One sink is shared by every in-flight exchange.
pub trait EventSink: Send + Sync {
    /// Hand an event to the sink. Never blocks on delivery.
    fn emit(&self, event: GovernanceEvent);

    /// Sink name for logs
    fn name(&self) -> &str;
}

/// Best-effort structured logger.
///
/// Always succeeds locally, so governance is never silently unaudited.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: GovernanceEvent) {
        match event.to_json() {
            Ok(json) => match event.decision {
                Decision::Abort => warn!("[GOVERNANCE-EVENT] {}", json),
                Decision::Redact | Decision::Allow => info!("[GOVERNANCE-EVENT] {}", json),
            },
            Err(e) => {
                warn!(
                    "Failed to serialize governance event for request {}: {}",
                    event.request_id, e
                );
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
