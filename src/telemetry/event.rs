//! Governance audit event

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::governance::verdict::Decision;

/// Policy name recorded when no policy fired
pub const POLICY_NONE: &str = "none";

/// Immutable audit record of one governance decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernanceEvent {
    /// When the decision was taken (UTC, RFC 3339 on the wire)
    pub timestamp: DateTime<Utc>,
    /// Request ID
    pub request_id: String,
    /// Model that produced the inspected text
    pub model: String,
    /// Policy that fired, or `none`
    pub policy: String,
    /// Decision taken
    pub decision: Decision,
    /// Reason code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Whether the exchange was streaming
    pub streaming: bool,
    /// Milliseconds since the request started
    pub latency_ms: u64,
}

impl GovernanceEvent {
    /// Create an `allow` event stamped now
    pub fn new(request_id: &str, model: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: request_id.to_string(),
            model: model.to_string(),
            policy: POLICY_NONE.to_string(),
            decision: Decision::Allow,
            reason: None,
            streaming: false,
            latency_ms: 0,
        }
    }

    /// Set the policy that fired and its decision
    pub fn with_decision(mut self, policy: &str, decision: Decision) -> Self {
        self.policy = policy.to_string();
        self.decision = decision;
        self
    }

    /// Set reason
    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Mark as streaming
    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Set observed latency
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
