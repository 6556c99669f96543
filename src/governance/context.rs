//! Per-request identity used to stamp governance events

use std::time::Instant;

use super::verdict::{Decision, Verdict};
use crate::telemetry::{GovernanceEvent, POLICY_NONE};

/// Identity and start time of one top-level request
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    model: String,
    started: Instant,
}

impl RequestContext {
    /// Start the latency clock for a request
    pub fn new(request_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            model: model.into(),
            started: Instant::now(),
        }
    }

    /// Use the caller's request ID, or generate one
    pub fn with_optional_id(request_id: Option<&str>, model: &str) -> Self {
        let id = match request_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        Self::new(id, model)
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Build the event recording `verdict` (no verdict means allow)
    pub fn event(&self, policy: &str, verdict: Option<&Verdict>, streaming: bool) -> GovernanceEvent {
        let event = GovernanceEvent::new(&self.request_id, &self.model)
            .streaming(streaming)
            .with_latency_ms(self.elapsed_ms());

        match verdict {
            Some(v) => event
                .with_decision(policy, v.decision)
                .with_reason(&v.reason),
            None => event.with_decision(POLICY_NONE, Decision::Allow),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_request_id() {
        let ctx = RequestContext::with_optional_id(None, "model");
        assert!(uuid::Uuid::parse_str(ctx.request_id()).is_ok());

        let blank = RequestContext::with_optional_id(Some("  "), "model");
        assert_ne!(blank.request_id().trim(), "");

        let given = RequestContext::with_optional_id(Some("req-7"), "model");
        assert_eq!(given.request_id(), "req-7");
    }

    #[test]
    fn test_event_from_verdict() {
        let ctx = RequestContext::new("req-1", "model-a");

        let allow = ctx.event("pii", None, true);
        assert_eq!(allow.policy, "none");
        assert_eq!(allow.decision, Decision::Allow);
        assert!(allow.streaming);

        let abort = ctx.event("pii", Some(&Verdict::abort("email_detected")), false);
        assert_eq!(abort.policy, "pii");
        assert_eq!(abort.decision, Decision::Abort);
        assert_eq!(abort.reason.as_deref(), Some("email_detected"));
        assert_eq!(abort.model, "model-a");
    }
}
