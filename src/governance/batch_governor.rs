//! Batch Output Governor
//!
//! Governs a complete, non-streaming response with exactly one
//! evaluation and exactly one event.

use std::sync::Arc;

use log::{info, warn};

use super::classifier::Classifier;
use super::context::RequestContext;
use super::verdict::{decision_of, Decision, Verdict};
use crate::config::{GovernorConfig, RedactMode};
use crate::telemetry::EventSink;

/// What the caller may release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutput {
    /// Release this text (unmodified, or masked in `mask` mode)
    Released(String),
    /// Reject the whole response; nothing is released
    Rejected { reason: String },
}

/// Verdict and releasable output of one governed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub verdict: Option<Verdict>,
    pub output: BatchOutput,
}

impl BatchOutcome {
    pub fn decision(&self) -> Decision {
        decision_of(self.verdict.as_ref())
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.output, BatchOutput::Rejected { .. })
    }
}

/// Single-evaluation governor for complete responses
pub struct BatchGovernor {
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn EventSink>,
    redact_mode: RedactMode,
}

impl BatchGovernor {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn EventSink>,
        config: &GovernorConfig,
    ) -> Self {
        Self {
            classifier,
            sink,
            redact_mode: config.redact_mode,
        }
    }

    /// Evaluate `full_text` once, emit one event, decide what to release
    pub fn govern(&self, context: &RequestContext, full_text: &str) -> BatchOutcome {
        let verdict = self
            .classifier
            .evaluate(full_text)
            .filter(|v| v.decision != Decision::Allow);

        self.sink
            .emit(context.event(self.classifier.policy(), verdict.as_ref(), false));

        let output = match &verdict {
            Some(v) => match v.decision {
                Decision::Abort => {
                    warn!(
                        "[request_id={}] BLOCKED: response rejected ({})",
                        context.request_id(),
                        v.reason
                    );
                    BatchOutput::Rejected {
                        reason: v.reason.clone(),
                    }
                }
                Decision::Redact => {
                    info!(
                        "[request_id={}] Redact verdict ({}), mode {:?}",
                        context.request_id(),
                        v.reason,
                        self.redact_mode
                    );
                    match self.redact_mode {
                        RedactMode::Permissive => BatchOutput::Released(full_text.to_string()),
                        RedactMode::Mask => BatchOutput::Released(self.classifier.mask(full_text)),
                    }
                }
                Decision::Allow => BatchOutput::Released(full_text.to_string()),
            },
            None => BatchOutput::Released(full_text.to_string()),
        };

        BatchOutcome { verdict, output }
    }
}
