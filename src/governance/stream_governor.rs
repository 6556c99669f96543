//! Streaming Output Governor
//!
//! CRITICAL: One governor serves exactly one streaming exchange.
//! It consumes fragments as they arrive and decides, per fragment, whether
//! to forward, suppress or terminate:
//! - Every fragment is appended to a bounded rolling window
//! - The classifier runs on the window only after `eval_threshold`
//!   characters have accumulated since the last evaluation
//! - A final evaluation always runs when the upstream completes
//!
//! Redaction is not retroactive. Fragments forwarded before an evaluation
//! ran stay delivered; only the increment that triggered the evaluation is
//! withheld. A match is redacted once: while it lingers in the window,
//! later evaluations that only find already-redacted matches forward their
//! increment normally.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::classifier::Classifier;
use super::context::RequestContext;
use super::verdict::{decision_of, Decision, Verdict};
use crate::backend::BackendError;
use crate::config::GovernorConfig;
use crate::error::GovernError;
use crate::streaming::RollingWindow;
use crate::telemetry::EventSink;

/// Lifecycle of one streaming exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorState {
    /// Forwarding fragments
    Streaming,
    /// Handling one redacted increment; returns to `Streaming`
    SuppressingButContinuing,
    /// Terminated by an `abort` verdict
    Aborted,
    /// Upstream finished and the final evaluation ran
    Completed,
}

impl GovernorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GovernorState::Aborted | GovernorState::Completed)
    }
}

/// What the transport should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputAction {
    /// Deliver this text unchanged
    Forward(String),
    /// An increment was withheld; the exchange continues
    Redacted { reason: String },
    /// The exchange is blocked; nothing more follows
    Aborted { reason: String },
    /// The exchange finished normally; nothing more follows
    Completed,
}

impl OutputAction {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputAction::Aborted { .. } | OutputAction::Completed)
    }
}

/// Outcome of a finished streaming exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub request_id: String,
    /// Decision recorded on the terminal event
    pub decision: Decision,
    pub reason: Option<String>,
    /// Classifier invocations, including the final one
    pub evaluations: usize,
    /// Fragments forwarded downstream
    pub forwarded: usize,
    /// Increments withheld
    pub redacted: usize,
}

/// State machine driving one streaming exchange
pub struct StreamGovernor {
    context: RequestContext,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn EventSink>,
    window: RollingWindow,
    eval_threshold: usize,
    audit_each_redaction: bool,
    log_matches: bool,
    chars_since_eval: usize,
    /// History position (in characters) up to which text was redacted
    redacted_through: usize,
    state: GovernorState,
    evaluations: usize,
    forwarded: usize,
    redacted: usize,
    terminal_verdict: Option<Verdict>,
}

impl StreamGovernor {
    pub fn new(
        context: RequestContext,
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn EventSink>,
        config: &GovernorConfig,
    ) -> Self {
        Self {
            context,
            classifier,
            sink,
            window: RollingWindow::new(config.window_capacity),
            eval_threshold: config.eval_threshold,
            audit_each_redaction: config.audit_each_redaction,
            log_matches: config.log_matches,
            chars_since_eval: 0,
            redacted_through: 0,
            state: GovernorState::Streaming,
            evaluations: 0,
            forwarded: 0,
            redacted: 0,
            terminal_verdict: None,
        }
    }

    pub fn state(&self) -> GovernorState {
        self.state
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn window(&self) -> &RollingWindow {
        &self.window
    }

    /// Process one fragment.
    ///
    /// Returns `None` once the exchange reached a terminal state; nothing
    /// is forwarded after that.
    pub fn on_fragment(&mut self, fragment: &str) -> Option<OutputAction> {
        if self.state.is_terminal() {
            return None;
        }

        self.chars_since_eval += self.window.add(fragment);

        if self.chars_since_eval < self.eval_threshold {
            return Some(self.forward(fragment));
        }

        self.chars_since_eval = 0;
        let action = match self.evaluate() {
            Some(verdict) => match verdict.decision {
                Decision::Abort => self.abort(verdict),
                Decision::Redact if self.already_redacted(verdict.decision) => {
                    debug!(
                        "[request_id={}] {} match already redacted, forwarding",
                        self.context.request_id(),
                        verdict.reason
                    );
                    self.forward(fragment)
                }
                Decision::Redact => self.redact(verdict),
                Decision::Allow => self.forward(fragment),
            },
            None => self.forward(fragment),
        };
        Some(action)
    }

    /// Upstream completed: run the mandatory final evaluation and emit the
    /// terminal event.
    pub fn finish(&mut self) -> Option<OutputAction> {
        if self.state.is_terminal() {
            return None;
        }

        self.chars_since_eval = 0;
        let verdict = self.evaluate().filter(|v| v.decision != Decision::Allow);
        let action = match verdict {
            Some(v) if v.is_abort() => self.abort(v),
            verdict => self.complete(verdict),
        };
        Some(action)
    }

    /// Counters and terminal decision so far
    pub fn summary(&self) -> StreamSummary {
        StreamSummary {
            request_id: self.context.request_id().to_string(),
            decision: decision_of(self.terminal_verdict.as_ref()),
            reason: self.terminal_verdict.as_ref().map(|v| v.reason.clone()),
            evaluations: self.evaluations,
            forwarded: self.forwarded,
            redacted: self.redacted,
        }
    }

    /// Drive the exchange to its end.
    ///
    /// Output actions are sent in order on `output`. Returns the summary
    /// once a terminal action was produced, even when cancellation wins the
    /// race against delivering it. Cancellation, or the output receiver
    /// going away mid-stream, abandons the exchange without a summary event. A backend failure other than end-of-sequence is
    /// returned as is, also without an event.
    pub async fn run<S>(
        mut self,
        mut fragments: S,
        cancel: CancellationToken,
        output: mpsc::Sender<OutputAction>,
    ) -> Result<StreamSummary, GovernError>
    where
        S: Stream<Item = Result<String, BackendError>> + Unpin,
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("[request_id={}] Stream cancelled by caller", self.context.request_id());
                    return Err(GovernError::Cancelled);
                }
                next = fragments.next() => next,
            };

            let action = match next {
                Some(Ok(fragment)) => self.on_fragment(&fragment),
                Some(Err(e)) if e.is_end_of_sequence() => self.finish(),
                Some(Err(e)) => {
                    warn!("[request_id={}] Stream error: {}", self.context.request_id(), e);
                    return Err(GovernError::Backend(e));
                }
                None => self.finish(),
            };

            let Some(action) = action else {
                return Ok(self.summary());
            };
            let terminal = action.is_terminal();

            let delivered = tokio::select! {
                biased;
                _ = cancel.cancelled() => false,
                sent = output.send(action) => sent.is_ok(),
            };

            if terminal {
                // Terminal event is already dispatched; an undelivered
                // marker does not undo the decision.
                return Ok(self.summary());
            }
            if !delivered {
                debug!(
                    "[request_id={}] Output closed, abandoning stream",
                    self.context.request_id()
                );
                return Err(GovernError::Cancelled);
            }
        }
    }

    fn evaluate(&mut self) -> Option<Verdict> {
        self.evaluations += 1;
        let verdict = self.classifier.evaluate(self.window.contents());

        if let Some(v) = &verdict {
            if self.log_matches {
                info!(
                    "[request_id={}] {} verdict: {}",
                    self.context.request_id(),
                    v.decision,
                    v.reason
                );
            } else {
                debug!(
                    "[request_id={}] {} verdict: {}",
                    self.context.request_id(),
                    v.decision,
                    v.reason
                );
            }
        }
        verdict
    }

    /// Whether every `decision` match in the window ends inside text that
    /// was already redacted
    fn already_redacted(&self, decision: Decision) -> bool {
        let contents = self.window.contents();
        let Some(end) = self.classifier.last_match_end(contents, decision) else {
            return false;
        };

        let window_start = self.window.total_appended() - self.window.len();
        let end_chars = contents
            .get(..end)
            .map_or(self.window.len(), |prefix| prefix.chars().count());
        window_start + end_chars <= self.redacted_through
    }

    fn complete(&mut self, verdict: Option<Verdict>) -> OutputAction {
        self.sink.emit(
            self.context
                .event(self.classifier.policy(), verdict.as_ref(), true),
        );
        debug!(
            "[request_id={}] Stream completed ({})",
            self.context.request_id(),
            decision_of(verdict.as_ref())
        );

        self.terminal_verdict = verdict;
        self.state = GovernorState::Completed;
        OutputAction::Completed
    }

    fn forward(&mut self, fragment: &str) -> OutputAction {
        self.forwarded += 1;
        OutputAction::Forward(fragment.to_string())
    }

    fn redact(&mut self, verdict: Verdict) -> OutputAction {
        self.state = GovernorState::SuppressingButContinuing;
        self.redacted += 1;
        self.redacted_through = self.window.total_appended();

        if self.audit_each_redaction {
            self.sink.emit(
                self.context
                    .event(self.classifier.policy(), Some(&verdict), true),
            );
        }

        self.state = GovernorState::Streaming;
        OutputAction::Redacted {
            reason: verdict.reason,
        }
    }

    fn abort(&mut self, verdict: Verdict) -> OutputAction {
        self.sink.emit(
            self.context
                .event(self.classifier.policy(), Some(&verdict), true),
        );
        warn!(
            "[request_id={}] BLOCKED: stream aborted ({})",
            self.context.request_id(),
            verdict.reason
        );

        let reason = verdict.reason.clone();
        self.terminal_verdict = Some(verdict);
        self.state = GovernorState::Aborted;
        OutputAction::Aborted { reason }
    }
}
