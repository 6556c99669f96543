//! Request orchestration
//!
//! The gateway owns the shared collaborators (backend, classifier, sink)
//! and builds a fresh governor for every request. It validates input
//! before anything is generated, so rejected requests are never governed
//! and never audited.

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::ChatRequest;
use crate::backend::{FragmentStream, GenerationBackend};
use crate::config::{ConfigError, GovernorConfig};
use crate::error::GovernError;
use crate::governance::{
    BatchGovernor, BatchOutcome, Classifier, OutputAction, PiiClassifier, RequestContext,
    StreamGovernor, StreamSummary,
};
use crate::telemetry::EventSink;

/// Result of a non-streaming request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResponse {
    pub request_id: String,
    pub outcome: BatchOutcome,
}

/// Result of a request dispatched by [`Gateway::handle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse {
    Batch(BatchResponse),
    Stream(StreamSummary),
}

/// Governance front for one generation backend
pub struct Gateway {
    backend: Arc<dyn GenerationBackend>,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn EventSink>,
    config: GovernorConfig,
}

impl Gateway {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn EventSink>,
        config: GovernorConfig,
    ) -> Self {
        Self {
            backend,
            classifier,
            sink,
            config,
        }
    }

    /// Build a gateway with the PII rule set named by the configuration
    pub fn from_config(
        backend: Arc<dyn GenerationBackend>,
        sink: Arc<dyn EventSink>,
        config: GovernorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let classifier = Arc::new(PiiClassifier::from_config(&config)?);
        Ok(Self::new(backend, classifier, sink, config))
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Dispatch a chat request on its `stream` flag.
    ///
    /// Events carry the model the request asked for, or the backend's own
    /// model when the request names none. `output` only receives actions
    /// for streaming requests.
    pub async fn handle(
        &self,
        request: &ChatRequest,
        request_id: Option<&str>,
        cancel: CancellationToken,
        output: mpsc::Sender<OutputAction>,
    ) -> Result<GatewayResponse, GovernError> {
        let prompt = request.prompt()?;
        let model = request
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.backend.model());
        let context = RequestContext::with_optional_id(request_id, model);

        if request.stream {
            self.stream_with(context, prompt, cancel, output)
                .await
                .map(GatewayResponse::Stream)
        } else {
            self.complete_with(context, prompt)
                .await
                .map(GatewayResponse::Batch)
        }
    }

    /// Generate a complete response and govern it
    pub async fn complete(
        &self,
        request_id: Option<&str>,
        prompt: &str,
    ) -> Result<BatchResponse, GovernError> {
        let context = RequestContext::with_optional_id(request_id, self.backend.model());
        self.complete_with(context, prompt).await
    }

    /// Stream a response through a fresh governor
    pub async fn stream(
        &self,
        request_id: Option<&str>,
        prompt: &str,
        cancel: CancellationToken,
        output: mpsc::Sender<OutputAction>,
    ) -> Result<StreamSummary, GovernError> {
        let context = RequestContext::with_optional_id(request_id, self.backend.model());
        self.stream_with(context, prompt, cancel, output).await
    }

    async fn complete_with(
        &self,
        context: RequestContext,
        prompt: &str,
    ) -> Result<BatchResponse, GovernError> {
        validate_prompt(prompt)?;

        let text = self.backend.generate(prompt).await.map_err(|e| {
            warn!("[request_id={}] Generation failed: {}", context.request_id(), e);
            GovernError::Backend(e)
        })?;

        let outcome = BatchGovernor::new(
            Arc::clone(&self.classifier),
            Arc::clone(&self.sink),
            &self.config,
        )
        .govern(&context, &text);

        Ok(BatchResponse {
            request_id: context.request_id().to_string(),
            outcome,
        })
    }

    async fn stream_with(
        &self,
        context: RequestContext,
        prompt: &str,
        cancel: CancellationToken,
        output: mpsc::Sender<OutputAction>,
    ) -> Result<StreamSummary, GovernError> {
        validate_prompt(prompt)?;

        let fragments: FragmentStream = match self.backend.stream(prompt).await {
            Ok(fragments) => fragments,
            Err(e) if e.is_end_of_sequence() => {
                debug!("[request_id={}] Backend produced no fragments", context.request_id());
                futures::stream::empty().boxed()
            }
            Err(e) => {
                warn!("[request_id={}] Stream start failed: {}", context.request_id(), e);
                return Err(GovernError::Backend(e));
            }
        };

        StreamGovernor::new(
            context,
            Arc::clone(&self.classifier),
            Arc::clone(&self.sink),
            &self.config,
        )
        .run(fragments, cancel, output)
        .await
    }
}

fn validate_prompt(prompt: &str) -> Result<(), GovernError> {
    if prompt.trim().is_empty() {
        return Err(GovernError::InvalidInput("empty prompt".to_string()));
    }
    Ok(())
}
